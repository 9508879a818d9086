//! Expressions compiled once at parse time and evaluated on every execution.

use minijinja::{Environment, Expression, UndefinedBehavior, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

static EXPRESSION_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// The environment every action expression is compiled against. Attribute
/// access on a missing name is an error.
fn expression_env() -> &'static Environment<'static> {
    EXPRESSION_ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    })
}

/// A compiled action expression together with its source text.
#[derive(Clone)]
pub struct Expr {
    source: String,
    compiled: Arc<Expression<'static, 'static>>,
}

impl Expr {
    pub fn compile(source: &str) -> Result<Self, minijinja::Error> {
        let compiled = expression_env().compile_expression_owned(source.to_string())?;
        Ok(Self { source: source.to_string(), compiled: Arc::new(compiled) })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, ctx: &Value) -> Result<Value, minijinja::Error> {
        self.compiled.eval(ctx)
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.source).finish()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_compiled_once_evaluated_many_times() {
        let expr = Expr::compile("n * 2").unwrap();
        for n in 1..4 {
            let ctx = Value::from(BTreeMap::from([("n".to_string(), Value::from(n))]));
            assert_eq!(expr.eval(&ctx).unwrap(), Value::from(n * 2));
        }
        assert_eq!(expr.source(), "n * 2");
    }

    #[test]
    fn test_invalid_syntax_is_rejected() {
        assert!(Expr::compile("1 +").is_err());
    }

    #[test]
    fn test_missing_names() {
        let ctx = Value::from(BTreeMap::<String, Value>::new());
        assert!(Expr::compile("missing").unwrap().eval(&ctx).unwrap().is_undefined());
        assert!(Expr::compile("missing.field").unwrap().eval(&ctx).is_err());
    }
}
