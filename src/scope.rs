//! Name to value bindings used for execution variables and set globals.

use crate::escape::SafeWriter;
use minijinja::value::{Rest, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A callable exposed to template expressions.
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync>;

/// A single scope entry. The variant decides how the evaluator treats the name.
#[derive(Clone)]
pub enum ScopeValue {
    /// A plain value.
    Value(Value),
    /// A function callable from expressions.
    Func(Func),
    /// A writer function usable as the last segment of an action pipe.
    Writer(SafeWriter),
}

impl ScopeValue {
    /// The expression-visible form of this entry; writers have none.
    pub(crate) fn to_expression_value(&self) -> Option<Value> {
        match self {
            ScopeValue::Value(value) => Some(value.clone()),
            ScopeValue::Func(func) => {
                let func = Arc::clone(func);
                Some(Value::from_function(move |args: Rest<Value>| func(&args.0)))
            }
            ScopeValue::Writer(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ScopeValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ScopeValue::Func(_) => f.write_str("Func"),
            ScopeValue::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Mapping from name to [`ScopeValue`]; the last write for a name wins.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    entries: HashMap<String, ScopeValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a plain value.
    ///
    /// # Examples
    /// ```
    /// use jetset::Scope;
    ///
    /// let mut vars = Scope::new();
    /// vars.set("title", "Home").set("count", 3);
    /// assert_eq!(vars.len(), 2);
    /// ```
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> &mut Self {
        self.entries.insert(name.to_string(), ScopeValue::Value(value.into()));
        self
    }

    /// Binds `name` to a function callable from expressions.
    pub fn set_func<F>(&mut self, name: &str, func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.entries.insert(name.to_string(), ScopeValue::Func(Arc::new(func)));
        self
    }

    /// Binds `name` to a writer function.
    pub fn set_writer(&mut self, name: &str, writer: SafeWriter) -> &mut Self {
        self.entries.insert(name.to_string(), ScopeValue::Writer(writer));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ScopeValue> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ScopeValue> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{no_escape, safe_writer};

    #[test]
    fn test_last_write_wins() {
        let mut scope = Scope::new();
        scope.set("name", "first").set("name", "second");
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.get("name").and_then(ScopeValue::as_value), Some(&Value::from("second")));
    }

    #[test]
    fn test_variants_are_chosen_by_constructor() {
        let mut scope = Scope::new();
        scope
            .set("value", 1)
            .set_func("double", |args| Ok(Value::from(args.len() * 2)))
            .set_writer("plain", safe_writer(no_escape));

        assert!(matches!(scope.get("value"), Some(ScopeValue::Value(_))));
        assert!(matches!(scope.get("double"), Some(ScopeValue::Func(_))));
        assert!(matches!(scope.get("plain"), Some(ScopeValue::Writer(_))));
        assert!(scope.get("plain").unwrap().to_expression_value().is_none());
    }

    #[test]
    fn test_func_is_callable_from_expression_value() {
        let mut scope = Scope::new();
        scope.set_func("count", |args| Ok(Value::from(args.len())));
        let value = scope.get("count").unwrap().to_expression_value().unwrap();

        let env = minijinja::Environment::new();
        let expr = env.compile_expression("count(1, 2, 3)").unwrap();
        let result = expr.eval(minijinja::context! { count => value }).unwrap();
        assert_eq!(result, Value::from(3));
    }

    #[test]
    fn test_remove() {
        let mut scope = Scope::new();
        scope.set("gone", true);
        assert!(scope.remove("gone").is_some());
        assert!(scope.is_empty());
    }
}
