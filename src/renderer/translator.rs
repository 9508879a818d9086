use minijinja::value::{Rest, Value};
use std::sync::Arc;

/// Translation hooks exposed to templates as `msg` and `trans`.
pub trait Translator: Send + Sync {
    /// Looks up `key`, returning `default_value` when no translation exists.
    fn msg(&self, key: &str, default_value: &str) -> String;

    /// Looks up `format` and fills it with `args`, using `default_format` when
    /// no translation exists.
    fn trans(&self, format: &str, default_format: &str, args: &[Value]) -> String;
}

/// Fills each `{}` in `format` with the next argument. Surplus placeholders
/// stay as written; surplus arguments are ignored.
pub fn format_fallback(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut rest = format;
    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

pub(crate) fn msg_function(translator: Option<Arc<dyn Translator>>) -> Value {
    Value::from_function(move |key: String, default_value: Option<String>| -> String {
        let default_value = default_value.unwrap_or_default();
        match &translator {
            Some(translator) => translator.msg(&key, &default_value),
            None => default_value,
        }
    })
}

pub(crate) fn trans_function(translator: Option<Arc<dyn Translator>>) -> Value {
    Value::from_function(
        move |format: String, default_format: String, args: Rest<Value>| -> String {
            match &translator {
                Some(translator) => translator.trans(&format, &default_format, &args.0),
                None => format_fallback(&default_format, &args.0),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fallback() {
        let args = [Value::from("Ann"), Value::from(3)];
        assert_eq!(format_fallback("{} has {} items", &args), "Ann has 3 items");
        assert_eq!(format_fallback("{} and {} and {}", &args), "Ann and 3 and {}");
        assert_eq!(format_fallback("no placeholders", &args), "no placeholders");
    }

    #[test]
    fn test_functions_without_translator_use_defaults() {
        let env = minijinja::Environment::new();
        let ctx = minijinja::context! {
            msg => msg_function(None),
            trans => trans_function(None),
        };
        let msg = env.compile_expression("msg('greeting', 'Hello')").unwrap();
        assert_eq!(msg.eval(&ctx).unwrap().to_string(), "Hello");

        let trans = env.compile_expression("trans('items', '{} items', 4)").unwrap();
        assert_eq!(trans.eval(&ctx).unwrap().to_string(), "4 items");
    }
}
