use anyhow::{Result, anyhow};
use logwright_core::{FieldValue, Fields, Level};
use std::path::Path;

pub fn run(logger: &str, level: &str, raw_fields: &[String], config: Option<&Path>, message: &str) -> Result<()> {
    let level: Level = level.parse()?;
    let fields = parse_fields(raw_fields)?;

    let cfg = super::load_config(config)?;
    logwright_core::initialize(Some(&cfg));

    logwright_core::get_logger(logger).emit(level, message, fields);
    logwright_core::default_context().flush();

    if let Some(err) = logwright_core::default_context().last_error() {
        return Err(anyhow!("setup failed: {err}"));
    }
    Ok(())
}

/// `key=value` pairs; numbers and booleans are kept typed.
fn parse_fields(raw: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("field '{pair}' is not in key=value form"))?;
        fields.insert(key.trim(), typed_value(value));
    }
    Ok(fields)
}

fn typed_value(raw: &str) -> FieldValue {
    if let Ok(i) = raw.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return FieldValue::Float(f);
    }
    match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Str(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_keep_types() {
        let fields = parse_fields(&["n=3".into(), "ok=true".into(), "name=a b".into()]).unwrap();
        assert_eq!(fields.get("n"), Some(&FieldValue::Int(3)));
        assert_eq!(fields.get("ok"), Some(&FieldValue::Bool(true)));
        assert_eq!(fields.get("name"), Some(&FieldValue::from("a b")));
    }

    #[test]
    fn rejects_bare_keys() {
        assert!(parse_fields(&["oops".into()]).is_err());
    }
}
