//! `field=value` assignments from the command line.

use std::str::FromStr;

use serde_json::Value as JsonValue;

use marginalia_core::{EditableField, Error, Result};

/// One `--set field=value` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub field: EditableField,
    pub value: JsonValue,
}

impl FromStr for FieldAssignment {
    type Err = Error;

    /// Parses `field=value`.
    ///
    /// Values starting with `[`, `{` or `"` are read as JSON. `tags` also
    /// accepts a comma-separated list. Anything else is a plain string.
    fn from_str(s: &str) -> Result<Self> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidInput(format!("expected field=value, got {:?}", s)))?;
        let field: EditableField = name.trim().parse()?;
        let raw = raw.trim();

        let value = if raw.starts_with(['[', '{', '"']) {
            serde_json::from_str(raw)
                .map_err(|e| Error::InvalidInput(format!("{}: invalid JSON value: {}", field, e)))?
        } else if field == EditableField::Tags {
            JsonValue::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(|tag| JsonValue::String(tag.to_string()))
                    .collect(),
            )
        } else {
            JsonValue::String(raw.to_string())
        };

        Ok(Self { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string() {
        let a: FieldAssignment = "usageStatus=In Use".parse().unwrap();
        assert_eq!(a.field, EditableField::UsageStatus);
        assert_eq!(a.value, json!("In Use"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let a: FieldAssignment = "summaryFull=a=b".parse().unwrap();
        assert_eq!(a.field, EditableField::SummaryFull);
        assert_eq!(a.value, json!("a=b"));
    }

    #[test]
    fn test_tags_comma_list_and_json() {
        let a: FieldAssignment = "tags=pii, billing,".parse().unwrap();
        assert_eq!(a.value, json!(["pii", "billing"]));

        let b: FieldAssignment = r#"tags=["x"]"#.parse().unwrap();
        assert_eq!(b.value, json!(["x"]));
    }

    #[test]
    fn test_numeric_looking_value_stays_string() {
        let a: FieldAssignment = "dataType=123".parse().unwrap();
        assert_eq!(a.value, json!("123"));
    }

    #[test]
    fn test_rejects_unknown_field_and_missing_equals() {
        assert!(matches!(
            "colour=red".parse::<FieldAssignment>(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            "action".parse::<FieldAssignment>(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            "action=[oops".parse::<FieldAssignment>(),
            Err(Error::InvalidInput(_))
        ));
    }
}
