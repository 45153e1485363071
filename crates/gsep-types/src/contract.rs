use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a contract field.
///
/// Accepts the aliases used across existing contract files
/// (`str`/`string`, `int`/`integer`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[serde(alias = "str")]
    String,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "float")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "dict")]
    Object,
    #[serde(alias = "list")]
    Array,
}

impl FieldType {
    /// Whether a payload value matches this declared type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// Type declaration for one contract field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// The TEDS event contract: which keys every event must carry, what types
/// declared fields must have, and which reported flags are axiomatic
/// violations.
///
/// Loaded once; read-only for the lifetime of the sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub mandatory_keys: BTreeSet<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub critical_flags: BTreeSet<String>,
}

impl ContractDefinition {
    /// Case-insensitive membership test against the critical flag set.
    pub fn is_critical_flag(&self, flag: &str) -> bool {
        self.critical_flags
            .iter()
            .any(|known| known.eq_ignore_ascii_case(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> ContractDefinition {
        serde_json::from_value(json!({
            "mandatory_keys": ["stage", "agent"],
            "fields": {
                "stage": {"type": "str"},
                "sequence": {"type": "int"},
                "details": {"type": "object"}
            },
            "critical_flags": ["PVLM", "MPAM", "ADTM"]
        }))
        .unwrap()
    }

    #[test]
    fn field_type_aliases_parse() {
        let c = contract();
        assert_eq!(c.fields["stage"].field_type, FieldType::String);
        assert_eq!(c.fields["sequence"].field_type, FieldType::Integer);
        assert_eq!(c.fields["details"].field_type, FieldType::Object);
    }

    #[test]
    fn type_matching() {
        assert!(FieldType::String.matches(&json!("S03")));
        assert!(FieldType::Integer.matches(&json!(4)));
        assert!(!FieldType::Integer.matches(&json!(4.5)));
        assert!(FieldType::Number.matches(&json!(4.5)));
        assert!(FieldType::Number.matches(&json!(4)));
        assert!(FieldType::Boolean.matches(&json!(true)));
        assert!(!FieldType::Object.matches(&json!([1, 2])));
    }

    #[test]
    fn critical_flags_are_case_insensitive() {
        let c = contract();
        assert!(c.is_critical_flag("PVLM"));
        assert!(c.is_critical_flag("pvlm"));
        assert!(c.is_critical_flag("MpAm"));
        assert!(!c.is_critical_flag("BENIGN"));
    }
}
