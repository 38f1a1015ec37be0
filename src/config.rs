//! Engine configuration: name-length bounds and vendor rule tables.

use serde::{Deserialize, Serialize};

use crate::vendor::VendorRegistry;

/// Inclusive bounds on a trimmed name's character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameRules {
    pub schema: LengthBounds,
    pub table: LengthBounds,
    pub column: LengthBounds,
    pub index: LengthBounds,
    pub constraint: LengthBounds,
    pub relationship: LengthBounds,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            schema: LengthBounds::new(3, 20),
            table: LengthBounds::new(1, 20),
            column: LengthBounds::new(1, 64),
            index: LengthBounds::new(1, 64),
            constraint: LengthBounds::new(1, 64),
            relationship: LengthBounds::new(1, 64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub names: NameRules,
    pub vendors: VendorRegistry,
}

impl EngineConfig {
    /// Load a config, falling back to defaults for omitted sections.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::Vendor;

    #[test]
    fn test_default_bounds() {
        let names = NameRules::default();
        assert_eq!(names.schema, LengthBounds::new(3, 20));
        assert_eq!(names.table, LengthBounds::new(1, 20));
        assert!(names.schema.contains(3));
        assert!(!names.schema.contains(2));
        assert!(!names.schema.contains(21));
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = EngineConfig::from_json(r#"{ "names": { "table": { "min": 2, "max": 40 } } }"#)
            .unwrap();
        assert_eq!(config.names.table, LengthBounds::new(2, 40));
        assert_eq!(config.names.schema, LengthBounds::new(3, 20));
        assert!(config.vendors.get(Vendor::MySql).is_some());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(EngineConfig::from_json("{ names: 1 }").is_err());
    }
}
