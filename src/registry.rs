use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CompilerError, SourceLocation};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveFn {
    pub function_name: String,
    pub function_id: String,
    pub extracted_filename: String,
    pub filename: String,
    pub chunk_name: String,
    pub location: SourceLocation,
}

/// Relocated functions keyed by id, in discovery order. Serializes as an
/// id → function object.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    fns: Vec<DirectiveFn>,
}

impl DirectiveRegistry {
    /// Ids are disambiguated while naming, so a repeated id is a bug.
    pub fn insert(&mut self, directive_fn: DirectiveFn) -> Result<(), CompilerError> {
        if let Some(existing) = self.get(&directive_fn.function_id) {
            return Err(CompilerError::internal(
                &format!(
                    "Duplicate function id \"{}\" for \"{}\" and \"{}\"",
                    directive_fn.function_id, existing.function_name, directive_fn.function_name
                ),
                &directive_fn.filename,
            ));
        }
        self.fns.push(directive_fn);
        Ok(())
    }

    pub fn get(&self, function_id: &str) -> Option<&DirectiveFn> {
        self.fns.iter().find(|f| f.function_id == function_id)
    }

    pub fn by_function_name(&self, function_name: &str) -> Option<&DirectiveFn> {
        self.fns.iter().find(|f| f.function_name == function_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveFn> {
        self.fns.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.fns.iter().map(|f| f.function_id.as_str()).collect()
    }

    /// Hoisted binding names, discovery order.
    pub fn function_names(&self) -> Vec<&str> {
        self.fns.iter().map(|f| f.function_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }
}

impl Serialize for DirectiveRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fns.len()))?;
        for directive_fn in &self.fns {
            map.serialize_entry(&directive_fn.function_id, directive_fn)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> DirectiveFn {
        DirectiveFn {
            function_name: name.to_string(),
            function_id: format!("test_ts--{}", name),
            extracted_filename: "test.ts?tsr-directive-use-server=".to_string(),
            filename: "test.ts".to_string(),
            chunk_name: "test_ts_tsr_directive_use_server_".to_string(),
            location: SourceLocation { line: 1, column: 1 },
        }
    }

    #[test]
    fn test_registry_keeps_discovery_order() {
        let mut registry = DirectiveRegistry::default();
        registry.insert(entry("b")).unwrap();
        registry.insert(entry("a")).unwrap();
        assert_eq!(registry.function_names(), vec!["b", "a"]);
        assert_eq!(registry.get("test_ts--a").map(|f| f.function_name.as_str()), Some("a"));
        assert!(registry.by_function_name("c").is_none());
    }

    #[test]
    fn test_registry_serializes_by_id() {
        let mut registry = DirectiveRegistry::default();
        registry.insert(entry("f")).unwrap();
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["test_ts--f"]["functionName"], "f");
        assert_eq!(json["test_ts--f"]["chunkName"], "test_ts_tsr_directive_use_server_");
    }

    #[test]
    fn test_registry_rejects_duplicate_id() {
        let mut registry = DirectiveRegistry::default();
        registry.insert(entry("f")).unwrap();
        let mut twin = entry("g");
        twin.function_id = "test_ts--f".to_string();

        let err = registry.insert(twin).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Internal);
        assert!(err.message.contains("test_ts--f"), "{}", err.message);
        assert_eq!(registry.function_names(), vec!["f"], "first entry is kept");
    }
}
