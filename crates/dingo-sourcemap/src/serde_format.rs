use crate::map::SourceMap;
use crate::mapping::Mapping;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CURRENT_VERSION: u32 = crate::map::CURRENT_VERSION;

/// On-disk `.go.map` JSON document: `{version, source_file, generated_file, mappings}`.
/// Mapping record order carries no semantics but must be stable for diffability.
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializedMap {
    pub version: u32,
    pub source_file: String,
    pub generated_file: String,
    pub mappings: Vec<SerializedMapping>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializedMapping {
    pub ol: u32,
    pub oc: u32,
    pub gl: u32,
    pub gc: u32,
    pub len: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported source map version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed source map: {0}")]
    MalformedMap(String),
}

impl SourceMap {
    pub fn serialize(&self) -> Vec<u8> {
        let doc = SerializedMap {
            version: self.version,
            source_file: self.source_file.clone(),
            generated_file: self.generated_file.clone(),
            mappings: self
                .mappings()
                .iter()
                .map(|m| SerializedMapping {
                    ol: m.dingo.line,
                    oc: m.dingo.column,
                    gl: m.go.line,
                    gc: m.go.column,
                    len: m.length,
                    name: m.name.clone(),
                })
                .collect(),
        };
        serde_json::to_vec_pretty(&doc).expect("SerializedMap is always representable as JSON")
    }

    pub fn parse(bytes: &[u8]) -> Result<SourceMap, ParseError> {
        let doc: SerializedMap = serde_json::from_slice(bytes)
            .map_err(|e| ParseError::MalformedMap(e.to_string()))?;
        if doc.version != CURRENT_VERSION {
            return Err(ParseError::UnsupportedVersion(doc.version));
        }
        let mut map = SourceMap::new(doc.source_file, doc.generated_file);
        for entry in doc.mappings {
            let mapping = Mapping {
                dingo: Position::new(entry.ol, entry.oc),
                go: Position::new(entry.gl, entry.gc),
                length: entry.len,
                name: entry.name,
            };
            map.add(mapping)
                .map_err(|e| ParseError::MalformedMap(e.to_string()))?;
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_json() {
        let mut map = SourceMap::new("a.dingo", "a.go");
        map.add(Mapping::new(Position::new(1, 1), Position::new(2, 1), 3).with_name("error_prop"))
            .unwrap();
        let bytes = map.serialize();
        let parsed = SourceMap::parse(&bytes).unwrap();
        assert_eq!(parsed.source_file, "a.dingo");
        assert_eq!(parsed.mappings(), map.mappings());
    }

    #[test]
    fn rejects_unsupported_version() {
        let bad = br#"{"version":2,"source_file":"a","generated_file":"b","mappings":[]}"#;
        assert_eq!(SourceMap::parse(bad), Err(ParseError::UnsupportedVersion(2)));
    }

    #[test]
    fn rejects_malformed_json() {
        let bad = br#"{not json"#;
        assert!(matches!(SourceMap::parse(bad), Err(ParseError::MalformedMap(_))));
    }
}
