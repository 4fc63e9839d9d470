//! Raw records as they arrive from storage, and the candidate keys used to
//! read each logical field out of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source record: an arbitrary JSON object with heterogeneous key naming.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wrap a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Return the raw JSON value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Return the value under `key` as text, or `None` when the value is
    /// absent or empty (`null`, blank string, `false`, empty array/object).
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(items) if items.is_empty() => None,
            Value::Object(map) if map.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A logical record field, independent of how the source names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Identifier,
    Area,
    Responsible,
    Risk,
    Status,
    Criticality,
    Opened,
    Ended,
    Note,
}

impl Field {
    /// Source keys to try for this field, canonical name first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::Identifier => &["id_deficiencia", "ID DEFICIÊNCIA"],
            Field::Area => &["area_de_origem", "ÁREA DE ORIGEM"],
            Field::Responsible => &["gerente_responsavel", "GERENTE RESPONSÁVEL"],
            Field::Risk => &["deficiencia", "DEFICIÊNCIA", "RISCO"],
            Field::Status => &["status", "STATUS"],
            Field::Criticality => &["criticidade", "CRITICIDADE"],
            Field::Opened => &["data_abertura_deficiencia", "DATA ABERTURA DEFICIÊNCIA"],
            Field::Ended => &["data_encerramento", "DATA ENCERRAMENTO"],
            Field::Note => &["observacao", "OBSERVAÇÃO", "update"],
        }
    }
}

/// Resolve a logical field by trying each candidate key in order.
pub fn resolve_field(record: &RawRecord, field: Field) -> Option<String> {
    field.candidates().iter().find_map(|key| record.text(key))
}
