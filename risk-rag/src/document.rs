//! Data types for canonical documents and retrieval results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder for a field the source record does not provide.
pub const NOT_INFORMED: &str = "Not informed";
/// Placeholder for a missing opening date.
pub const DATE_NOT_INFORMED: &str = "Date not informed";
/// Placeholder for a year that cannot be read from its date.
pub const YEAR_NOT_INFORMED: &str = "Year not informed";
/// Placeholder for a blank note.
pub const NO_OBSERVATIONS: &str = "No observations";

/// The normalised form of one source record.
///
/// Fields are kept separately so filters can read them directly; the
/// [`Display`](fmt::Display) rendering is what gets embedded and shown to the
/// generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalDocument {
    pub id: String,
    pub area: String,
    pub responsible: String,
    pub risk: String,
    pub status: String,
    pub criticality: String,
    pub opened: String,
    pub opened_year: String,
    pub ended: String,
    pub ended_year: String,
    pub note: String,
}

impl CanonicalDocument {
    /// Render the document as newline-separated `Label: value` lines.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CanonicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Area: {}", self.area)?;
        writeln!(f, "Responsible: {}", self.responsible)?;
        writeln!(f, "Risk: {}", self.risk)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Criticality: {}", self.criticality)?;
        writeln!(f, "Opened: {}", self.opened)?;
        writeln!(f, "Year opened: {}", self.opened_year)?;
        writeln!(f, "Ended: {}", self.ended)?;
        writeln!(f, "Year ended: {}", self.ended_year)?;
        write!(f, "Note: {}", self.note)
    }
}

/// One entry of a retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievedItem {
    /// A matching document.
    Document {
        document: CanonicalDocument,
        /// Squared L2 distance to the question, for semantic results.
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<f32>,
    },
    /// An identifier that was asked for but is not in storage.
    NotFound { id: String },
}

impl RetrievedItem {
    /// Return the document, if this entry is one.
    pub fn document(&self) -> Option<&CanonicalDocument> {
        match self {
            RetrievedItem::Document { document, .. } => Some(document),
            RetrievedItem::NotFound { .. } => None,
        }
    }

    /// Render the entry as context text; not-found entries become a marker
    /// naming the missing id.
    pub fn text(&self) -> String {
        match self {
            RetrievedItem::Document { document, .. } => document.to_text(),
            RetrievedItem::NotFound { id } => format!("ID {id} not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalDocument {
        CanonicalDocument {
            id: "4521".into(),
            area: "IT".into(),
            responsible: "Ana Lima".into(),
            risk: "Shared admin account".into(),
            status: "Ended".into(),
            criticality: "High".into(),
            opened: "01/02/2022".into(),
            opened_year: "2022".into(),
            ended: "15/03/2023".into(),
            ended_year: "2023".into(),
            note: "15/03/2023 account removed".into(),
        }
    }

    #[test]
    fn renders_fixed_label_order() {
        let text = sample().to_text();
        let labels: Vec<&str> =
            text.lines().map(|line| line.split(':').next().unwrap_or_default()).collect();
        assert_eq!(
            labels,
            [
                "ID",
                "Area",
                "Responsible",
                "Risk",
                "Status",
                "Criticality",
                "Opened",
                "Year opened",
                "Ended",
                "Year ended",
                "Note"
            ]
        );
        assert!(text.ends_with("Note: 15/03/2023 account removed"));
    }

    #[test]
    fn not_found_marker_names_the_id() {
        let item = RetrievedItem::NotFound { id: "999".into() };
        assert_eq!(item.text(), "ID 999 not found");
        assert!(item.document().is_none());
    }
}
