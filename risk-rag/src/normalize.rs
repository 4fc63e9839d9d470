//! Record normalisation: raw record → [`CanonicalDocument`].
//!
//! Everything here is pure. The same raw record always yields the same
//! document.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::document::{
    CanonicalDocument, DATE_NOT_INFORMED, NO_OBSERVATIONS, NOT_INFORMED, YEAR_NOT_INFORMED,
};
use crate::record::{Field, RawRecord, resolve_field};

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("valid date token pattern"));

/// Normalise a raw record into its canonical document.
pub fn normalize(record: &RawRecord) -> CanonicalDocument {
    let field = |f: Field| resolve_field(record, f).unwrap_or_else(|| NOT_INFORMED.to_string());

    let opened =
        resolve_field(record, Field::Opened).unwrap_or_else(|| DATE_NOT_INFORMED.to_string());
    let ended = field(Field::Ended);
    let note = latest_note(&resolve_field(record, Field::Note).unwrap_or_default());

    CanonicalDocument {
        id: field(Field::Identifier),
        area: field(Field::Area),
        responsible: field(Field::Responsible),
        risk: field(Field::Risk),
        status: field(Field::Status),
        criticality: field(Field::Criticality),
        opened_year: extract_year(&opened),
        opened,
        ended_year: extract_year(&ended),
        ended,
        note,
    }
}

/// Read the year off a `DD/MM/YYYY`-like date: its last four characters.
///
/// Anything shorter than four characters or without a `/` separator yields
/// [`YEAR_NOT_INFORMED`]. Calendar correctness is not checked.
pub fn extract_year(date: &str) -> String {
    let chars: Vec<char> = date.chars().collect();
    if chars.len() >= 4 && date.contains('/') {
        chars[chars.len() - 4..].iter().collect()
    } else {
        YEAR_NOT_INFORMED.to_string()
    }
}

/// Pick the most recent dated entry out of a free-text note.
///
/// Each `DD/MM/YYYY` token starts an entry that runs until the next token or
/// the end of the text. Tokens that are not real dates are skipped. Ties keep
/// the first entry. Text without any usable date is returned trimmed, and a
/// blank note becomes [`NO_OBSERVATIONS`].
pub fn latest_note(text: &str) -> String {
    if text.trim().is_empty() {
        return NO_OBSERVATIONS.to_string();
    }

    let tokens: Vec<_> = DATE_TOKEN.find_iter(text).collect();
    let mut latest: Option<(NaiveDate, &str)> = None;

    for (i, token) in tokens.iter().enumerate() {
        let Ok(date) = NaiveDate::parse_from_str(token.as_str(), "%d/%m/%Y") else {
            continue;
        };
        let end = tokens.get(i + 1).map_or(text.len(), |next| next.start());
        let span = text[token.start()..end].trim();
        match latest {
            Some((best, _)) if best >= date => {}
            _ => latest = Some((date, span)),
        }
    }

    latest.map_or_else(|| text.trim().to_string(), |(_, span)| span.to_string())
}
