//! Due date parsing and formatting
//!
//! Input is forgiving: `YYYY-MM-DD`, `DD/MM/YYYY` and `DD-MM-YYYY` are all
//! accepted. Output is always the canonical `YYYY-MM-DD`.

use chrono::NaiveDate;
use thiserror::Error;

/// Canonical storage and display format
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unrecognized date '{0}'. Use YYYY-MM-DD or DD/MM/YYYY.")]
pub struct DateError(pub String);

/// Parses a user-supplied date.
///
/// Blank input means "no date" and yields `Ok(None)`. Anything else must
/// parse, otherwise the caller gets a `DateError` and has to reject the input.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>, DateError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    for format in [CANONICAL_FORMAT, DAY_FIRST_FORMAT] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(Some(date));
        }
    }

    // DD-MM-YYYY
    NaiveDate::parse_from_str(&text.replace('-', "/"), DAY_FIRST_FORMAT)
        .map(Some)
        .map_err(|_| DateError(text.to_string()))
}

/// Formats an optional date in canonical form; `None` becomes empty text.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(CANONICAL_FORMAT).to_string())
        .unwrap_or_default()
}

/// Serde adapter storing `Option<NaiveDate>` as `""` or `YYYY-MM-DD`.
///
/// Reading goes through [`parse_date`], so day-first dates written by older
/// versions of the file still load.
pub mod serde_text {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: Option<String> = Option::deserialize(deserializer)?;
        match text {
            None => Ok(None),
            Some(text) => super::parse_date(&text).map_err(serde::de::Error::custom),
        }
    }
}
