use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid collection identifier: {0}")]
pub struct CollectionIdError(pub String);

/// Identifier of a task collection.
///
/// Either a calendar day (`2025-07-29`) or a copy identifier
/// (`copy-20250729-1690000000000`). Neither form contains an underscore.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionId(String);

impl CollectionId {
    pub const COPY_PREFIX: &'static str = "copy-";

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    /// Build a copy identifier from the day it was made and a millisecond stamp.
    pub fn copy(day: NaiveDate, millis: u64) -> Self {
        Self(format!("{}{}-{}", Self::COPY_PREFIX, day.format("%Y%m%d"), millis))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar day for date identifiers, `None` for copies.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.0)
    }

    pub fn is_copy(&self) -> bool {
        self.0.starts_with(Self::COPY_PREFIX)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    // Reject forms chrono tolerates but that would not round-trip.
    (date.format(DATE_FORMAT).to_string() == s).then_some(date)
}

fn is_copy_id(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(CollectionId::COPY_PREFIX) else {
        return false;
    };
    let Some((day, stamp)) = rest.split_once('-') else {
        return false;
    };
    day.len() == 8
        && day.bytes().all(|b| b.is_ascii_digit())
        && !stamp.is_empty()
        && stamp.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for CollectionId {
    type Err = CollectionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if parse_date(s).is_some() || is_copy_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CollectionIdError(s.to_string()))
        }
    }
}

impl TryFrom<String> for CollectionId {
    type Error = CollectionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CollectionId> for String {
    fn from(id: CollectionId) -> Self {
        id.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
