use super::{Result, TrackerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const MONTH_KEY_FORMAT: &str = "%Y-%m";

/// Length of the `YYYY-MM` prefix shared by date-keys and month-keys.
pub const MONTH_KEY_LEN: usize = 7;

/// Storage key under which a user's record lives, both remotely and in the local cache.
pub fn record_key(user: &str) -> String {
    format!("supp-{user}")
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// The `YYYY-MM` prefix of a date-key, or `None` when the key is too short to carry one.
pub fn month_of(key: &str) -> Option<&str> {
    if key.len() < MONTH_KEY_LEN || !key.is_char_boundary(MONTH_KEY_LEN) {
        return None;
    }
    Some(&key[..MONTH_KEY_LEN])
}

/// Supplement history of one user: date-key to the ordered list taken that day.
///
/// Lists are stored exactly as written; duplicates are not collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(BTreeMap<String, Vec<String>>);

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, date: &str) -> Option<&[String]> {
        self.0.get(date).map(Vec::as_slice)
    }

    pub fn taken(&self, date: &str) -> &[String] {
        self.get(date).unwrap_or(&[])
    }

    pub fn contains_date(&self, date: &str) -> bool {
        self.0.contains_key(date)
    }

    /// Replaces the whole list for `date`.
    pub fn set_day(&mut self, date: impl Into<String>, supplements: Vec<String>) {
        self.0.insert(date.into(), supplements);
    }

    pub fn remove(&mut self, date: &str) -> Option<Vec<String>> {
        self.0.remove(date)
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Keeps only the entries whose date-key satisfies `keep`; returns how many were dropped.
    pub fn retain_dates<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.0.len();
        self.0.retain(|date, _| keep(date));
        before - self.0.len()
    }

    /// Shallow merge: every entry of `other` overwrites the same date here.
    pub fn merge_over(&mut self, other: UserRecord) {
        self.0.extend(other.0);
    }

    /// Decodes a stored JSON value. `null` is an empty record; a non-object is a storage fault.
    ///
    /// Entries whose value is not an array of strings are dropped with a warning so a
    /// partially corrupt record stays readable.
    pub fn from_json(value: Value, owner: &str) -> Result<Self> {
        let map = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => {
                return Err(TrackerError::storage(format!(
                    "record for '{owner}' is not a JSON object (found {})",
                    json_kind(&other)
                )));
            }
        };

        let mut record = Self::new();
        for (date, entry) in map {
            match serde_json::from_value::<Vec<String>>(entry) {
                Ok(supplements) => record.set_day(date, supplements),
                Err(err) => {
                    warn!(user = owner, date = %date, error = %err, "dropping malformed record entry");
                }
            }
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(date, list)| {
                    let items = list.iter().cloned().map(Value::String).collect();
                    (date.clone(), Value::Array(items))
                })
                .collect(),
        )
    }
}

impl FromIterator<(String, Vec<String>)> for UserRecord {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UserRecord {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
