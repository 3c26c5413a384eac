//! Lists given either as a sequence or as one comma-separated string.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum ListValue {
    Joined(String),
    Items(Vec<String>),
}

pub(super) fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match ListValue::deserialize(deserializer)? {
        ListValue::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        ListValue::Items(items) => items,
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
