use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads `null` as the type's zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An emoji as reported by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmojiRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alias_for: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_alias: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub can_delete: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub created: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_bad: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub synonyms: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_display_name: String,
}

impl EmojiRecord {
    pub fn is_alias(&self) -> bool {
        self.is_alias || !self.alias_for.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page: u32,
    #[serde(rename = "pages")]
    pub page_count: u32,
    #[serde(rename = "count")]
    pub page_size: u32,
    #[serde(rename = "total")]
    pub total_count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub emoji: Vec<EmojiRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub disabled_emoji: Vec<EmojiRecord>,
    pub custom_emoji_total_count: usize,
    pub paging: Paging,
}

/// `{ok, error?}`, returned by every mutating endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MutationResponse {
    pub ok: bool,
    pub error: Option<String>,
}

/// A custom emoji that owns its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emoji {
    pub name: String,
    pub url: String,
    pub created: DateTime<Utc>,
    pub creator_id: String,
    pub creator_name: String,
    pub can_delete: bool,
    pub is_bad: bool,
    pub synonyms: Vec<String>,
}

impl Emoji {
    /// Aliases are folded into the emoji they point to, so they yield `None`.
    pub fn from_record(record: EmojiRecord) -> Option<Emoji> {
        if record.is_alias() {
            return None;
        }
        Some(Emoji {
            // the url arrives backslash escaped
            url: record.url.replace('\\', ""),
            created: DateTime::<Utc>::from_timestamp(record.created, 0).unwrap_or_default(),
            creator_id: record.user_id,
            creator_name: record.user_display_name,
            can_delete: record.can_delete,
            is_bad: record.is_bad,
            synonyms: record.synonyms,
            name: record.name,
        })
    }

    pub fn is_usable(&self) -> bool {
        !self.is_bad
    }
}

/// Point-in-time snapshot of the workspace's custom emoji, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct EmojiIndex(HashMap<String, Emoji>);

impl EmojiIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity(capacity))
    }

    /// Adds every non-alias record whose name isn't indexed yet, returns how many were added.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = EmojiRecord>,
    {
        let before = self.0.len();
        for emoji in records.into_iter().filter_map(Emoji::from_record) {
            self.0.entry(emoji.name.clone()).or_insert(emoji);
        }
        self.0.len() - before
    }

    pub fn get(&self, name: &str) -> Option<&Emoji> {
        self.0.get(name)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sorted(&self) -> Vec<&Emoji> {
        let mut emojis = self.0.values().collect::<Vec<_>>();
        emojis.sort_by(|a, b| a.name.cmp(&b.name));
        emojis
    }
}

impl FromIterator<EmojiRecord> for EmojiIndex {
    fn from_iter<I: IntoIterator<Item = EmojiRecord>>(iter: I) -> Self {
        let mut index = EmojiIndex::default();
        index.merge(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> EmojiRecord {
        EmojiRecord {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_listing_envelope() {
        let body = r#"{
            "ok": true,
            "emoji": [{
                "name": "party",
                "is_alias": false,
                "alias_for": "",
                "can_delete": true,
                "created": 1600000000,
                "is_bad": false,
                "synonyms": ["party", "celebrate"],
                "team_id": "T1",
                "url": "https:\\/\\/emoji.example\\/party.gif",
                "user_id": "U1",
                "user_display_name": "ana",
                "avatar_hash": "abc"
            }],
            "disabled_emoji": [],
            "custom_emoji_total_count": 1,
            "paging": {"page": 1, "pages": 1, "count": 1000, "total": 1}
        }"#;
        let response: ListResponse = serde_json::from_str(body).unwrap();
        assert!(response.ok);
        assert_eq!(response.paging.page_count, 1);
        assert_eq!(response.paging.total_count, 1);

        let index = response.emoji.into_iter().collect::<EmojiIndex>();
        let party = index.get("party").unwrap();
        assert_eq!(party.url, "https://emoji.example/party.gif");
        assert_eq!(party.created.timestamp(), 1_600_000_000);
        assert_eq!(party.creator_id, "U1");
        assert_eq!(party.synonyms, vec!["party", "celebrate"]);
        assert!(party.is_usable());
    }

    #[test]
    fn aliases_are_not_indexed() {
        let alias = EmojiRecord {
            alias_for: "party".into(),
            ..record("parrot")
        };
        let flagged = EmojiRecord {
            is_alias: true,
            ..record("yay")
        };
        let index = vec![record("party"), alias, flagged]
            .into_iter()
            .collect::<EmojiIndex>();
        assert_eq!(index.len(), 1);
        assert!(index.get("party").is_some());
        assert!(index.get("parrot").is_none());
        assert!(index.get("yay").is_none());
    }

    #[test]
    fn merge_keeps_first_entry() {
        let mut index = EmojiIndex::default();
        let first = EmojiRecord {
            url: "first".into(),
            ..record("a")
        };
        let second = EmojiRecord {
            url: "second".into(),
            ..record("a")
        };
        assert_eq!(index.merge(vec![first]), 1);
        assert_eq!(index.merge(vec![second, record("b")]), 1);
        assert_eq!(index.get("a").unwrap().url, "first");
        assert_eq!(
            index.sorted().iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn nulls_read_as_empty_values() {
        let body = r#"{
            "ok": true,
            "emoji": [{
                "name": "a",
                "alias_for": null,
                "synonyms": null,
                "user_display_name": null,
                "created": null,
                "url": "https://emoji.example/a.png"
            }],
            "disabled_emoji": null,
            "paging": {"page": 1, "pages": 1, "count": 1000, "total": 1}
        }"#;
        let response: ListResponse = serde_json::from_str(body).unwrap();
        assert!(response.disabled_emoji.is_empty());
        let record = &response.emoji[0];
        assert!(!record.is_alias());
        assert!(record.synonyms.is_empty());

        let index = response.emoji.into_iter().collect::<EmojiIndex>();
        let emoji = index.get("a").unwrap();
        assert_eq!(emoji.creator_name, "");
        assert_eq!(emoji.created.timestamp(), 0);
    }

    #[test]
    fn mutation_response_error() {
        let response: MutationResponse =
            serde_json::from_str(r#"{"ok": false, "error": "error_name_taken"}"#).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("error_name_taken"));
    }
}
