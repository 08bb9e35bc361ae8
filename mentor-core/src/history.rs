//! Persistence of the conversation as a single JSON document.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::HistoryError;
use crate::message::{Message, Sender};
use crate::store::Store;

/// Key under which the history snapshot is stored by default.
pub const HISTORY_KEY: &str = "chatHistory";

/// Snapshot entry as found on disk.
///
/// Older or hand-edited snapshots may lack identifiers or carry timestamps in
/// other shapes; those are repaired on load rather than rejected.
#[derive(Debug, Deserialize)]
struct StoredMessage {
    #[serde(default)]
    id: Option<Value>,
    content: String,
    sender: Sender,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl StoredMessage {
    /// Converts the entry, reporting whether anything had to be rewritten.
    fn normalize(self, now: DateTime<Utc>) -> (Message, bool) {
        let (id, id_repaired) = repair_id(self.id.as_ref());

        let (timestamp, timestamp_repaired) = match &self.timestamp {
            Some(value @ Value::String(_)) => match parse_timestamp(value) {
                Some(ts) => (ts, false),
                None => (now, true),
            },
            Some(other) => (parse_timestamp(other).unwrap_or(now), true),
            None => (now, true),
        };

        let message = Message {
            id,
            content: self.content,
            sender: self.sender,
            timestamp,
        };
        (message, id_repaired || timestamp_repaired)
    }
}

/// Maps a stored identifier onto a UUID.
///
/// Foreign identifiers hash to a name-based UUID so the same entry gets the
/// same id on every load; only absent or empty ones get a random id.
fn repair_id(value: Option<&Value>) -> (Uuid, bool) {
    match value {
        Some(Value::String(s)) if !s.is_empty() => match Uuid::parse_str(s) {
            Ok(id) => (id, false),
            Err(_) => (Uuid::new_v5(&Uuid::NAMESPACE_OID, s.as_bytes()), true),
        },
        Some(Value::Number(n)) => (
            Uuid::new_v5(&Uuid::NAMESPACE_OID, n.to_string().as_bytes()),
            true,
        ),
        _ => (Uuid::new_v4(), true),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Result of reading the snapshot.
#[derive(Debug, Default)]
pub struct LoadedHistory {
    pub messages: Vec<Message>,
    /// True if any entry's id or timestamp was rewritten and the snapshot
    /// should be saved back.
    pub repaired: bool,
}

/// Reads and writes the message list under one key of a [`Store`].
///
/// Loading never fails: a missing snapshot and a corrupt one both come back
/// empty, and the corrupt one is deleted.
pub struct HistoryStore<S> {
    store: S,
    key: String,
}

impl<S: Store> HistoryStore<S> {
    /// Creates an adapter using the default key.
    pub fn new(store: S) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn load(&self) -> Vec<Message> {
        self.load_snapshot().messages
    }

    /// Like [`load`](Self::load), but also reports whether entries were
    /// repaired.
    pub fn load_snapshot(&self) -> LoadedHistory {
        let bytes = match self.store.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return LoadedHistory::default(),
            Err(e) => {
                warn!(error = %e, key = %self.key, "Failed to read chat history");
                return LoadedHistory::default();
            }
        };

        match serde_json::from_slice::<Vec<StoredMessage>>(&bytes) {
            Ok(entries) => {
                let now = Utc::now();
                let mut repaired = false;
                let messages: Vec<Message> = entries
                    .into_iter()
                    .map(|e| {
                        let (message, fixed) = e.normalize(now);
                        repaired |= fixed;
                        message
                    })
                    .collect();
                debug!(count = messages.len(), repaired, "Loaded chat history");
                LoadedHistory { messages, repaired }
            }
            Err(e) => {
                warn!(error = %e, key = %self.key, "Discarding corrupt chat history");
                if let Err(e) = self.store.remove(&self.key) {
                    warn!(error = %e, "Failed to remove corrupt chat history");
                }
                LoadedHistory::default()
            }
        }
    }

    /// Overwrites the snapshot with the given messages.
    pub fn save(&self, messages: &[Message]) -> Result<(), HistoryError> {
        let bytes = serde_json::to_vec(messages)?;
        self.store
            .put(&self.key, &bytes)
            .map_err(|e| HistoryError::Store(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn load_missing_is_empty() {
        let history = HistoryStore::new(MemoryStore::new());
        assert!(history.load().is_empty());
    }

    #[test]
    fn save_then_load() {
        let history = HistoryStore::new(MemoryStore::new());
        let messages = vec![
            Message::new("Hello", Sender::User),
            Message::new("Hi there", Sender::Bot),
        ];

        history.save(&messages).unwrap();
        let loaded = history.load();

        assert_eq!(loaded, messages);
    }

    #[test]
    fn corrupt_snapshot_is_removed() {
        let store = MemoryStore::new();
        store.put(HISTORY_KEY, b"{not json").unwrap();
        let history = HistoryStore::new(&store);

        assert!(history.load().is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn unknown_sender_is_corrupt() {
        let store = MemoryStore::new();
        store
            .put(HISTORY_KEY, br#"[{"content":"x","sender":"system"}]"#)
            .unwrap();
        let history = HistoryStore::new(&store);

        assert!(history.load().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn missing_and_invalid_ids_are_repaired() {
        let store = MemoryStore::new();
        let kept = Uuid::new_v4();
        let snapshot = format!(
            r#"[
                {{"content":"a","sender":"bot","timestamp":"2024-05-01T10:00:00Z"}},
                {{"id":"","content":"b","sender":"user"}},
                {{"id":"not-a-uuid","content":"c","sender":"user"}},
                {{"id":"{}","content":"d","sender":"bot"}}
            ]"#,
            kept
        );
        store.put(HISTORY_KEY, snapshot.as_bytes()).unwrap();

        let loaded = HistoryStore::new(&store).load();

        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded[3].id, kept);
        assert_ne!(loaded[0].id, loaded[1].id);
        assert_ne!(loaded[1].id, loaded[2].id);
        let contents: Vec<&str> = loaded.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["a", "b", "c", "d"]);

        let again = HistoryStore::new(&store).load();
        assert_eq!(again[2].id, loaded[2].id);
    }

    #[test]
    fn clean_snapshot_needs_no_repair() {
        let store = MemoryStore::new();
        let history = HistoryStore::new(&store);
        history.save(&[Message::new("hi", Sender::Bot)]).unwrap();

        let loaded = history.load_snapshot();
        assert_eq!(loaded.messages.len(), 1);
        assert!(!loaded.repaired);
    }

    #[test]
    fn repairs_are_reported() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let history = HistoryStore::new(&store);

        store
            .put(HISTORY_KEY, br#"[{"content":"a","sender":"bot","timestamp":"2024-05-01T10:00:00Z"}]"#)
            .unwrap();
        assert!(history.load_snapshot().repaired);

        let with_millis = format!(
            r#"[{{"id":"{}","content":"a","sender":"bot","timestamp":1714557600000}}]"#,
            id
        );
        store.put(HISTORY_KEY, with_millis.as_bytes()).unwrap();
        let loaded = history.load_snapshot();
        assert!(loaded.repaired);
        assert_eq!(loaded.messages[0].id, id);
    }

    #[test]
    fn timestamps_accept_rfc3339_and_millis() {
        let store = MemoryStore::new();
        store
            .put(
                HISTORY_KEY,
                br#"[
                    {"content":"a","sender":"bot","timestamp":"2024-05-01T10:00:00.000Z"},
                    {"content":"b","sender":"user","timestamp":1714557600000},
                    {"content":"c","sender":"user","timestamp":true}
                ]"#,
            )
            .unwrap();

        let before = Utc::now();
        let loaded = HistoryStore::new(&store).load();

        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(loaded[0].timestamp, expected);
        assert_eq!(loaded[1].timestamp, expected);
        assert!(loaded[2].timestamp >= before);
    }

    #[test]
    fn custom_key() {
        let store = MemoryStore::new();
        let history = HistoryStore::with_key(&store, "other");
        history.save(&[Message::new("x", Sender::Bot)]).unwrap();

        assert!(store.get("other").unwrap().is_some());
        assert!(store.get(HISTORY_KEY).unwrap().is_none());
    }
}
