//! Message storage.
//!
//! Message rows are keyed `{conversation_id}:{created_at:020}:{seq:020}` so a
//! prefix range scan returns a conversation's turns ordered by creation time.
//! The sequence suffix is a process-wide counter that keeps insertion order
//! for appends landing on the same millisecond.

use anyhow::Result;
use personachat_models::StoredMessage;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const MESSAGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

static APPEND_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct MessageStorage {
    db: Arc<Database>,
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGE_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn append(&self, message: &StoredMessage) -> Result<()> {
        let key = index_key(
            &message.conversation_id,
            message.created_at,
            APPEND_SEQ.fetch_add(1, Ordering::Relaxed),
        );

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MESSAGE_TABLE)?;
            let bytes = serde_json::to_vec(message)?;
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List a conversation's messages ordered by creation time, oldest first.
    pub fn list(&self, conversation_id: &str) -> Result<Vec<StoredMessage>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGE_TABLE)?;

        let prefix = format!("{conversation_id}:");
        let mut messages = Vec::new();

        let mut iter = table.range(prefix.as_str()..)?;
        while let Some(Ok((key, value))) = iter.next() {
            if !key.value().starts_with(&prefix) {
                break;
            }
            messages.push(serde_json::from_slice(value.value())?);
        }

        Ok(messages)
    }

    /// Remove all message rows of a conversation inside an existing write
    /// transaction. Returns the number of rows removed.
    pub(crate) fn remove_conversation_in_txn(
        &self,
        txn: &WriteTransaction,
        conversation_id: &str,
    ) -> Result<usize> {
        let mut table = txn.open_table(MESSAGE_TABLE)?;
        let prefix = format!("{conversation_id}:");

        let keys: Vec<String> = {
            let mut keys = Vec::new();
            let mut iter = table.range(prefix.as_str()..)?;
            while let Some(Ok((key, _))) = iter.next() {
                if !key.value().starts_with(&prefix) {
                    break;
                }
                keys.push(key.value().to_string());
            }
            keys
        };

        for key in &keys {
            table.remove(key.as_str())?;
        }
        Ok(keys.len())
    }
}

fn index_key(conversation_id: &str, created_at_ms: i64, seq: u64) -> String {
    let created_at_ms = created_at_ms.max(0) as u64;
    // Seq padded to the full u64 width so ordering holds at any counter value.
    format!("{conversation_id}:{created_at_ms:020}:{seq:020}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_models::ChatRole;
    use tempfile::tempdir;

    fn test_store() -> (MessageStorage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("messages.redb");
        let db = Arc::new(Database::create(db_path).unwrap());
        (MessageStorage::new(db).unwrap(), dir)
    }

    #[test]
    fn test_append_and_list_ordered() {
        let (store, _dir) = test_store();

        let mut first = StoredMessage::user("conv-1", "hi");
        first.created_at = 1_000;
        let mut second = StoredMessage::assistant("conv-1", "hello");
        second.created_at = 2_000;

        // Insert out of order; listing must come back by creation time.
        store.append(&second).unwrap();
        store.append(&first).unwrap();

        let messages = store.list("conv-1").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_same_millisecond_appends_keep_insertion_order() {
        let (store, _dir) = test_store();

        for i in 0..5 {
            let mut message = StoredMessage::user("conv-1", format!("turn {i}"));
            message.created_at = 1_000;
            store.append(&message).unwrap();
        }

        let messages = store.list("conv-1").unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 0", "turn 1", "turn 2", "turn 3", "turn 4"]);
    }

    #[test]
    fn test_list_scopes_by_conversation() {
        let (store, _dir) = test_store();

        store.append(&StoredMessage::user("conv-1", "one")).unwrap();
        store.append(&StoredMessage::user("conv-2", "two")).unwrap();

        let messages = store.list("conv-1").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].content, "one");
    }

    #[test]
    fn test_index_key_orders_across_digit_widths() {
        let shorter = index_key("conv-1", 1_000, 999_999);
        let longer = index_key("conv-1", 1_000, 1_000_000);
        assert!(shorter < longer);
        assert!(index_key("conv-1", 1_000, 0) < index_key("conv-1", 1_000, u64::MAX));
    }

    #[test]
    fn test_list_empty_conversation() {
        let (store, _dir) = test_store();
        assert!(store.list("conv-1").unwrap().is_empty());
    }
}
