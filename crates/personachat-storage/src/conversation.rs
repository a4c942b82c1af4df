//! Conversation storage.
//!
//! Conversations are stored by id with a secondary per-user index keyed by
//! reverse creation timestamp, so listing a user's conversations is a single
//! prefix range scan that yields newest first.

use anyhow::Result;
use personachat_models::Conversation;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::sync::Arc;

const CONVERSATION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("conversations");
const CONVERSATION_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("conversations:index");

pub struct ConversationStorage {
    db: Arc<Database>,
}

impl ConversationStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CONVERSATION_TABLE)?;
        write_txn.open_table(CONVERSATION_INDEX)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn create(&self, conversation: &Conversation) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONVERSATION_TABLE)?;
            let bytes = serde_json::to_vec(conversation)?;
            table.insert(conversation.id.as_str(), bytes.as_slice())?;

            let mut index = write_txn.open_table(CONVERSATION_INDEX)?;
            let key = index_key(&conversation.user_id, conversation.created_at, &conversation.id);
            index.insert(key.as_str(), conversation.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONVERSATION_TABLE)?;

        if let Some(bytes) = table.get(id)? {
            Ok(Some(serde_json::from_slice(bytes.value())?))
        } else {
            Ok(None)
        }
    }

    /// List a user's conversations, newest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CONVERSATION_INDEX)?;
        let table = read_txn.open_table(CONVERSATION_TABLE)?;

        let prefix = format!("{user_id}:");
        let mut conversations = Vec::new();

        let mut iter = index.range(prefix.as_str()..)?;
        while let Some(Ok((key, value))) = iter.next() {
            if !key.value().starts_with(&prefix) {
                break;
            }
            if let Some(bytes) = table.get(value.value())? {
                conversations.push(serde_json::from_slice(bytes.value())?);
            }
        }

        Ok(conversations)
    }

    /// Bump `updated_at` after a message append.
    pub fn touch(&self, id: &str) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONVERSATION_TABLE)?;
            let mut conversation: Conversation = match table.get(id)? {
                Some(bytes) => serde_json::from_slice(bytes.value())?,
                None => return Err(anyhow::anyhow!("Conversation not found: {id}")),
            };
            conversation.updated_at = chrono::Utc::now().timestamp_millis();
            let bytes = serde_json::to_vec(&conversation)?;
            table.insert(id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove the conversation row and its index entry inside an existing
    /// write transaction. Used by the cascading delete.
    pub(crate) fn remove_in_txn(
        &self,
        txn: &WriteTransaction,
        conversation: &Conversation,
    ) -> Result<()> {
        let mut table = txn.open_table(CONVERSATION_TABLE)?;
        table.remove(conversation.id.as_str())?;

        let mut index = txn.open_table(CONVERSATION_INDEX)?;
        let key = index_key(&conversation.user_id, conversation.created_at, &conversation.id);
        index.remove(key.as_str())?;
        Ok(())
    }
}

fn index_key(user_id: &str, created_at_ms: i64, conversation_id: &str) -> String {
    let created_at_ms = created_at_ms.max(0) as u64;
    let reverse_ts = u64::MAX - created_at_ms;
    format!("{user_id}:{reverse_ts:020}:{conversation_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConversationStorage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("conversations.redb");
        let db = Arc::new(Database::create(db_path).unwrap());
        (ConversationStorage::new(db).unwrap(), dir)
    }

    #[test]
    fn test_create_and_get() {
        let (store, _dir) = test_store();

        let conversation = Conversation::new("user-1", "Chat with Einstein");
        store.create(&conversation).unwrap();

        let loaded = store.get(&conversation.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Chat with Einstein");
    }

    #[test]
    fn test_list_for_user_newest_first() {
        let (store, _dir) = test_store();

        let mut first = Conversation::new("user-1", "First");
        first.created_at = 1_000;
        let mut second = Conversation::new("user-1", "Second");
        second.created_at = 2_000;
        let other = Conversation::new("user-2", "Other");

        store.create(&first).unwrap();
        store.create(&second).unwrap();
        store.create(&other).unwrap();

        let conversations = store.list_for_user("user-1").unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].title, "Second");
        assert_eq!(conversations[1].title, "First");
    }

    #[test]
    fn test_touch_updates_timestamp() {
        let (store, _dir) = test_store();

        let mut conversation = Conversation::new("user-1", "Chat");
        conversation.updated_at = 0;
        store.create(&conversation).unwrap();

        store.touch(&conversation.id).unwrap();
        let loaded = store.get(&conversation.id).unwrap().unwrap();
        assert!(loaded.updated_at > 0);
    }

    #[test]
    fn test_touch_missing_conversation_errors() {
        let (store, _dir) = test_store();
        assert!(store.touch("missing").is_err());
    }
}
