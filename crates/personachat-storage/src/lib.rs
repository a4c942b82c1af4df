//! PersonaChat persistence layer.
//!
//! This crate provides the storage for the chat backend, using redb as the
//! embedded database. Each entity gets its own storage struct over a shared
//! database handle.
//!
//! # Tables
//!
//! - `characters` - User-created characters
//! - `conversations` / `conversations:index` - Conversations + per-user index
//! - `messages` - Message turns keyed for ordered listing

pub mod character;
pub mod conversation;
pub mod message;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use character::CharacterStorage;
pub use conversation::ConversationStorage;
pub use message::MessageStorage;

/// Central storage manager that initializes all storage subsystems.
pub struct Storage {
    db: Arc<Database>,
    pub characters: CharacterStorage,
    pub conversations: ConversationStorage,
    pub messages: MessageStorage,
}

impl Storage {
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let characters = CharacterStorage::new(db.clone())?;
        let conversations = ConversationStorage::new(db.clone())?;
        let messages = MessageStorage::new(db.clone())?;

        Ok(Self {
            db,
            characters,
            conversations,
            messages,
        })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Delete a conversation together with all of its message rows in a
    /// single write transaction.
    pub fn delete_conversation_cascade(&self, conversation_id: &str) -> Result<bool> {
        let Some(conversation) = self.conversations.get(conversation_id)? else {
            return Ok(false);
        };

        let txn = self.db.begin_write()?;
        {
            self.conversations.remove_in_txn(&txn, &conversation)?;
            let removed = self.messages.remove_conversation_in_txn(&txn, conversation_id)?;
            tracing::debug!(
                conversation_id,
                removed_messages = removed,
                "Deleted conversation"
            );
        }
        txn.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_models::{Conversation, StoredMessage};
    use tempfile::tempdir;

    fn test_storage() -> (Storage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("personachat.redb");
        (Storage::new(db_path.to_str().unwrap()).unwrap(), dir)
    }

    #[test]
    fn test_delete_conversation_cascade() {
        let (storage, _dir) = test_storage();

        let conversation = Conversation::new("user-1", "Chat");
        storage.conversations.create(&conversation).unwrap();
        storage
            .messages
            .append(&StoredMessage::user(&conversation.id, "hi"))
            .unwrap();
        storage
            .messages
            .append(&StoredMessage::assistant(&conversation.id, "hello"))
            .unwrap();

        assert!(storage.delete_conversation_cascade(&conversation.id).unwrap());
        assert!(storage.conversations.get(&conversation.id).unwrap().is_none());
        assert!(storage.messages.list(&conversation.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_conversation_cascade_missing() {
        let (storage, _dir) = test_storage();
        assert!(!storage.delete_conversation_cascade("missing").unwrap());
    }
}
