//! Character storage.

use anyhow::Result;
use personachat_models::Character;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const CHARACTER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("characters");

pub struct CharacterStorage {
    db: Arc<Database>,
}

impl CharacterStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHARACTER_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn insert(&self, character: &Character) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHARACTER_TABLE)?;
            let bytes = serde_json::to_vec(character)?;
            table.insert(character.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Character>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHARACTER_TABLE)?;

        if let Some(bytes) = table.get(id)? {
            Ok(Some(serde_json::from_slice(bytes.value())?))
        } else {
            Ok(None)
        }
    }

    /// List a user's characters, oldest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Character>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHARACTER_TABLE)?;

        let mut characters = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let character: Character = serde_json::from_slice(value.value())?;
            if character.user_id.as_deref() == Some(user_id) {
                characters.push(character);
            }
        }

        characters.sort_by_key(|c| c.created_at);
        Ok(characters)
    }

    /// Overwrite an existing character.
    pub fn update(&self, character: &Character) -> Result<()> {
        self.insert(character)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(CHARACTER_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }
}
