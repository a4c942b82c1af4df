//! Character models.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::locale::Locale;

/// An AI character a user chats with.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Character {
    pub id: String,
    /// Owner of the character. Built-in default characters carry no owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    pub avatar_url: String,
    pub description: String,
    pub greeting: String,
    #[ts(type = "number")]
    pub created_at: i64,
}

impl Character {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        avatar_url: impl Into<String>,
        description: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: Some(user_id.into()),
            name: name.into(),
            avatar_url: avatar_url.into(),
            description: description.into(),
            greeting: greeting.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether this id refers to one of the built-in default characters.
    pub fn is_default_id(id: &str) -> bool {
        id.starts_with("default-")
    }

    /// Render the system message the model is primed with.
    ///
    /// This is the prompt the web client used to compose inline before each
    /// request: character identity, optional description, the greeting, and
    /// an instruction to stay in role and answer in the client's language.
    pub fn system_prompt(&self, locale: Locale) -> String {
        let description = if self.description.is_empty() {
            String::new()
        } else {
            match locale {
                Locale::Tr => format!("Karakterin açıklaması: \"{}\". ", self.description),
                Locale::En => format!("Character description: \"{}\". ", self.description),
            }
        };

        match locale {
            Locale::Tr => format!(
                "Sen {} adlı bir karaktersin. {}Karakterin karşılama mesajı: \"{}\". \
                 Bu rolle uyumlu şekilde yanıt ver. Türkçe konuş ve karakterin \
                 kişiliğini yansıt.",
                self.name, description, self.greeting
            ),
            Locale::En => format!(
                "You are a character named {}. {}The character's greeting message: \
                 \"{}\". Respond in a way consistent with this role. Speak English \
                 and reflect the character's personality.",
                self.name, description, self.greeting
            ),
        }
    }
}
