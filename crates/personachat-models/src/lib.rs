//! Shared domain models for the PersonaChat backend.
//!
//! Everything the browser client exchanges with the server lives here:
//! characters, conversations, stored message turns, and the locale handling
//! the default character set depends on. Types carry `ts-rs` derives so the
//! TypeScript client stays in sync with the wire format.

pub mod character;
pub mod chat;
pub mod defaults;
pub mod locale;

pub use character::Character;
pub use chat::{ChatRole, Conversation, StoredMessage};
pub use defaults::{default_character, default_characters, default_greeting};
pub use locale::Locale;
