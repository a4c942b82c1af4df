pub mod characters;
pub mod chat;
pub mod conversations;
pub mod response;

pub use response::ApiResponse;
