pub mod chat;
pub mod routine;
