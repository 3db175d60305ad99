pub mod chat;
pub mod product;
pub mod websocket;
