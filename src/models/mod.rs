pub mod chat;
pub mod clone;
