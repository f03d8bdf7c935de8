pub mod chat;
pub mod game;
pub mod health;
