pub mod chat;
pub mod config_cmd;
pub mod memory;
pub mod tools;
