pub mod chat;
pub mod config_cmd;
pub mod seed;
pub mod serve;
