pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod profile;
pub mod session;
