pub mod auth;
pub mod chat_flow;
pub mod config;
pub mod credentials;
pub mod inbound;
pub mod message;
pub mod notice;
pub mod store;
pub mod timeline;
pub mod voice_call;
