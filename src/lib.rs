pub mod cli;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod metadata;
pub mod redact;
pub mod secret;
