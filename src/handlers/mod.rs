pub mod auth;
pub mod config;
pub mod directory;
pub mod errors;
pub mod policy;
