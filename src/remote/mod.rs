//! Webhook command domain: credential checks, the closed command set, and
//! translation of commands into player operations.

pub mod auth;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod request;

pub use error::RemoteError;
