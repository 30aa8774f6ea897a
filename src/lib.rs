//! IFTTT webhook remote for Kodi — authorize webhook calls, drive the player, keep a SPDYN record fresh.

pub mod cli;
pub mod config;
pub mod dyndns;
pub mod http;
pub mod kodi;
pub mod player;
pub mod remote;
pub mod settings;
pub mod shutdown;
