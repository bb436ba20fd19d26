//! Polls public disaster-warning feeds and fans new entries out to Discord
//! channels and opted-in users.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod services;
pub mod sources;
pub mod storage;
