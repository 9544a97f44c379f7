//! Discord soundboard: members trigger short pre-recorded clips that play one
//! at a time, first come first served, in their voice channel.

pub mod audio;
pub mod bot;
pub mod config;
pub mod error;
pub mod sources;
pub mod ui;
