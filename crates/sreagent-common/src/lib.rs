//! Data model shared by the sreagent load plugin crates.

pub mod types;
