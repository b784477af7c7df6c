//! Host side of the sreagent load plugin.
//!
//! [`plugin::LoadPlugin`] implements the [`plugin::MeasurementPlugin`]
//! lifecycle on top of the collector and alert crates. The [`host`] module
//! drives that lifecycle on a fixed tick, and [`http`] serves the exported
//! gauges for scraping.

pub mod config;
pub mod host;
pub mod http;
pub mod plugin;
