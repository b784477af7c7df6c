//! Threshold alerting for the sreagent load plugin.
//!
//! Thresholds live in a [`config::ConfigStore`] as validated
//! `low < design < engineered` bands. The [`engine::AlertEvaluator`] turns
//! each band into an ordered [`rules::band::RuleChain`] and walks the chains
//! against a metrics snapshot to produce a single verdict per tick.

pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
