//! `stubchaos` - fault injection for WireMock-compatible mock servers
//!
//! Selects stub mappings on a running mock server through its admin API and
//! rewrites their responses to add delays, protocol faults or status
//! overrides.

pub mod cli;
pub mod config;
pub mod error;
pub mod mapping;
pub mod matcher;
pub mod mutation;
pub mod observability;
pub mod selection;
pub mod store;
