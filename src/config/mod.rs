//! Configuration module
//!
//! Loads the mock server connection settings and action defaults, and
//! resolves them (together with command-line overrides) into a [`Target`].

pub mod loader;
pub mod schema;

pub use loader::load;
pub use schema::{
    ChaosConfig, DEFAULT_TIMEOUT, Defaults, ServerSection, Target, TargetOverrides,
};
