//! Schema module - Configuration types for reading Flow Lenia animations.

mod config;

pub use config::*;
