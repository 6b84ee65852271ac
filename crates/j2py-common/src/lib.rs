//! Shared configuration support for the j2py translator.
//!
//! This crate provides the pieces every other j2py crate consults:
//! - Layered settings lookup (`Config`, `ConfigLayer`, `SettingValue`)
//! - The built-in default layer and setting names (`defaults`)
//! - Default thresholds and sizes (`limits`)

// Layered settings with "last wins" and "combined" lookup modes
pub mod config;
pub use config::{Config, ConfigLayer, SettingValue, load_layers, parse_layer};

// Built-in default configuration layer
pub mod defaults;
pub use defaults::{default_layer, keys};

// Centralized default values and thresholds
pub mod limits;
