// src/config/mod.rs

//! Configuration for kiln.
//!
//! Settings come from three layers, later layers winning:
//! 1. built-in defaults ([`RawSettings::default`]),
//! 2. an optional TOML file (`Kiln.toml` or `--config <path>`),
//! 3. CLI flags / `KILN_*` environment variables.
//!
//! [`Settings`] is the validated, resolved form the rest of the crate uses.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_from_path, load_settings};
pub use model::{RawSettings, Settings};
