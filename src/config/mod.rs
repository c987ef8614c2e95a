// src/config/mod.rs

//! Runtime configuration for one `devloop` invocation.
//!
//! The root project's manifest gives the defaults (`[run]`, `[watch]`), the
//! CLI overrides them, and a few environment variables fill in what neither
//! names. The result is a [`Settings`] value that is fixed for the lifetime
//! of the process.

pub mod settings;

pub use settings::{POLLING_ENV, PROGRAM_ENV, Settings};
