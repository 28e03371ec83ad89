//! Tickboard Common Library
//!
//! This crate provides shared constants, the commodity series registry, and
//! configuration loading utilities for all tickboard workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and well-known shared resource names
//! - [`series`] - The closed set of commodity series and their indices
//! - [`config`] - Configuration loading traits and types
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! tick = { package = "tick_common", path = "../tick_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use tick_common::consts::*;
//! use tick_common::series::Commodity;
//! ```

pub mod config;
pub mod consts;
pub mod series;
