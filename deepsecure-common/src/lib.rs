//! # DeepSecure Common Library
//!
//! Shared code for the DeepSecure dashboard service and its tooling:
//! - Error and result types
//! - Bootstrap configuration (TOML + environment + compiled defaults)
//! - Event types (`DashEvent`) and the broadcast `EventBus`

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
