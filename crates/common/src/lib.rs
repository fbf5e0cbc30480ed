//! Shared types for the activity collector workspace

mod constants;
mod error;
mod secret;

pub use constants::*;
pub use error::{Error, Result};
pub use secret::Secret;
