//! Core types for Smart Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
pub use username::{Username, UsernameError};
