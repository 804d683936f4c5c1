//! Core types for Green Aura.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pincode;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pincode::{Pincode, PincodeError};
pub use price::{CurrencyCode, Price};
pub use role::{Role, RoleParseError};
pub use status::*;
