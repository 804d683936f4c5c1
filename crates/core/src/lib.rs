//! Green Aura Core - Shared domain library.
//!
//! This crate provides the types and pure logic used across all Green Aura
//! components:
//! - `storefront` - JSON storefront service (customers and organization owners)
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, statuses, roles, emails and pincodes
//! - [`cart`] - The session cart store and its login merge policy
//! - [`guard`] - Route access decisions for signed-in and anonymous visitors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod guard;
pub mod types;

pub use cart::{Cart, CartError, CartLine, MergeOutcome};
pub use guard::{Access, decide};
pub use types::*;
