//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-up, email verification codes, password login
//! - `cart` - Session cart store mirrored to `cart_items`
//! - `catalog` - Cached home page shelves
//! - `checkout` - Cart to per-farm orders
//! - `orders` - Order history and owner fulfilment

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
