//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and `Serialize` so repositories can load
//! them directly and handlers can return them as JSON.

pub mod address;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use address::{Address, AddressInput};
pub use catalog::{
    CategorySummary, NewProduct, Organization, OrganizationUpdate, Product, ProductSort,
    ProductUpdate, ValidationError, category_from_slug,
};
pub use order::{
    Order, OrderCustomer, OrderDetail, OrderItem, OrderSummary, PAYMENT_METHOD_COD, Payment,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, ProfileUpdate, User};
