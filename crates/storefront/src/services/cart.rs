//! Cart store service.
//!
//! The session holds the working cart for every visitor. For signed-in users
//! each mutation is mirrored to `cart_items` so the cart follows them to
//! other devices.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use green_aura_core::{Cart, CartError, CartLine, MergeOutcome, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::models::session_keys;

#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    #[error("only {available} left of product {product_id}, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i32,
    },

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read the session cart, empty if none was stored.
///
/// # Errors
///
/// Returns the session store error if the session can't be read.
pub async fn load_session_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Overwrite the session cart.
///
/// # Errors
///
/// Returns the session store error if the session can't be written.
pub async fn save_session_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

pub struct CartService<'a> {
    session: &'a Session,
    user_id: Option<UserId>,
    products: ProductRepository<'a>,
    saved: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session, user_id: Option<UserId>) -> Self {
        Self {
            session,
            user_id,
            products: ProductRepository::new(pool),
            saved: CartRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `CartServiceError::Session` if the session can't be read.
    pub async fn load(&self) -> Result<Cart, CartServiceError> {
        Ok(load_session_cart(self.session).await?)
    }

    /// Add `quantity` units of a product, refreshing its price and details.
    ///
    /// # Errors
    ///
    /// Returns `ProductUnavailable` if the product is hidden or gone and
    /// `InsufficientStock` if the cart would exceed what's in stock.
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<Cart, CartServiceError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }
        let product = self
            .products
            .get_public(product_id)
            .await?
            .ok_or(CartServiceError::ProductUnavailable(product_id))?;

        let mut cart = self.load().await?;
        let requested = cart
            .get(product_id)
            .map_or(0, |line| line.quantity)
            .saturating_add(quantity);
        if !product.can_fulfil(requested) {
            return Err(CartServiceError::InsufficientStock {
                product_id,
                requested,
                available: product.stock_quantity,
            });
        }

        let total = cart.add(product.cart_line(quantity))?;
        save_session_cart(self.session, &cart).await?;
        if let Some(user_id) = self.user_id {
            self.saved.upsert(user_id, product_id, total).await?;
        }
        Ok(cart)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` for products not in the cart and
    /// `InsufficientStock` if stock can't cover the new quantity.
    pub async fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartServiceError> {
        let mut cart = self.load().await?;
        if cart.get(product_id).is_none() {
            return Err(CartError::NotInCart(product_id).into());
        }

        if quantity > 0 {
            let product = self
                .products
                .get_public(product_id)
                .await?
                .ok_or(CartServiceError::ProductUnavailable(product_id))?;
            if !product.can_fulfil(quantity) {
                return Err(CartServiceError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: product.stock_quantity,
                });
            }
        }

        cart.set_quantity(product_id, quantity)?;
        save_session_cart(self.session, &cart).await?;
        if let Some(user_id) = self.user_id {
            if quantity == 0 {
                self.saved.remove(user_id, product_id).await?;
            } else {
                self.saved.upsert(user_id, product_id, quantity).await?;
            }
        }
        Ok(cart)
    }

    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product wasn't in the cart.
    pub async fn remove(&self, product_id: ProductId) -> Result<Cart, CartServiceError> {
        let mut cart = self.load().await?;
        if !cart.remove(product_id) {
            return Err(CartError::NotInCart(product_id).into());
        }
        save_session_cart(self.session, &cart).await?;
        if let Some(user_id) = self.user_id {
            self.saved.remove(user_id, product_id).await?;
        }
        Ok(cart)
    }

    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `Repository` on storage failure.
    pub async fn clear(&self) -> Result<(), CartServiceError> {
        save_session_cart(self.session, &Cart::new()).await?;
        if let Some(user_id) = self.user_id {
            self.saved.clear(user_id).await?;
        }
        Ok(())
    }

    /// Reconcile the session cart with the account's saved cart at sign-in.
    ///
    /// Session lines for products that can no longer be bought are dropped
    /// rather than pushed.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `Repository` on storage failure.
    pub async fn sync_on_login(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        let local = self.load().await?;
        let server = self.saved.list(user_id).await?;

        let cart = match local.merge_with_server(server) {
            MergeOutcome::UseServer(lines) => Cart::from_lines(lines),
            MergeOutcome::PushLocal(lines) if lines.is_empty() => Cart::new(),
            MergeOutcome::PushLocal(lines) => {
                let saved = self.saved.replace_all(user_id, &lines).await?;
                let (kept, dropped) = keep_saved(lines, &saved);
                if dropped > 0 {
                    tracing::info!(user_id = %user_id, dropped, "Dropped unavailable cart lines at login");
                }
                Cart::from_lines(kept)
            }
        };

        save_session_cart(self.session, &cart).await?;
        tracing::debug!(user_id = %user_id, items = cart.item_count(), "Cart synced at login");
        Ok(cart)
    }
}

/// Keep the lines whose products were saved; returns them and how many
/// were dropped.
fn keep_saved(lines: Vec<CartLine>, saved: &[ProductId]) -> (Vec<CartLine>, usize) {
    let before = lines.len();
    let kept: Vec<CartLine> = lines
        .into_iter()
        .filter(|line| saved.contains(&line.product_id))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
