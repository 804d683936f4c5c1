//! The shopping cart held in a visitor's session.
//!
//! The cart is a plain ordered list of lines. It survives logout, and when a
//! customer signs in it is reconciled with the rows stored for their account
//! (see [`Cart::merge_with_server`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrganizationId, Price, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One product in the cart, with the catalog details shown alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// What to do with the two carts at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The account already has saved items; they replace the session cart.
    UseServer(Vec<CartLine>),
    /// The account has nothing saved; write the session lines to it.
    PushLocal(Vec<CartLine>),
}

/// Session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity > 0 {
                cart.push_or_merge(line);
            }
        }
        cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Add a line. If the product is already present the quantities are
    /// summed and the stored catalog details are refreshed.
    ///
    /// Returns the resulting quantity for that product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `line.quantity` is zero.
    pub fn add(&mut self, line: CartLine) -> Result<u32, CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        Ok(self.push_or_merge(line))
    }

    fn push_or_merge(&mut self, line: CartLine) -> u32 {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            let quantity = existing.quantity.saturating_add(line.quantity);
            *existing = CartLine { quantity, ..line };
            quantity
        } else {
            let quantity = line.quantity;
            self.lines.push(line);
            quantity
        }
    }

    /// Set the quantity of a product already in the cart. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] for an unknown product.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        if quantity == 0 {
            self.lines.remove(pos);
        } else if let Some(line) = self.lines.get_mut(pos) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn subtotal_price(&self) -> Price {
        Price::inr(self.subtotal())
    }

    /// Distinct organizations in the order they first appear.
    #[must_use]
    pub fn organizations(&self) -> Vec<OrganizationId> {
        let mut seen = Vec::new();
        for line in &self.lines {
            if !seen.contains(&line.organization_id) {
                seen.push(line.organization_id);
            }
        }
        seen
    }

    /// Lines grouped per organization, one order each at checkout.
    #[must_use]
    pub fn group_by_organization(&self) -> Vec<(OrganizationId, Vec<CartLine>)> {
        let mut groups: Vec<(OrganizationId, Vec<CartLine>)> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|(org, _)| *org == line.organization_id) {
                Some((_, lines)) => lines.push(line.clone()),
                None => groups.push((line.organization_id, vec![line.clone()])),
            }
        }
        groups
    }

    /// Decide how to reconcile this session cart with the account's saved
    /// cart at sign-in.
    ///
    /// A non-empty saved cart wins outright. An empty one receives the
    /// session lines.
    #[must_use]
    pub fn merge_with_server(&self, server_lines: Vec<CartLine>) -> MergeOutcome {
        if server_lines.is_empty() {
            MergeOutcome::PushLocal(self.lines.clone())
        } else {
            MergeOutcome::UseServer(server_lines)
        }
    }
}
