//! Cart and wishlist state owned by one shopper session.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ClientError, Persistence};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartLine {
    pub product_id: Uuid,
    pub name: String,
    /// Empty when the product has no colour choice.
    pub color: String,
    pub quantity: u32,
    /// Display price only; checkout is priced by the server.
    pub price: Money,
}

impl LocalCartLine {
    fn is(&self, product_id: Uuid, color: &str) -> bool {
        self.product_id == product_id && self.color == color
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    pub lines: Vec<LocalCartLine>,
}

impl CartState {
    pub fn quantity_of(&self, product_id: Uuid, color: &str) -> u32 {
        self.lines.iter().find(|l| l.is(product_id, color)).map_or(0, |l| l.quantity)
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().fold(0u32, |n, l| n.saturating_add(l.quantity))
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.price.times(l.quantity)).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistState {
    pub product_ids: BTreeSet<Uuid>,
}

/// Everything a session persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub cart: CartState,
    pub wishlist: WishlistState,
}

/// Server answer to "may this line grow by `delta`?".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockVerdict {
    Ok,
    /// Fewer units on the shelf than the line would hold.
    Warning { message: String, available: u32 },
    Rejected { message: String },
}

#[async_trait]
pub trait StockChecker: Send + Sync {
    async fn check(&self, product_id: Uuid, color: &str, in_cart: u32, delta: u32) -> Result<StockVerdict, ClientError>;
}

pub struct SessionStore<P: Persistence> {
    persistence: P,
    state: SessionSnapshot,
}

impl<P: Persistence> SessionStore<P> {
    /// Restores saved state, or starts empty when nothing was saved.
    pub fn load(persistence: P) -> Result<Self, ClientError> {
        let state = persistence.load()?.unwrap_or_default();
        Ok(Self { persistence, state })
    }

    pub fn cart(&self) -> &CartState {
        &self.state.cart
    }

    pub fn wishlist(&self) -> &WishlistState {
        &self.state.wishlist
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.state
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    fn save(&self) -> Result<(), ClientError> {
        self.persistence.save(&self.state)
    }

    /// Grows the (product, colour) line by `delta` once the checker agrees.
    /// A warning or rejection leaves the cart untouched and is handed back
    /// for display.
    pub async fn increase_quantity(
        &mut self,
        checker: &dyn StockChecker,
        product: &Product,
        color: &str,
        delta: u32,
    ) -> Result<StockVerdict, ClientError> {
        if delta == 0 {
            return Ok(StockVerdict::Ok);
        }
        let color = color.trim();
        let in_cart = self.state.cart.quantity_of(product.id, color);
        let verdict = checker.check(product.id, color, in_cart, delta).await?;
        if verdict != StockVerdict::Ok {
            tracing::debug!(product_id = %product.id, in_cart, delta, ?verdict, "Cart increase refused");
            return Ok(verdict);
        }

        let lines = &mut self.state.cart.lines;
        match lines.iter_mut().find(|l| l.is(product.id, color)) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(delta);
                line.price = product.price;
                line.name = product.name.clone();
            }
            None => lines.push(LocalCartLine {
                product_id: product.id,
                name: product.name.clone(),
                color: color.to_string(),
                quantity: delta,
                price: product.price,
            }),
        }
        self.save()?;
        Ok(StockVerdict::Ok)
    }

    /// Shrinks a line; it disappears when it reaches zero. Never checked.
    pub fn decrease_quantity(&mut self, product_id: Uuid, color: &str, delta: u32) -> Result<(), ClientError> {
        let color = color.trim();
        let lines = &mut self.state.cart.lines;
        let Some(pos) = lines.iter().position(|l| l.is(product_id, color)) else {
            return Ok(());
        };
        match lines[pos].quantity.checked_sub(delta).filter(|q| *q > 0) {
            Some(q) => lines[pos].quantity = q,
            None => {
                lines.remove(pos);
            }
        }
        self.save()
    }

    pub fn remove_line(&mut self, product_id: Uuid, color: &str) -> Result<(), ClientError> {
        let color = color.trim();
        let before = self.state.cart.lines.len();
        self.state.cart.lines.retain(|l| !l.is(product_id, color));
        if self.state.cart.lines.len() == before {
            return Ok(());
        }
        self.save()
    }

    pub fn clear_cart(&mut self) -> Result<(), ClientError> {
        if self.state.cart.lines.is_empty() {
            return Ok(());
        }
        self.state.cart.lines.clear();
        self.save()
    }

    /// Optimistic local toggle; returns whether the product is now wishlisted.
    pub fn toggle_wishlist(&mut self, product_id: Uuid) -> Result<bool, ClientError> {
        let ids = &mut self.state.wishlist.product_ids;
        let wishlisted = if ids.remove(&product_id) { false } else { ids.insert(product_id) };
        self.save()?;
        Ok(wishlisted)
    }

    pub fn is_wishlisted(&self, product_id: Uuid) -> bool {
        self.state.wishlist.product_ids.contains(&product_id)
    }
}
