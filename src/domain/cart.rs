//! The per-session cart and its advisory admission rules.
//!
//! The cart is never shared between sessions and never persisted. Its stock
//! checks are advisory only: they catch the common case early against the
//! stock cache, while the checkout transaction remains the authority.

use crate::domain::inventory::{Finish, StockView};
use crate::domain::user::Role;
use crate::error::ShopError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Uniqueness key of a cart line: one line per (card, finish) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub card_id: String,
    pub finish: Finish,
}

/// Display fields captured at add time. Never refreshed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub name: String,
    pub set_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub key: LineKey,
    #[serde(flatten)]
    pub snapshot: LineSnapshot,
    /// Unit price fixed at add time.
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Admits `quantity` more units of (card, finish), merging into an
    /// existing line when present.
    ///
    /// Non-admin admissions are checked against `stock` minus what this cart
    /// already reserves; a shortfall rejects without mutating the cart and
    /// reports the available count. Admins are admitted unconditionally
    /// (intentional overselling for manual tracking) — the checkout
    /// transaction still refuses to overdraw for every role.
    pub fn add(
        &mut self,
        stock: &dyn StockView,
        role: Role,
        key: LineKey,
        snapshot: LineSnapshot,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), ShopError> {
        if quantity == 0 {
            return Err(ShopError::MalformedInput);
        }
        if role != Role::Admin {
            let reserved = self.quantity_of(&key);
            let available =
                stock.stock(&key.card_id, key.finish) - reserved as i32;
            if i64::from(quantity) > i64::from(available) {
                return Err(ShopError::InsufficientStock {
                    card_id: key.card_id,
                    finish: key.finish,
                    available: available.max(0),
                });
            }
        }
        match self.lines.iter_mut().find(|l| l.key == key) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                key,
                snapshot,
                unit_price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Applies a signed quantity delta to an existing line.
    ///
    /// A resulting quantity of zero or less removes the line. Growth re-runs
    /// the advisory check (admin bypass applies); shrinking never fails.
    pub fn adjust(
        &mut self,
        stock: &dyn StockView,
        role: Role,
        key: &LineKey,
        delta: i32,
    ) -> Result<(), ShopError> {
        let pos = self
            .lines
            .iter()
            .position(|l| &l.key == key)
            .ok_or(ShopError::NotFound)?;
        let current = i64::from(self.lines[pos].quantity);
        let new = current + i64::from(delta);
        if new <= 0 {
            self.lines.remove(pos);
            return Ok(());
        }
        if new > current && role != Role::Admin {
            // Reserved by other lines is zero for this key, so availability
            // is simply the cached stock.
            let available = stock.stock(&key.card_id, key.finish);
            if new > i64::from(available) {
                return Err(ShopError::InsufficientStock {
                    card_id: key.card_id.clone(),
                    finish: key.finish,
                    available: available.max(0),
                });
            }
        }
        self.lines[pos].quantity = new as u32;
        Ok(())
    }

    /// Unconditional removal. Removing an absent line is a no-op.
    pub fn remove(&mut self, key: &LineKey) {
        self.lines.retain(|l| &l.key != key);
    }

    /// Empties the cart. Called after a successful checkout and on logout.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Derived total; never stored.
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, key: &LineKey) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.key == key)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedStock(HashMap<(String, Finish), i32>);

    impl FixedStock {
        fn new(entries: &[(&str, Finish, i32)]) -> Self {
            FixedStock(
                entries
                    .iter()
                    .map(|(id, f, q)| ((id.to_string(), *f), *q))
                    .collect(),
            )
        }
    }

    impl StockView for FixedStock {
        fn stock(&self, card_id: &str, finish: Finish) -> i32 {
            self.0
                .get(&(card_id.to_string(), finish))
                .copied()
                .unwrap_or(0)
        }
    }

    fn key(card_id: &str, finish: Finish) -> LineKey {
        LineKey {
            card_id: card_id.into(),
            finish,
        }
    }

    fn snapshot(name: &str) -> LineSnapshot {
        LineSnapshot {
            name: name.into(),
            set_name: "Test Set".into(),
            image: None,
        }
    }

    fn price(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn adding_same_pair_twice_merges_into_one_line() {
        let stock = FixedStock::new(&[("X", Finish::Normal, 5)]);
        let mut cart = Cart::default();
        for _ in 0..2 {
            cart.add(
                &stock,
                Role::User,
                key("X", Finish::Normal),
                snapshot("X"),
                price("1.00"),
                1,
            )
            .unwrap();
        }
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn finishes_are_distinct_lines() {
        let stock = FixedStock::new(&[
            ("X", Finish::Normal, 5),
            ("X", Finish::Foil, 5),
        ]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 1)
            .unwrap();
        cart.add(&stock, Role::User, key("X", Finish::Foil), snapshot("X"), price("3.00"), 1)
            .unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn admission_counts_units_already_reserved() {
        let stock = FixedStock::new(&[("X", Finish::Normal, 3)]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 2)
            .unwrap();
        let err = cart
            .add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 2)
            .unwrap_err();
        match err {
            ShopError::InsufficientStock { available, .. } => assert_eq!(available, 1),
            other => panic!("unexpected error: {other}"),
        }
        // Rejection must not mutate the cart.
        assert_eq!(cart.quantity_of(&key("X", Finish::Normal)), 2);
    }

    #[test]
    fn admin_admission_is_unconditional() {
        let stock = FixedStock::new(&[]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::Admin, key("X", Finish::Normal), snapshot("X"), price("1.00"), 5)
            .unwrap();
        assert_eq!(cart.quantity_of(&key("X", Finish::Normal)), 5);

        let mut user_cart = Cart::default();
        let err = user_cart
            .add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 5)
            .unwrap_err();
        assert!(matches!(err, ShopError::InsufficientStock { available: 0, .. }));
        assert!(user_cart.is_empty());
    }

    #[test]
    fn adjust_to_zero_removes_the_line() {
        let stock = FixedStock::new(&[("X", Finish::Normal, 5)]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 1)
            .unwrap();
        cart.adjust(&stock, Role::User, &key("X", Finish::Normal), -1)
            .unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn adjust_growth_is_stock_checked() {
        let stock = FixedStock::new(&[("X", Finish::Normal, 2)]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 2)
            .unwrap();
        let err = cart
            .adjust(&stock, Role::User, &key("X", Finish::Normal), 1)
            .unwrap_err();
        assert!(matches!(err, ShopError::InsufficientStock { available: 2, .. }));
        assert_eq!(cart.quantity_of(&key("X", Finish::Normal)), 2);
        // Shrinking is never stock-checked.
        cart.adjust(&stock, Role::User, &key("X", Finish::Normal), -1)
            .unwrap();
        assert_eq!(cart.quantity_of(&key("X", Finish::Normal)), 1);
    }

    #[test]
    fn total_recomputes_after_removal() {
        let stock = FixedStock::new(&[
            ("A", Finish::Normal, 10),
            ("B", Finish::Foil, 10),
        ]);
        let mut cart = Cart::default();
        cart.add(&stock, Role::User, key("A", Finish::Normal), snapshot("A"), price("10.00"), 2)
            .unwrap();
        cart.add(&stock, Role::User, key("B", Finish::Foil), snapshot("B"), price("5.50"), 1)
            .unwrap();
        assert_eq!(cart.total(), price("25.50"));
        cart.remove(&key("B", Finish::Foil));
        assert_eq!(cart.total(), price("20.00"));
    }

    #[test]
    fn zero_quantity_add_is_malformed() {
        let stock = FixedStock::new(&[("X", Finish::Normal, 5)]);
        let mut cart = Cart::default();
        let err = cart
            .add(&stock, Role::User, key("X", Finish::Normal), snapshot("X"), price("1.00"), 0)
            .unwrap_err();
        assert!(matches!(err, ShopError::MalformedInput));
    }
}
