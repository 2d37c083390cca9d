//! Per-card, per-finish stock quantities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical print variant of a card unit. Each finish has independent
/// price and stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finish {
    Normal,
    Foil,
}

impl Finish {
    pub const ALL: [Finish; 2] = [Finish::Normal, Finish::Foil];

    /// Name of the inventory column backing this finish.
    pub fn column(&self) -> &'static str {
        match self {
            Finish::Normal => "normal",
            Finish::Foil => "foil",
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Stock counts for both finishes of one card. A missing inventory row is
/// equivalent to `StockLevels::default()` (both zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub normal: i32,
    pub foil: i32,
}

impl StockLevels {
    pub fn get(&self, finish: Finish) -> i32 {
        match finish {
            Finish::Normal => self.normal,
            Finish::Foil => self.foil,
        }
    }

    pub fn set(&mut self, finish: Finish, quantity: i32) {
        match finish {
            Finish::Normal => self.normal = quantity,
            Finish::Foil => self.foil = quantity,
        }
    }
}

/// Read seam for the best-known stock level of a (card, finish) pair.
///
/// The cart's advisory admission check is written against this trait so it
/// works the same over the live stock cache and over test stubs. Reads must
/// never fail; unknown keys report zero.
pub trait StockView {
    fn stock(&self, card_id: &str, finish: Finish) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_finish_defaults_to_zero() {
        let levels = StockLevels::default();
        assert_eq!(levels.get(Finish::Normal), 0);
        assert_eq!(levels.get(Finish::Foil), 0);
    }

    #[test]
    fn set_touches_only_one_finish() {
        let mut levels = StockLevels { normal: 5, foil: 2 };
        levels.set(Finish::Normal, 7);
        assert_eq!(levels, StockLevels { normal: 7, foil: 2 });
    }
}
