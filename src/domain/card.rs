//! Card records as seen by the rest of the system.
//!
//! The catalog gateway returns loosely-shaped documents; they are normalized
//! at that boundary (see `infra::catalog`) into the tagged shapes below so
//! no other module performs speculative field access.

use crate::domain::inventory::Finish;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One face of a multi-faced card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    pub oracle_text: Option<String>,
    pub image: Option<String>,
}

/// Single- vs multi-faced card layouts, made explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum CardFaces {
    SingleFaced {
        oracle_text: Option<String>,
        image: String,
    },
    MultiFaced {
        faces: Vec<CardFace>,
    },
}

/// Local-currency price per finish. `None` means the catalog lists no price
/// for that finish, and the card cannot be carted in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishPrices {
    pub normal: Option<Decimal>,
    pub foil: Option<Decimal>,
}

impl FinishPrices {
    pub fn get(&self, finish: Finish) -> Option<Decimal> {
        match finish {
            Finish::Normal => self.normal,
            Finish::Foil => self.foil,
        }
    }

    /// Converts reference-currency price strings into local prices by the
    /// fixed exchange-rate multiplier. Unparseable strings become `None`.
    pub fn from_reference(
        normal: Option<&str>,
        foil: Option<&str>,
        rate: Decimal,
    ) -> Self {
        let convert = |raw: Option<&str>| {
            raw.and_then(|s| Decimal::from_str(s.trim()).ok())
                .map(|p| p * rate)
        };
        FinishPrices {
            normal: convert(normal),
            foil: convert(foil),
        }
    }
}

/// A catalog card record, immutable from this system's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Opaque catalog identifier, stable across queries.
    pub id: String,
    pub name: String,
    pub set_name: String,
    pub collector_number: String,
    pub rarity: String,
    #[serde(flatten)]
    pub faces: CardFaces,
    pub prices: FinishPrices,
}

impl Card {
    /// The image shown in listings: the card's own, or the front face's.
    pub fn primary_image(&self) -> Option<&str> {
        match &self.faces {
            CardFaces::SingleFaced { image, .. } => Some(image.as_str()),
            CardFaces::MultiFaced { faces } => {
                faces.first().and_then(|f| f.image.as_deref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_prices_convert_by_rate() {
        let prices =
            FinishPrices::from_reference(Some("10.00"), Some("2.50"), Decimal::from(3));
        assert_eq!(prices.normal, Some(Decimal::from(30)));
        assert_eq!(prices.foil, "7.50".parse().ok());
    }

    #[test]
    fn unparseable_price_becomes_none() {
        let prices = FinishPrices::from_reference(Some("n/a"), None, Decimal::ONE);
        assert_eq!(prices.normal, None);
        assert_eq!(prices.foil, None);
    }

    #[test]
    fn primary_image_falls_back_to_front_face() {
        let card = Card {
            id: "c1".into(),
            name: "Delver of Secrets".into(),
            set_name: "Innistrad".into(),
            collector_number: "51".into(),
            rarity: "common".into(),
            faces: CardFaces::MultiFaced {
                faces: vec![
                    CardFace {
                        name: "Delver of Secrets".into(),
                        oracle_text: None,
                        image: Some("https://img.example/front.jpg".into()),
                    },
                    CardFace {
                        name: "Insectile Aberration".into(),
                        oracle_text: None,
                        image: None,
                    },
                ],
            },
            prices: FinishPrices::default(),
        };
        assert_eq!(card.primary_image(), Some("https://img.example/front.jpg"));
    }
}
