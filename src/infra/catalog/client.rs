// Responsible for all communication with the external card catalog.

use crate::domain::card::{Card, CardFace, CardFaces, FinishPrices};
use crate::error::ShopError;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Sort order requested from the catalog's search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrdering {
    /// Storefront landing queries: most-played first.
    Popularity,
    /// Shopper name searches: every printing, newest first.
    ReleaseDate,
}

/// Read-only client for the remote card catalog. All lookups are
/// unauthenticated; responses are normalized here so the rest of the system
/// sees one consistent card shape.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    exchange_rate: Decimal,
}

impl CatalogClient {
    pub fn new(base_url: String, exchange_rate: Decimal) -> Self {
        CatalogClient {
            http: reqwest::Client::new(),
            base_url,
            exchange_rate,
        }
    }

    /// Free-text search. Shopper searches widen to every printing of the
    /// named card; an unmatched query is an empty result, not an error.
    pub async fn search(
        &self,
        query: &str,
        ordering: SearchOrdering,
    ) -> Result<Vec<Card>, ShopError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let (q, order) = match ordering {
            SearchOrdering::Popularity => (query.to_string(), "edhrec"),
            SearchOrdering::ReleaseDate => (format!("{query} unique:prints"), "released"),
        };
        let resp = self
            .http
            .get(format!("{}/cards/search", self.base_url))
            .query(&[("q", q.as_str()), ("order", order)])
            .send()
            .await?;
        if !resp.status().is_success() {
            // The catalog reports "no results" as an error status.
            return Ok(Vec::new());
        }
        let payload: CardListPayload = resp.json().await?;
        Ok(self.normalize_all(payload.data))
    }

    /// Candidate full names for a partial name. Partials of one or two
    /// characters return no suggestions without a network call.
    pub async fn autocomplete(&self, partial: &str) -> Result<Vec<String>, ShopError> {
        if partial.trim().chars().count() <= 2 {
            return Ok(Vec::new());
        }
        let resp = self
            .http
            .get(format!("{}/cards/autocomplete", self.base_url))
            .query(&[("q", partial)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }
        let payload: AutocompletePayload = resp.json().await?;
        Ok(payload.data)
    }

    /// Batch lookup by catalog identifier, used to hydrate in-stock ids into
    /// full display records. Unknown ids are simply absent from the result.
    pub async fn lookup(&self, ids: &[String]) -> Result<Vec<Card>, ShopError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let identifiers: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id }))
            .collect();
        let resp = self
            .http
            .post(format!("{}/cards/collection", self.base_url))
            .json(&serde_json::json!({ "identifiers": identifiers }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }
        let payload: CardListPayload = resp.json().await?;
        Ok(self.normalize_all(payload.data))
    }

    fn normalize_all(&self, raw: Vec<RawCard>) -> Vec<Card> {
        raw.into_iter()
            .filter_map(|c| normalize(c, self.exchange_rate))
            .collect()
    }
}

// --- Raw catalog shapes (deserialization only) ---

#[derive(Debug, Deserialize)]
struct CardListPayload {
    #[serde(default)]
    data: Vec<RawCard>,
}

#[derive(Debug, Deserialize)]
struct AutocompletePayload {
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCard {
    id: String,
    name: String,
    #[serde(default)]
    set_name: String,
    #[serde(default)]
    collector_number: String,
    #[serde(default)]
    rarity: String,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    image_uris: Option<RawImages>,
    #[serde(default)]
    card_faces: Option<Vec<RawFace>>,
    #[serde(default)]
    prices: RawPrices,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    #[serde(default)]
    normal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFace {
    name: String,
    #[serde(default)]
    oracle_text: Option<String>,
    #[serde(default)]
    image_uris: Option<RawImages>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPrices {
    #[serde(default)]
    usd: Option<String>,
    #[serde(default)]
    usd_foil: Option<String>,
}

/// Collapses a loosely-shaped catalog document into the explicit tagged
/// union. Cards with no imagery on any face are dropped.
fn normalize(raw: RawCard, rate: Decimal) -> Option<Card> {
    let faces = match (raw.image_uris.and_then(|i| i.normal), raw.card_faces) {
        (Some(image), _) => CardFaces::SingleFaced {
            oracle_text: raw.oracle_text,
            image,
        },
        (None, Some(raw_faces)) => {
            let faces: Vec<CardFace> = raw_faces
                .into_iter()
                .map(|f| CardFace {
                    name: f.name,
                    oracle_text: f.oracle_text,
                    image: f.image_uris.and_then(|i| i.normal),
                })
                .collect();
            if faces.iter().all(|f| f.image.is_none()) {
                return None;
            }
            CardFaces::MultiFaced { faces }
        }
        (None, None) => return None,
    };
    Some(Card {
        id: raw.id,
        name: raw.name,
        set_name: raw.set_name,
        collector_number: raw.collector_number,
        rarity: raw.rarity,
        faces,
        prices: FinishPrices::from_reference(
            raw.prices.usd.as_deref(),
            raw.prices.usd_foil.as_deref(),
            rate,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::Finish;

    fn raw(json: serde_json::Value) -> RawCard {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn single_faced_card_normalizes_with_converted_prices() {
        let card = normalize(
            raw(serde_json::json!({
                "id": "abc",
                "name": "Lightning Bolt",
                "set_name": "Magic 2011",
                "collector_number": "149",
                "rarity": "common",
                "oracle_text": "Lightning Bolt deals 3 damage to any target.",
                "image_uris": { "normal": "https://img.example/bolt.jpg" },
                "prices": { "usd": "2.00", "usd_foil": null }
            })),
            Decimal::from(2),
        )
        .unwrap();
        assert!(matches!(card.faces, CardFaces::SingleFaced { .. }));
        assert_eq!(card.prices.get(Finish::Normal), Some(Decimal::from(4)));
        assert_eq!(card.prices.get(Finish::Foil), None);
    }

    #[test]
    fn multi_faced_card_without_top_level_imagery_is_tagged() {
        let card = normalize(
            raw(serde_json::json!({
                "id": "dfc",
                "name": "Delver of Secrets // Insectile Aberration",
                "card_faces": [
                    { "name": "Delver of Secrets",
                      "image_uris": { "normal": "https://img.example/front.jpg" } },
                    { "name": "Insectile Aberration" }
                ],
                "prices": { "usd": "0.50" }
            })),
            Decimal::ONE,
        )
        .unwrap();
        match card.faces {
            CardFaces::MultiFaced { ref faces } => assert_eq!(faces.len(), 2),
            _ => panic!("expected a multi-faced layout"),
        }
        assert_eq!(card.primary_image(), Some("https://img.example/front.jpg"));
    }

    #[test]
    fn imageless_cards_are_dropped() {
        assert!(normalize(
            raw(serde_json::json!({ "id": "x", "name": "Art Proof" })),
            Decimal::ONE,
        )
        .is_none());
        assert!(normalize(
            raw(serde_json::json!({
                "id": "y",
                "name": "Faceless",
                "card_faces": [{ "name": "Front" }, { "name": "Back" }]
            })),
            Decimal::ONE,
        )
        .is_none());
    }
}
