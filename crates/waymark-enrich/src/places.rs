//! Places text-search client.
//!
//! One biased text search per lookup, first result only. Errors and
//! missing credentials degrade to "no enrichment" with a warning; the
//! save path never depends on this call succeeding.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use waymark_core::{defaults, PlaceEnrichment, Result};

/// Default public endpoint for the places API.
pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com/v1";

const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,places.types,places.rating,places.userRatingCount,places.websiteUri,places.nationalPhoneNumber,places.internationalPhoneNumber,places.regularOpeningHours,places.priceLevel";

/// Client for the places text-search endpoint.
#[derive(Clone)]
pub struct PlacesClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    text_query: String,
    location_bias: LocationBias,
    max_result_count: u32,
}

#[derive(Serialize)]
struct LocationBias {
    circle: Circle,
}

#[derive(Serialize)]
struct Circle {
    center: Center,
    radius: f64,
}

#[derive(Serialize)]
struct Center {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Place {
    id: String,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_rating_count: Option<i32>,
    #[serde(default)]
    website_uri: Option<String>,
    #[serde(default)]
    national_phone_number: Option<String>,
    #[serde(default)]
    international_phone_number: Option<String>,
    #[serde(default)]
    regular_opening_hours: Option<OpeningHours>,
    #[serde(default)]
    price_level: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    #[serde(default)]
    weekday_descriptions: Vec<String>,
}

/// Convert a price level constant to dollar signs.
fn format_price_level(price_level: Option<&str>) -> Option<String> {
    match price_level? {
        "PRICE_LEVEL_FREE" => Some("Free".to_string()),
        "PRICE_LEVEL_INEXPENSIVE" => Some("$".to_string()),
        "PRICE_LEVEL_MODERATE" => Some("$$".to_string()),
        "PRICE_LEVEL_EXPENSIVE" => Some("$$$".to_string()),
        "PRICE_LEVEL_VERY_EXPENSIVE" => Some("$$$$".to_string()),
        _ => None,
    }
}

impl Place {
    fn into_enrichment(self) -> PlaceEnrichment {
        let hours = self
            .regular_opening_hours
            .as_ref()
            .filter(|h| !h.weekday_descriptions.is_empty())
            .map(|h| h.weekday_descriptions.join("; "));

        PlaceEnrichment {
            place_id: self.id,
            rating: self.rating,
            review_count: self.user_rating_count,
            types: self.types,
            website: self.website_uri,
            // International format preferred when both are present.
            phone: self.international_phone_number.or(self.national_phone_number),
            formatted_address: self.formatted_address,
            hours,
            price_range: format_price_level(self.price_level.as_deref()),
        }
    }
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different endpoint (tests use a local mock).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Search for a place by name near the given coordinates and map the
    /// first result into enrichment fields.
    ///
    /// Returns `Ok(None)` when nothing matches or the API call fails; the
    /// failure is logged, not propagated.
    pub async fn search(&self, name: &str, lat: f64, lng: f64) -> Result<Option<PlaceEnrichment>> {
        if self.api_key.is_empty() {
            warn!(
                subsystem = "enrich",
                component = "places",
                "Places API key not configured, skipping enrichment"
            );
            return Ok(None);
        }

        let request = SearchRequest {
            text_query: name.to_string(),
            location_bias: LocationBias {
                circle: Circle {
                    center: Center {
                        latitude: lat,
                        longitude: lng,
                    },
                    radius: defaults::PLACES_SEARCH_RADIUS_METERS,
                },
            },
            max_result_count: 1,
        };

        let response = match self
            .client
            .post(format!("{}/places:searchText", self.base_url))
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    subsystem = "enrich",
                    component = "places",
                    op = "search",
                    error = %e,
                    "Place search request failed"
                );
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "enrich",
                component = "places",
                op = "search",
                status = status.as_u16(),
                body = %body,
                "Place search returned an error status"
            );
            return Ok(None);
        }

        let parsed: SearchResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    subsystem = "enrich",
                    component = "places",
                    op = "search",
                    error = %e,
                    "Place search response failed to parse"
                );
                return Ok(None);
            }
        };

        let enrichment = parsed.places.into_iter().next().map(Place::into_enrichment);
        debug!(
            subsystem = "enrich",
            component = "places",
            op = "search",
            query = name,
            matched = enrichment.is_some(),
            "Place search completed"
        );
        Ok(enrichment)
    }
}
