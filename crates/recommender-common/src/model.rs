use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    pub top_k: usize,
}

/// Ranked matches in server relevance order. An empty list is a valid answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub results: Vec<Product>,
}

/// One product row as returned by the backend.
///
/// The backend passes dataset rows through mostly untouched, so every text
/// field tolerates being absent and unknown columns (`id`, `brand`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque identifier, the join key for description generation.
    pub uniq_id: String,
    #[serde(default)]
    pub title: String,
    /// Category label; the dataset stores it as a list literal, e.g. `"['Home', 'Lamps']"`.
    #[serde(default)]
    pub categories: String,
    /// Unit price. `None` when the dataset row has no usable price.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /generate-description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateDescriptionRequest {
    pub uniq_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateDescriptionResponse {
    pub generated: String,
}

/// Point-in-time dataset summary served by `GET /analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub price_mean: Option<f64>,
    #[serde(default)]
    pub top_categories: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_brands: BTreeMap<String, u64>,
}

/// Liveness payload of `GET /test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Accepts a JSON number, a numeric string such as `"$1,299.00"`, or null.
/// Anything else maps to `None` rather than failing the whole response.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != '$' && *c != ',')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|p| p.is_finite()))
}
