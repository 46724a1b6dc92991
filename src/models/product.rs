//! Product entities as served by the products backend.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A single product row.
///
/// Read-only for the listing; writes go through [`ProductPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    /// Decimal fields may arrive as JSON strings ("12.50") or numbers
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub sold: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub date_of_sale: Option<NaiveDate>,
}

/// One page of the products listing.
///
/// Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductsList {
    /// Total rows matching the filter, across all pages
    pub count: usize,
    pub results: Vec<Product>,
}

impl ProductsList {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(deserialize_with = "deserialize_price")]
    pub min_price: f64,
    #[serde(deserialize_with = "deserialize_price")]
    pub max_price: f64,
}

/// Body for create/update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub image: String,
    pub is_sale: bool,
    pub sold: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_sale: Option<NaiveDate>,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            image: product.image.clone(),
            is_sale: product.is_sale,
            sold: product.sold,
            date_of_sale: product.date_of_sale,
        }
    }
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid price: {:?}", s))),
    }
}
