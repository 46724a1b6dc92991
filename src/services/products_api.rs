//! Products backend client.
//!
//! [`ProductsApi`] is the seam the controllers talk to; [`HttpProductsApi`]
//! is the reqwest implementation against the REST backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::chart::{ItemsByMonth, SalesByMonth};
use crate::models::filter::FilterState;
use crate::models::product::{PriceRange, Product, ProductPayload, ProductsList};

const CATEGORIES_KEY: &str = "categories";
const PRICE_RANGE_KEY: &str = "price_range";

#[async_trait]
pub trait ProductsApi: Send + Sync {
    async fn list_products(&self, filter: &FilterState) -> Result<ProductsList, ApiError>;
    async fn list_categories(&self) -> Result<Vec<String>, ApiError>;
    async fn price_range(&self) -> Result<PriceRange, ApiError>;
    async fn sales_chart(&self) -> Result<Vec<SalesByMonth>, ApiError>;
    async fn items_chart(&self) -> Result<Vec<ItemsByMonth>, ApiError>;
    async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError>;
    async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product, ApiError>;
    async fn delete_product(&self, id: i64) -> Result<(), ApiError>;
}

/// Supplies the bearer credential attached to every request.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed, pre-issued token.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct HttpProductsApi {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    categories: Cache<&'static str, Vec<String>>,
    price_ranges: Cache<&'static str, PriceRange>,
}

impl HttpProductsApi {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>, cache_ttl: Duration) -> Self {
        Self::with_client(Client::new(), base_url, tokens, cache_ttl)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        cache_ttl: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            tokens,
            categories: Cache::builder().max_capacity(1).time_to_live(cache_ttl).build(),
            price_ranges: Cache::builder().max_capacity(1).time_to_live(cache_ttl).build(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/products/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("accept", "application/json");
        match self.tokens.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.request(Method::GET, &url).send().await?;
        read_json(response).await
    }

    /// Drop cached reference data; writes can change both categories and price range.
    pub fn invalidate_cache(&self) {
        self.categories.invalidate_all();
        self.price_ranges.invalidate_all();
        debug!("Invalidated products reference data cache");
    }
}

#[async_trait]
impl ProductsApi for HttpProductsApi {
    async fn list_products(&self, filter: &FilterState) -> Result<ProductsList, ApiError> {
        let url = self.url("list");
        let response = self
            .request(Method::GET, &url)
            .query(&filter.to_query())
            .send()
            .await?;

        let body: Value = read_json(response).await?;
        if body.get("results").is_none_or(|r| !r.is_array()) {
            return Err(ApiError::MalformedResponse(
                server_message(&body).unwrap_or_else(|| "missing results".to_string()),
            ));
        }

        let list: ProductsList = serde_json::from_value(body)?;
        debug!(
            count = list.count,
            rows = list.results.len(),
            offset = filter.offset,
            limit = filter.limit,
            "Fetched products page"
        );
        Ok(list)
    }

    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        if let Some(cached) = self.categories.get(CATEGORIES_KEY).await {
            debug!("Cache hit for categories");
            return Ok(cached);
        }

        let categories: Vec<String> = self.get_json("categories").await?;
        info!("Fetched {} categories", categories.len());
        self.categories.insert(CATEGORIES_KEY, categories.clone()).await;
        Ok(categories)
    }

    async fn price_range(&self) -> Result<PriceRange, ApiError> {
        if let Some(cached) = self.price_ranges.get(PRICE_RANGE_KEY).await {
            debug!("Cache hit for price range");
            return Ok(cached);
        }

        let range: PriceRange = self.get_json("price_range").await?;
        self.price_ranges.insert(PRICE_RANGE_KEY, range).await;
        Ok(range)
    }

    async fn sales_chart(&self) -> Result<Vec<SalesByMonth>, ApiError> {
        self.get_json("sales_chart").await
    }

    async fn items_chart(&self) -> Result<Vec<ItemsByMonth>, ApiError> {
        self.get_json("items_chart").await
    }

    async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let url = format!("{}/products", self.base_url);
        let response = self.request(Method::POST, &url).json(payload).send().await?;
        let product: Product = read_json(response).await?;
        info!(id = product.id, title = %product.title, "Created product");
        self.invalidate_cache();
        Ok(product)
    }

    async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product, ApiError> {
        let url = self.url(&id.to_string());
        let response = self.request(Method::PUT, &url).json(payload).send().await?;
        let product: Product = read_json(response).await?;
        info!(id, "Updated product");
        self.invalidate_cache();
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&id.to_string());
        let response = self.request(Method::DELETE, &url).send().await?;
        ensure_success(response).await?;
        info!(id, "Deleted product");
        self.invalidate_cache();
        Ok(())
    }
}

/// Pull a human-readable error out of a JSON body (`message` or `detail`).
pub(crate) fn server_message(body: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| server_message(&body))
        .unwrap_or(text);
    Err(ApiError::Status { status, message })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
