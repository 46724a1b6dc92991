//! Filter choices for the listing: categories and the overall price range.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use crate::error::ApiError;
use crate::models::product::PriceRange;
use crate::services::notifier::{Notification, Notifier};
use crate::services::products_api::ProductsApi;

pub struct ProductOptions {
    api: Arc<dyn ProductsApi>,
    notifier: Arc<dyn Notifier>,
    categories: RwLock<Option<Vec<String>>>,
    price_range: RwLock<Option<PriceRange>>,
}

impl ProductOptions {
    pub fn new(api: Arc<dyn ProductsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            categories: RwLock::new(None),
            price_range: RwLock::new(None),
        }
    }

    pub fn categories(&self) -> Option<Vec<String>> {
        self.categories.read().clone()
    }

    pub fn price_range(&self) -> Option<PriceRange> {
        *self.price_range.read()
    }

    /// Previously loaded categories survive a failed reload.
    pub async fn load_categories(&self) -> Result<Vec<String>, ApiError> {
        match self.api.list_categories().await {
            Ok(categories) => {
                *self.categories.write() = Some(categories.clone());
                Ok(categories)
            }
            Err(err) => Err(self.report("Error fetching categories", err)),
        }
    }

    pub async fn load_price_range(&self) -> Result<PriceRange, ApiError> {
        match self.api.price_range().await {
            Ok(range) => {
                *self.price_range.write() = Some(range);
                Ok(range)
            }
            Err(err) => Err(self.report("Error fetching price range", err)),
        }
    }

    /// Load both concurrently; each failure is reported on its own.
    pub async fn load_all(&self) {
        let _ = tokio::join!(self.load_categories(), self.load_price_range());
    }

    fn report(&self, title: &str, err: ApiError) -> ApiError {
        error!(error = %err, "{}", title);
        self.notifier
            .notify(Notification::error(title, format!("{}: {}", title, err.detail())));
        err
    }
}
