//! Create, update and delete products.
//!
//! Kept apart from the listing: a successful write does not touch listing
//! state; callers refresh the listing themselves if they want to.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::ApiError;
use crate::models::product::{Product, ProductPayload};
use crate::services::notifier::{Notification, Notifier};
use crate::services::products_api::ProductsApi;

pub struct ProductEditor {
    api: Arc<dyn ProductsApi>,
    notifier: Arc<dyn Notifier>,
}

impl ProductEditor {
    pub fn new(api: Arc<dyn ProductsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    pub async fn add(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let result = self.api.create_product(payload).await;
        self.report(result, "Product added", "Error adding product")
    }

    pub async fn update(&self, id: i64, payload: &ProductPayload) -> Result<Product, ApiError> {
        let result = self.api.update_product(id, payload).await;
        self.report(result, "Product updated", "Error updating product")
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let result = self.api.delete_product(id).await;
        self.report(result, "Product deleted", "Error deleting product")
    }

    fn report<T>(&self, result: Result<T, ApiError>, success: &str, failure: &str) -> Result<T, ApiError> {
        match &result {
            Ok(_) => {
                info!("{}", success);
                self.notifier.notify(Notification::success(success, success));
            }
            Err(err) => {
                error!(error = %err, "{}", failure);
                self.notifier
                    .notify(Notification::error(failure, format!("{}: {}", failure, err.detail())));
            }
        }
        result
    }
}
