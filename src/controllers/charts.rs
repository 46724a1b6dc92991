//! Dashboard chart data: items and sales per category by month.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::error::ApiError;
use crate::models::chart::{self, ChartData, ItemsByMonth, SalesByMonth};
use crate::services::notifier::{Notification, Notifier};
use crate::services::products_api::ProductsApi;

#[derive(Debug, Clone, Default)]
struct Loaded {
    categories: Option<Vec<String>>,
    sales: Option<Vec<SalesByMonth>>,
    items: Option<Vec<ItemsByMonth>>,
}

pub struct ChartsController {
    api: Arc<dyn ProductsApi>,
    notifier: Arc<dyn Notifier>,
    loaded: RwLock<Loaded>,
}

impl ChartsController {
    pub fn new(api: Arc<dyn ProductsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            loaded: RwLock::new(Loaded::default()),
        }
    }

    /// Fetch categories and both charts concurrently.
    ///
    /// Each piece is stored independently; a failure only leaves its own
    /// piece at the previous value.
    pub async fn load(&self) {
        let (categories, sales, items) = tokio::join!(
            self.api.list_categories(),
            self.api.sales_chart(),
            self.api.items_chart()
        );

        let mut loaded = Loaded::default();
        {
            let current = self.loaded.read();
            loaded.categories = self.keep_or_report(categories, "Error fetching categories", &current.categories);
            loaded.sales = self.keep_or_report(sales, "Error fetching sales chart", &current.sales);
            loaded.items = self.keep_or_report(items, "Error fetching items chart", &current.items);
        }

        info!(
            months = loaded.sales.as_ref().map_or(0, Vec::len),
            categories = loaded.categories.as_ref().map_or(0, Vec::len),
            "Loaded dashboard charts"
        );
        *self.loaded.write() = loaded;
    }

    fn keep_or_report<T: Clone>(&self, result: Result<T, ApiError>, title: &str, previous: &Option<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!(error = %err, "{}", title);
                self.notifier
                    .notify(Notification::error(title, format!("{}: {}", title, err.detail())));
                previous.clone()
            }
        }
    }

    /// Sales series, once both categories and sales data are available.
    pub fn sales_chart(&self) -> Option<ChartData> {
        let loaded = self.loaded.read();
        match (&loaded.categories, &loaded.sales) {
            (Some(categories), Some(sales)) => Some(chart::sales_chart(categories, sales)),
            _ => None,
        }
    }

    /// Item-count series, once both categories and items data are available.
    pub fn items_chart(&self) -> Option<ChartData> {
        let loaded = self.loaded.read();
        match (&loaded.categories, &loaded.items) {
            (Some(categories), Some(items)) => Some(chart::items_chart(categories, items)),
            _ => None,
        }
    }
}
