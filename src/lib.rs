// src/lib.rs

use std::sync::Arc;

use config::Config;
use controllers::{
    charts::ChartsController, listing::ListingController, options::ProductOptions,
    product_editor::ProductEditor,
};
use services::{notifier::Notifier, products_api::ProductsApi};

pub mod config;
pub mod error;

pub mod models {
    pub mod chart;
    pub mod filter;
    pub mod product;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod debounce;
    pub mod notifier;
    pub mod products_api;
}

pub mod controllers {
    pub mod charts;
    pub mod listing;
    pub mod options;
    pub mod product_editor;
}

/// Everything one dashboard session needs, wired to a single backend client.
#[derive(Clone)]
pub struct AppState {
    pub listing: ListingController,
    pub options: Arc<ProductOptions>,
    pub charts: Arc<ChartsController>,
    pub editor: Arc<ProductEditor>,
}

impl AppState {
    pub fn new(config: &Config, api: Arc<dyn ProductsApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            listing: ListingController::new(Arc::clone(&api), Arc::clone(&notifier), config.debounce),
            options: Arc::new(ProductOptions::new(Arc::clone(&api), Arc::clone(&notifier))),
            charts: Arc::new(ChartsController::new(Arc::clone(&api), Arc::clone(&notifier))),
            editor: Arc::new(ProductEditor::new(api, notifier)),
        }
    }
}
