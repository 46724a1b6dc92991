#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use reqwest::StatusCode;
use sales_monitor::error::ApiError;
use sales_monitor::models::chart::{ItemsByMonth, SalesByMonth};
use sales_monitor::models::filter::FilterState;
use sales_monitor::models::product::{PriceRange, Product, ProductPayload, ProductsList};
use sales_monitor::services::notifier::{Notification, Notifier};
use sales_monitor::services::products_api::ProductsApi;

pub const CATEGORIES: [&str; 2] = ["Shoes", "Hats"];

/// Product `id`; even ids are Shoes, odd ids are Hats, every third is sold.
pub fn product(id: i64) -> Product {
    Product {
        id,
        title: format!("Product {}", id),
        price: 10.0 * id as f64,
        description: String::new(),
        category: Some(CATEGORIES[(id % 2) as usize].to_string()),
        image: format!("https://img.example.com/{}.png", id),
        sold: id % 3 == 0,
        is_sale: false,
        date_of_sale: None,
    }
}

/// Canned reply for the next `list_products` call.
pub enum Reply {
    /// Answer from the catalog after a delay
    Delayed(Duration),
    Page(ProductsList),
    Status(StatusCode, &'static str),
    Malformed,
}

/// In-memory products backend.
///
/// Without scripted replies it serves pages from a catalog of
/// `product(1..=total)`, honouring category, sold, offset and limit.
pub struct FakeApi {
    catalog: Vec<Product>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<FilterState>>,
    fail_reference_data: AtomicBool,
}

impl FakeApi {
    pub fn new(total: i64) -> Arc<Self> {
        Arc::new(Self {
            catalog: (1..=total).map(product).collect(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fail_reference_data: AtomicBool::new(false),
        })
    }

    pub fn reply(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<FilterState> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<FilterState> {
        self.requests.lock().last().cloned()
    }

    pub fn fail_reference_data(&self, fail: bool) {
        self.fail_reference_data.store(fail, Ordering::SeqCst);
    }

    pub fn page(&self, filter: &FilterState) -> ProductsList {
        let matching: Vec<Product> = self
            .catalog
            .iter()
            .filter(|p| filter.category.is_none() || p.category == filter.category)
            .filter(|p| filter.is_sold.is_none_or(|sold| p.sold == sold))
            .cloned()
            .collect();

        ProductsList {
            count: matching.len(),
            results: matching
                .into_iter()
                .skip(filter.offset)
                .take(filter.limit)
                .collect(),
        }
    }

    fn reference_result<T>(&self, value: T) -> Result<T, ApiError> {
        if self.fail_reference_data.load(Ordering::SeqCst) {
            Err(server_error("reference data unavailable"))
        } else {
            Ok(value)
        }
    }
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.to_string(),
    }
}

#[async_trait]
impl ProductsApi for FakeApi {
    async fn list_products(&self, filter: &FilterState) -> Result<ProductsList, ApiError> {
        self.requests.lock().push(filter.clone());
        let reply = self.replies.lock().pop_front();

        match reply {
            None => Ok(self.page(filter)),
            Some(Reply::Delayed(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(self.page(filter))
            }
            Some(Reply::Page(list)) => Ok(list),
            Some(Reply::Status(status, message)) => Err(ApiError::Status {
                status,
                message: message.to_string(),
            }),
            Some(Reply::Malformed) => Err(ApiError::MalformedResponse("missing results".to_string())),
        }
    }

    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        self.reference_result(CATEGORIES.iter().map(|c| c.to_string()).collect())
    }

    async fn price_range(&self) -> Result<PriceRange, ApiError> {
        self.reference_result(PriceRange {
            min_price: 10.0,
            max_price: 10.0 * self.catalog.len() as f64,
        })
    }

    async fn sales_chart(&self) -> Result<Vec<SalesByMonth>, ApiError> {
        self.reference_result(vec![
            SalesByMonth {
                month: "2024-01".to_string(),
                sales: BTreeMap::from([("Shoes".to_string(), 120.0)]),
            },
            SalesByMonth {
                month: "2024-02".to_string(),
                sales: BTreeMap::from([("Shoes".to_string(), 60.0), ("Hats".to_string(), 30.0)]),
            },
        ])
    }

    async fn items_chart(&self) -> Result<Vec<ItemsByMonth>, ApiError> {
        self.reference_result(vec![ItemsByMonth {
            month: "2024-01".to_string(),
            items: BTreeMap::from([("Hats".to_string(), 4.0)]),
        }])
    }

    async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        if payload.title.is_empty() {
            return Err(ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                message: "title: This field may not be blank.".to_string(),
            });
        }
        Ok(Product {
            id: self.catalog.len() as i64 + 1,
            title: payload.title.clone(),
            price: payload.price,
            description: payload.description.clone(),
            category: payload.category.clone(),
            image: payload.image.clone(),
            sold: payload.sold,
            is_sale: payload.is_sale,
            date_of_sale: payload.date_of_sale,
        })
    }

    async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product, ApiError> {
        let mut product = self.create_product(payload).await?;
        product.id = id;
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        if self.catalog.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message: "Not found.".to_string(),
            })
        }
    }
}

/// Keeps every notification for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Serve `router` on an ephemeral port and return the API base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test backend crashed");
    });

    format!("http://{}/api", addr)
}
