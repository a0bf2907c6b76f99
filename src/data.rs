use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchError, FetchErrorKind};
use crate::trending::{self, Item};

/// Source of per-category item listings.
pub trait TrendingService: Send + Sync {
    fn fetch_items(&self, category: &str) -> Result<Vec<Item>, FetchError>;
}

pub struct GithubTrendingService {
    client: Arc<trending::Client>,
}

impl GithubTrendingService {
    pub fn new(client: Arc<trending::Client>) -> Self {
        Self { client }
    }
}

impl TrendingService for GithubTrendingService {
    fn fetch_items(&self, category: &str) -> Result<Vec<Item>, FetchError> {
        self.client.trending(category)
    }
}

#[derive(Clone)]
enum MockResponse {
    Items(Vec<Item>),
    Fail,
    Stall(Duration, Vec<Item>),
}

/// In-memory listings keyed by category. Unknown categories return an empty list.
#[derive(Clone, Default)]
pub struct MockTrendingService {
    responses: HashMap<String, MockResponse>,
}

impl MockTrendingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, category: &str, items: Vec<Item>) -> Self {
        self.responses
            .insert(category.to_string(), MockResponse::Items(items));
        self
    }

    pub fn with_failure(mut self, category: &str) -> Self {
        self.responses
            .insert(category.to_string(), MockResponse::Fail);
        self
    }

    /// Sleeps for `delay` before answering with `items`.
    pub fn with_delay(mut self, category: &str, delay: Duration, items: Vec<Item>) -> Self {
        self.responses
            .insert(category.to_string(), MockResponse::Stall(delay, items));
        self
    }
}

impl TrendingService for MockTrendingService {
    fn fetch_items(&self, category: &str) -> Result<Vec<Item>, FetchError> {
        match self.responses.get(category) {
            Some(MockResponse::Items(items)) => Ok(items.clone()),
            Some(MockResponse::Fail) => Err(FetchError::new(
                category,
                FetchErrorKind::Http("mock transport failure".into()),
            )),
            Some(MockResponse::Stall(delay, items)) => {
                std::thread::sleep(*delay);
                Ok(items.clone())
            }
            None => Ok(Vec::new()),
        }
    }
}
