pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::{SearchService, SearchViews};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
    pub views: Arc<SearchViews>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<SearchService>) -> Self {
        let views = Arc::new(SearchViews::new(service.config()));
        Self {
            service,
            views,
            started_at: Instant::now(),
        }
    }
}
