//! Page-number pagination over bounded result sets

use crate::error::{AppError, Result};
use crate::search::config::SearchConfig;
use crate::search::filters::RequestParams;
use serde::Serialize;

pub const INVALID_PAGE: &str = "Invalid page.";

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Read `page` and `page_size`. A bad `page` is an error; a bad `page_size`
    /// falls back to the configured default and is capped at the configured max.
    pub fn from_params(params: &RequestParams, config: &SearchConfig) -> Result<Self> {
        let page = match params.get("page") {
            None => 1,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(AppError::NotFound(INVALID_PAGE.to_string())),
            },
        };

        let page_size = params
            .get("page_size")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(config.max_page_size))
            .unwrap_or(config.page_size);

        Ok(Self { page, page_size })
    }

    /// Number of pages for `total` results; an empty result set still has page 1
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// `[start, end)` of this page, or `Invalid page.` past the last page
    pub fn window(&self, total: usize) -> Result<(usize, usize)> {
        if self.page > self.page_count(total) {
            return Err(AppError::NotFound(INVALID_PAGE.to_string()));
        }
        let start = (self.page - 1) * self.page_size;
        Ok((start, start + self.page_size))
    }
}

/// Response envelope for one page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: usize,
    pub page_size: usize,
    pub page: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: usize, results: Vec<T>) -> Self {
        let start = (request.page - 1) * request.page_size;
        let (first_index, last_index) = if results.is_empty() {
            (0, 0)
        } else {
            (start + 1, start + results.len())
        };

        Self {
            total,
            page_size: request.page_size,
            page: request.page,
            first_index,
            last_index,
            next: (request.page < request.page_count(total)).then(|| request.page + 1),
            previous: (request.page > 1).then(|| request.page - 1),
            results,
        }
    }
}
