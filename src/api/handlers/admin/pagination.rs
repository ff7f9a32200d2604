//! Page/page-size handling shared by the list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Validated paging request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Parse raw query values. Non-numeric input falls back to the defaults,
    /// `page < 1` becomes 1, `per_page < 1` becomes the default and
    /// `per_page` is capped.
    #[must_use]
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Self {
        let page = parse_or(page, DEFAULT_PAGE).max(1);
        let per_page = match parse_or(per_page, DEFAULT_PER_PAGE) {
            value if value < 1 => DEFAULT_PER_PAGE,
            value => value.min(MAX_PER_PAGE),
        };
        Self { page, per_page }
    }

    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> i64 {
        self.per_page
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let pages = (total + request.per_page - 1) / request.per_page;
        Self {
            page: request.page,
            pages,
            per_page: request.per_page,
            total,
            has_next: request.page < pages,
            has_prev: request.page > 1,
        }
    }
}
