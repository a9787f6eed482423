use foodgram_types::Page;

use super::errors::Error;

pub const MAX_LIMIT: i64 = 100;

/// Validated `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>, page_size: i64) -> Result<Self, Error> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(Error::BadRequest("Invalid page".to_string()));
        }
        let limit = limit.unwrap_or_else(|| page_size.clamp(1, MAX_LIMIT));
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::BadRequest(format!(
                "Limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn wrap<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
        Page::new(count, self.page, self.limit, results)
    }
}
