use serde::{Deserialize, Serialize};

/// Pagination envelope. `next` and `previous` are page numbers.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Page<T> {
    pub count: i64,
    pub page: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: i64, page: i64, limit: i64, results: Vec<T>) -> Self {
        let has_next = page.saturating_mul(limit) < count;
        Self {
            count,
            page,
            next: has_next.then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
