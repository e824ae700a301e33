use serde::Deserialize;

/// Query-string pagination shared by the list endpoints. Pages are 1-based;
/// each endpoint supplies its own default page size.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Pagination {
    page: Option<u64>,
    limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: u64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn limit(&self, default: i64) -> i64 {
        match self.limit {
            Some(l) if l > 0 => l,
            _ => default,
        }
    }

    pub fn skip(&self, default_limit: i64) -> u64 {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        (page - 1) * self.limit(default_limit) as u64
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
