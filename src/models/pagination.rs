use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

        Self {
            data,
            page: query.page(),
            limit,
            total,
            total_pages,
        }
    }
}
