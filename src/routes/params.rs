use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Status;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppointmentListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<Status>,
    pub date: Option<NaiveDate>,
}
