//! Back-office listings and dashboard analytics.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::reports::{Dashboard, DashboardQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{OrderQuery, Page, Paging};

pub const MAX_DASHBOARD_DAYS: u32 = 365;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_orders(
    State(s): State<AppState>,
    AdminUser(_): AdminUser,
    Query(p): Query<OrderListParams>,
) -> Result<Json<Page<Order>>> {
    let status = p.status.as_deref().map(|s| s.trim().to_ascii_uppercase().parse::<OrderStatus>()).transpose()?;
    let query = OrderQuery { paging: Paging::new(p.page, p.per_page), status };
    Ok(Json(s.store.list_orders(&query).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub days: Option<u32>,
    pub low_stock: Option<u32>,
}

impl TryFrom<DashboardParams> for DashboardQuery {
    type Error = AppError;

    fn try_from(p: DashboardParams) -> Result<Self> {
        let defaults = DashboardQuery::default();
        let days = p.days.unwrap_or(defaults.days);
        if !(1..=MAX_DASHBOARD_DAYS).contains(&days) {
            return Err(AppError::BadRequest(format!("days must be between 1 and {MAX_DASHBOARD_DAYS}")));
        }
        Ok(Self { days, low_stock_threshold: p.low_stock.unwrap_or(defaults.low_stock_threshold) })
    }
}

pub async fn dashboard(
    State(s): State<AppState>,
    AdminUser(_): AdminUser,
    Query(p): Query<DashboardParams>,
) -> Result<Json<Dashboard>> {
    let query = DashboardQuery::try_from(p)?;
    Ok(Json(s.store.dashboard(&query).await?))
}
