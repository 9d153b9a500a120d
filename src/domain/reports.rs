//! Read models for the admin dashboard

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;
use crate::domain::aggregates::{Order, OrderStatus, Product};
use crate::domain::value_objects::Money;

pub const TOP_PRODUCTS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardQuery {
    /// Days of daily revenue to report, ending today.
    pub days: u32,
    pub low_stock_threshold: u32,
}

impl Default for DashboardQuery {
    fn default() -> Self { Self { days: 30, low_stock_threshold: 5 } }
}

impl DashboardQuery {
    pub fn since(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - Duration::days(i64::from(self.days.saturating_sub(1)))).date_naive()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub revenue: Money,
    pub order_count: u64,
    pub customer_count: u64,
    pub product_count: u64,
    pub orders_by_status: BTreeMap<String, u64>,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<LowStockProduct>,
    pub daily_revenue: Vec<DailyRevenue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct { pub product_id: Uuid, pub name: String, pub units: u64, pub revenue: Money }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct { pub product_id: Uuid, pub name: String, pub stock: u32 }

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue { pub day: NaiveDate, pub revenue: Money, pub orders: u64 }

/// Every status appears in the breakdown, zero or not.
pub fn empty_status_breakdown() -> BTreeMap<String, u64> {
    OrderStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect()
}

/// Fills gaps so the series has one entry per day from `since` through `until`.
pub fn fill_days(since: NaiveDate, until: NaiveDate, mut known: HashMap<NaiveDate, (Money, u64)>) -> Vec<DailyRevenue> {
    since
        .iter_days()
        .take_while(|d| *d <= until)
        .map(|day| {
            let (revenue, orders) = known.remove(&day).unwrap_or((Money::ZERO, 0));
            DailyRevenue { day, revenue, orders }
        })
        .collect()
}

impl Dashboard {
    /// Builds the dashboard from full order and product lists.
    pub fn compute(orders: &[Order], products: &[Product], customer_count: u64, q: &DashboardQuery, now: DateTime<Utc>) -> Self {
        let counted: Vec<&Order> = orders.iter().filter(|o| o.status != OrderStatus::Cancelled).collect();
        let revenue = counted.iter().map(|o| o.total).sum();

        let mut orders_by_status = empty_status_breakdown();
        for o in orders {
            *orders_by_status.entry(o.status.as_str().to_string()).or_default() += 1;
        }

        let mut sold: HashMap<Uuid, TopProduct> = HashMap::new();
        for item in counted.iter().flat_map(|o| o.items.iter()) {
            let entry = sold.entry(item.product_id).or_insert_with(|| TopProduct {
                product_id: item.product_id, name: item.product_name.clone(), units: 0, revenue: Money::ZERO,
            });
            entry.units += u64::from(item.quantity);
            entry.revenue = entry.revenue + item.line_total();
        }
        let mut top_products: Vec<TopProduct> = sold.into_values().collect();
        top_products.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.name.cmp(&b.name)));
        top_products.truncate(TOP_PRODUCTS);

        let active: Vec<&Product> = products.iter().filter(|p| p.active).collect();
        let mut low_stock: Vec<LowStockProduct> = active
            .iter()
            .filter(|p| p.stock.value() <= q.low_stock_threshold)
            .map(|p| LowStockProduct { product_id: p.id, name: p.name.clone(), stock: p.stock.value() })
            .collect();
        low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));

        let since = q.since(now);
        let mut per_day: HashMap<NaiveDate, (Money, u64)> = HashMap::new();
        for o in counted.iter().filter(|o| o.created_at.date_naive() >= since) {
            let slot = per_day.entry(o.created_at.date_naive()).or_insert((Money::ZERO, 0));
            slot.0 = slot.0 + o.total;
            slot.1 += 1;
        }

        Self {
            revenue,
            order_count: orders.len() as u64,
            customer_count,
            product_count: active.len() as u64,
            orders_by_status,
            top_products,
            low_stock,
            daily_revenue: fill_days(since, now.date_naive(), per_day),
        }
    }
}
