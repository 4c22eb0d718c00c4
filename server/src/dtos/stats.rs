//! Admin dashboard DTO

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DashboardStatsDTO {
    pub users_by_role: BTreeMap<String, i64>,
    pub orders_by_status: BTreeMap<String, i64>,
    pub pending_applications: i64,
    pub appointments_today: i64,
    pub delivered_revenue_cents: i64,
}
