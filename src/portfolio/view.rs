/// serializable dashboard views
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::directory::{self, User};
use crate::state::{Installment, Loan, Payment};

use super::{
    collector_stats, recent_daily_totals, CollectorStats, DailyTotal, PortfolioSummary, StatsScope,
    DEFAULT_WINDOW_DAYS,
};

/// everything a manager's dashboard shows
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub summary: PortfolioSummary,
    pub display: SummaryDisplay,
    pub daily_totals: Vec<DailyTotal>,
    pub team: Vec<CollectorView>,
}

/// summary figures preformatted as pesos
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryDisplay {
    pub total_portfolio: String,
    pub collected_today: String,
    pub overdue: String,
    pub efficiency: String,
}

/// one managed user with their stats
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectorView {
    pub user_id: String,
    pub name: String,
    pub stats: CollectorStats,
}

impl DashboardView {
    /// build the dashboard for `manager`, listing the users they manage
    pub fn build(
        manager: &User,
        users: &[User],
        loans: &[Loan],
        installments: &[Installment],
        payments: &[Payment],
        now: DateTime<Utc>,
    ) -> Self {
        let summary = PortfolioSummary::compute(loans, installments, payments, now);

        let team = directory::managed_users(users, manager)
            .into_iter()
            .map(|u| CollectorView {
                user_id: u.id.clone(),
                name: u.name.clone(),
                stats: collector_stats(&StatsScope::Collector(u.id.clone()), loans, installments, now),
            })
            .collect();

        DashboardView {
            generated_at: now,
            display: SummaryDisplay {
                total_portfolio: summary.total_portfolio.to_cop(),
                collected_today: summary.collected_today.to_cop(),
                overdue: summary.overdue.to_cop(),
                efficiency: format_percentage(summary.efficiency),
            },
            daily_totals: recent_daily_totals(payments, now.date_naive(), DEFAULT_WINDOW_DAYS),
            summary,
            team,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// one decimal place, half away from zero, e.g. `84.3%`
pub fn format_percentage(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}%", rounded)
}
