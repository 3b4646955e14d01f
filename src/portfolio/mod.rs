//! Read-only portfolio metrics.
//!
//! Every function here is a pure fold over the collections it is given. Nothing is
//! cached; callers recompute on each query.

pub mod view;
pub mod wallet;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::{Installment, Loan, Payment};
use crate::types::{RouteId, UserId};

pub use view::{CollectorView, DashboardView};
pub use wallet::ClientWallet;

/// trailing window used by the dashboard chart
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// sum of total amounts across all loans
pub fn total_portfolio_value(loans: &[Loan]) -> Money {
    loans.iter().map(|l| l.total_amount).sum()
}

/// sum of payments whose UTC calendar date is `today`
pub fn collected_today(payments: &[Payment], today: NaiveDate) -> Money {
    collected_on(payments, today)
}

/// sum of outstanding amounts of unpaid installments due strictly before `now`
pub fn overdue_balance(installments: &[Installment], now: DateTime<Utc>) -> Money {
    installments
        .iter()
        .filter(|i| i.is_overdue_at(now))
        .map(|i| i.amount - i.paid_amount)
        .sum()
}

/// paid installments over all installments, as a percentage; 0 for an empty set
pub fn collection_efficiency(installments: &[Installment]) -> Decimal {
    if installments.is_empty() {
        return Decimal::ZERO;
    }
    let paid = installments.iter().filter(|i| i.status.is_paid()).count();
    percentage(Decimal::from(paid), Decimal::from(installments.len()))
}

/// which loans a stats query covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsScope {
    Collector(UserId),
    /// route-based grouping, for books where routes stand in for collectors
    Route(RouteId),
}

impl StatsScope {
    pub fn includes(&self, loan: &Loan) -> bool {
        match self {
            StatsScope::Collector(id) => &loan.collector_id == id,
            StatsScope::Route(id) => &loan.route_id == id,
        }
    }
}

/// per-collector performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorStats {
    pub total_to_collect: Money,
    pub collected: Money,
    pub overdue: Money,
    /// collected over total to collect, as a percentage
    pub efficiency: Decimal,
}

/// stats over the installments of every loan in `scope`
pub fn collector_stats(
    scope: &StatsScope,
    loans: &[Loan],
    installments: &[Installment],
    now: DateTime<Utc>,
) -> CollectorStats {
    let scoped: Vec<&Installment> = installments
        .iter()
        .filter(|i| loans.iter().any(|l| l.id == i.loan_id && scope.includes(l)))
        .collect();

    let total_to_collect: Money = scoped.iter().map(|i| i.amount).sum();
    let collected: Money = scoped
        .iter()
        .filter(|i| i.status.is_paid())
        .map(|i| i.amount)
        .sum();
    let overdue: Money = scoped
        .iter()
        .filter(|i| i.is_overdue_at(now))
        .map(|i| i.amount - i.paid_amount)
        .sum();

    let efficiency = if total_to_collect.is_positive() {
        percentage(collected.as_decimal(), total_to_collect.as_decimal())
    } else {
        Decimal::ZERO
    };

    CollectorStats {
        total_to_collect,
        collected,
        overdue,
        efficiency,
    }
}

/// one point of the collections chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub label: String,
    pub total: Money,
}

/// one total per day over the trailing `window_days` ending at `today`, oldest first
pub fn recent_daily_totals(payments: &[Payment], today: NaiveDate, window_days: u32) -> Vec<DailyTotal> {
    (0..window_days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| DailyTotal {
            date,
            label: weekday_label(date.weekday()).to_string(),
            total: collected_on(payments, date),
        })
        .collect()
}

/// headline numbers shown on the dashboard and sent to the advisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_portfolio: Money,
    pub collected_today: Money,
    pub overdue: Money,
    pub efficiency: Decimal,
}

impl PortfolioSummary {
    pub fn compute(
        loans: &[Loan],
        installments: &[Installment],
        payments: &[Payment],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            total_portfolio: total_portfolio_value(loans),
            collected_today: collected_today(payments, now.date_naive()),
            overdue: overdue_balance(installments, now),
            efficiency: collection_efficiency(installments),
        }
    }
}

fn collected_on(payments: &[Payment], day: NaiveDate) -> Money {
    payments
        .iter()
        .filter(|p| p.timestamp.date_naive() == day)
        .map(|p| p.amount)
        .sum()
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lun",
        Weekday::Tue => "Mar",
        Weekday::Wed => "Mie",
        Weekday::Thu => "Jue",
        Weekday::Fri => "Vie",
        Weekday::Sat => "Sab",
        Weekday::Sun => "Dom",
    }
}
