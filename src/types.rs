use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};

/// loan identifier (e.g. `l-3f9a1c2b`)
pub type LoanId = String;

/// installment identifier, derived from the loan id and sequence number
pub type InstallmentId = String;

/// payment identifier
pub type PaymentId = String;

/// user identifier
pub type UserId = String;

/// route identifier
pub type RouteId = String;

/// installment cadence; wire names match the stored snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    #[serde(rename = "DIARIO")]
    Daily,
    #[serde(rename = "SEMANAL")]
    Weekly,
    /// every fourteen days
    #[serde(rename = "CATORCENAL")]
    Biweekly,
    #[serde(rename = "MENSUAL")]
    Monthly,
}

impl Periodicity {
    pub const ALL: [Periodicity; 4] = [
        Periodicity::Daily,
        Periodicity::Weekly,
        Periodicity::Biweekly,
        Periodicity::Monthly,
    ];

    /// due date of the `n`-th installment counted from `start`
    ///
    /// Day-based cadences step whole days; monthly steps calendar months and clamps
    /// the day of month to the last valid day (Jan 31 + 1 month is Feb 29 in 2024).
    /// Returns `None` when the result falls outside chrono's representable range.
    pub fn due_date(&self, start: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
        match self {
            Periodicity::Daily => start.checked_add_days(Days::new(u64::from(n))),
            Periodicity::Weekly => start.checked_add_days(Days::new(u64::from(n) * 7)),
            Periodicity::Biweekly => start.checked_add_days(Days::new(u64::from(n) * 14)),
            Periodicity::Monthly => start.checked_add_months(Months::new(n)),
        }
    }
}

/// loan status; stored as given, never transitioned by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "VENCIDO")]
    Overdue,
    #[serde(rename = "PAGADO")]
    Paid,
    #[serde(rename = "PENDIENTE")]
    Pending,
}

/// installment status
///
/// Only `Pending` and `Paid` are ever assigned. `Partial` and `Overdue` are accepted
/// from stored snapshots; overdue-ness is otherwise derived at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "PAGADO")]
    Paid,
    #[serde(rename = "PARCIAL")]
    Partial,
    #[serde(rename = "VENCIDO")]
    Overdue,
}

impl InstallmentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, InstallmentStatus::Paid)
    }
}

/// how a payment was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// cash collected in the field and confirmed by the collector
    #[serde(rename = "MANUAL")]
    Manual,
    /// online payment gateway
    #[serde(rename = "PASARELA")]
    Gateway,
}

/// position in the organizational hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "DUEÑO")]
    Owner,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
    #[serde(rename = "RECAUDADOR")]
    Collector,
    #[serde(rename = "CLIENTE")]
    Client,
    #[serde(rename = "SOPORTE")]
    Support,
}
