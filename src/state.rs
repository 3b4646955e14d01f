use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{
    InstallmentId, InstallmentStatus, LoanId, LoanStatus, PaymentId, PaymentMethod, Periodicity,
    RouteId, UserId,
};

/// a loan as originated by a collector
///
/// `total_amount` is fixed at origination (principal plus the flat rate over the
/// principal) and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,
    pub client_id: UserId,
    pub collector_id: UserId,
    pub route_id: RouteId,
    pub principal: Money,
    pub total_interest: Rate,
    pub total_amount: Money,
    pub periodicity: Periodicity,
    pub installments_count: u32,
    pub start_date: DateTime<Utc>,
    pub status: LoanStatus,
}

impl Loan {
    /// principal + principal * rate
    pub fn total_debt(principal: Money, rate: Rate) -> Money {
        principal + principal.apply_rate(rate)
    }

    /// flat interest charged over the term
    pub fn interest_amount(&self) -> Money {
        self.total_amount - self.principal
    }
}

/// one scheduled installment of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
    pub paid_amount: Money,
    pub status: InstallmentStatus,
}

impl Installment {
    /// `inst-{loan_id}-{number}`
    pub fn derive_id(loan_id: &str, number: u32) -> InstallmentId {
        format!("inst-{}-{}", loan_id, number)
    }

    /// amount still owed on this installment
    pub fn outstanding(&self) -> Money {
        (self.amount - self.paid_amount).max(Money::ZERO)
    }

    /// not paid and due strictly before `now`
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_paid() && self.due_date < now
    }

    /// copy of this installment fully settled
    pub fn settled(&self) -> Self {
        Self {
            paid_amount: self.amount,
            status: InstallmentStatus::Paid,
            ..self.clone()
        }
    }
}

/// a recorded collection against an installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub installment_id: InstallmentId,
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default, rename = "evidenceUrl", skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_id: Option<UserId>,
}
