//! Field collection: confirming payments and building a collector's route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::{find_user, User};
use crate::errors::{LedgerError, Result};
use crate::state::{Installment, Loan, Payment};
use crate::types::PaymentMethod;

/// settle `installment` in full
///
/// Returns the payment record (full amount, manual, stamped `now`) and the
/// installment marked paid. Settling an already paid installment is rejected.
pub fn confirm_payment(
    installment: &Installment,
    collector_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(Payment, Installment)> {
    if installment.status.is_paid() {
        return Err(LedgerError::InstallmentAlreadySettled {
            id: installment.id.clone(),
            paid_amount: installment.paid_amount,
        });
    }

    let payment = Payment {
        id: format!("p-{}", Uuid::new_v4().simple()),
        installment_id: installment.id.clone(),
        amount: installment.amount,
        method: PaymentMethod::Manual,
        evidence: None,
        timestamp: now,
        collector_id: collector_id.map(str::to_string),
    };

    Ok((payment, installment.settled()))
}

/// one unpaid installment on a collector's route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub installment: Installment,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
}

impl RouteStop {
    pub fn reminder(&self) -> String {
        reminder_message(&self.installment, self.client_name.as_deref().unwrap_or("Cliente"))
    }
}

/// unpaid installments of the collector's loans, earliest due first
pub fn pending_route(
    collector_id: &str,
    loans: &[Loan],
    installments: &[Installment],
    users: &[User],
) -> Vec<RouteStop> {
    let mut stops: Vec<RouteStop> = installments
        .iter()
        .filter(|i| !i.status.is_paid())
        .filter_map(|i| {
            let loan = loans.iter().find(|l| l.id == i.loan_id)?;
            if loan.collector_id != collector_id {
                return None;
            }
            let client = find_user(users, &loan.client_id);
            Some(RouteStop {
                installment: i.clone(),
                client_id: Some(loan.client_id.clone()),
                client_name: client.map(|c| c.name.clone()),
            })
        })
        .collect();

    stops.sort_by(|a, b| a.installment.due_date.cmp(&b.installment.due_date));
    stops
}

/// payment reminder sent to a client
pub fn reminder_message(installment: &Installment, client_name: &str) -> String {
    format!(
        "Notificación enviada a {}: Recuerda pagar tu cuota de {} antes del {}.",
        client_name,
        installment.amount.to_cop(),
        installment.due_date.format("%d/%m/%Y"),
    )
}
