use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::{Installment, Loan};

/// a client's view of their own debt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientWallet {
    pub client_id: String,
    pub loans: Vec<Loan>,
    /// installments of the client's loans, ordered by due date
    pub installments: Vec<Installment>,
    pub outstanding: Money,
    pub next_due: Option<Installment>,
    /// paid installments over scheduled installments, as a percentage
    pub progress: Decimal,
}

impl ClientWallet {
    pub fn for_client(client_id: &str, loans: &[Loan], installments: &[Installment]) -> Self {
        let loans: Vec<Loan> = loans
            .iter()
            .filter(|l| l.client_id == client_id)
            .cloned()
            .collect();

        let mut own: Vec<Installment> = installments
            .iter()
            .filter(|i| loans.iter().any(|l| l.id == i.loan_id))
            .cloned()
            .collect();
        own.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.number.cmp(&b.number)));

        let outstanding = own
            .iter()
            .filter(|i| !i.status.is_paid())
            .map(Installment::outstanding)
            .sum();
        let next_due = own.iter().find(|i| !i.status.is_paid()).cloned();

        let paid = own.iter().filter(|i| i.status.is_paid()).count();
        let progress = if own.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(paid) / Decimal::from(own.len()) * Decimal::ONE_HUNDRED
        };

        Self {
            client_id: client_id.to_string(),
            loans,
            installments: own,
            outstanding,
            next_due,
            progress,
        }
    }

    pub fn has_debt(&self) -> bool {
        self.outstanding.is_positive()
    }
}
