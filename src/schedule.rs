use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::state::{Installment, Loan};
use crate::types::{InstallmentStatus, Periodicity};

/// installment schedule for one loan
#[derive(Debug, Clone)]
pub struct InstallmentSchedule {
    pub loan_id: String,
    pub principal: Money,
    pub total_rate: Rate,
    pub periodicity: Periodicity,
    pub start_date: DateTime<Utc>,
    pub total_debt: Money,
    pub installment_amount: Money,
    pub installments: Vec<Installment>,
}

impl InstallmentSchedule {
    /// generate the full schedule
    ///
    /// Every installment charges `ceil(total_debt / count)`; there is no final
    /// remainder adjustment, so the schedule may collect up to `count - 1` units
    /// more than the debt (see [`InstallmentSchedule::rounding_excess`]).
    pub fn generate(
        loan_id: &str,
        principal: Money,
        total_rate: Rate,
        periodicity: Periodicity,
        count: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        validate_terms(principal, total_rate, periodicity, count, start_date)?;

        let total_debt = Loan::total_debt(principal, total_rate);
        let installment_amount =
            Money::from_decimal((total_debt.as_decimal() / Decimal::from(count)).ceil());

        let mut installments = Vec::with_capacity(count as usize);
        for number in 1..=count {
            let due_date = periodicity.due_date(start_date, number).ok_or_else(|| {
                LedgerError::InvalidLoanTerms {
                    message: format!(
                        "due date of installment {} is out of calendar range",
                        number
                    ),
                }
            })?;

            installments.push(Installment {
                id: Installment::derive_id(loan_id, number),
                loan_id: loan_id.to_string(),
                number,
                due_date,
                amount: installment_amount,
                paid_amount: Money::ZERO,
                status: InstallmentStatus::Pending,
            });
        }

        Ok(Self {
            loan_id: loan_id.to_string(),
            principal,
            total_rate,
            periodicity,
            start_date,
            total_debt,
            installment_amount,
            installments,
        })
    }

    /// sum of all installment amounts
    pub fn total_scheduled(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// amount collected above the debt because of per-installment rounding
    pub fn rounding_excess(&self) -> Money {
        self.total_scheduled() - self.total_debt
    }

    /// get installment by sequence number (1-based)
    pub fn get(&self, number: u32) -> Option<&Installment> {
        number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    /// due date of the last installment
    pub fn maturity_date(&self) -> Option<DateTime<Utc>> {
        self.installments.last().map(|i| i.due_date)
    }

    pub fn into_installments(self) -> Vec<Installment> {
        self.installments
    }
}

/// generate installments for a loan
pub fn generate_schedule(
    loan_id: &str,
    principal: Money,
    total_rate: Rate,
    periodicity: Periodicity,
    count: u32,
    start_date: DateTime<Utc>,
) -> Result<Vec<Installment>> {
    InstallmentSchedule::generate(loan_id, principal, total_rate, periodicity, count, start_date)
        .map(InstallmentSchedule::into_installments)
}

fn validate_terms(
    principal: Money,
    total_rate: Rate,
    periodicity: Periodicity,
    count: u32,
    start_date: DateTime<Utc>,
) -> Result<()> {
    if !principal.is_positive() {
        return Err(LedgerError::InvalidLoanTerms {
            message: format!("principal must be positive, got {}", principal),
        });
    }
    if total_rate.is_negative() {
        return Err(LedgerError::InvalidLoanTerms {
            message: format!("rate must not be negative, got {}", total_rate),
        });
    }
    if count == 0 {
        return Err(LedgerError::InvalidLoanTerms {
            message: "installment count must be at least 1".to_string(),
        });
    }
    // due dates only grow, so a valid last date covers every earlier one
    if periodicity.due_date(start_date, count).is_none() {
        return Err(LedgerError::InvalidLoanTerms {
            message: format!("{} installments run past the calendar range", count),
        });
    }
    Ok(())
}
