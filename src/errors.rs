use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InstallmentId, LoanId, Role, UserId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("loan not found: {id}")]
    UnknownLoan {
        id: LoanId,
    },

    #[error("installment not found: {id}")]
    UnknownInstallment {
        id: InstallmentId,
    },

    #[error("user not found: {id}")]
    UnknownUser {
        id: UserId,
    },

    #[error("installment already settled: {id} (paid {paid_amount})")]
    InstallmentAlreadySettled {
        id: InstallmentId,
        paid_amount: Money,
    },

    #[error("invalid credentials for role {role:?}")]
    InvalidCredentials {
        role: Role,
    },

    #[error("advisory unavailable: {message}")]
    AdvisoryUnavailable {
        message: String,
    },

    #[error("storage error on key {key}: {message}")]
    Storage {
        key: String,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
