use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentId, LoanId, PaymentId, Periodicity, Role, UserId};

/// events emitted by the loan book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoanOriginated {
        loan_id: LoanId,
        client_id: UserId,
        collector_id: UserId,
        principal: Money,
        total_amount: Money,
        periodicity: Periodicity,
        installments: u32,
        timestamp: DateTime<Utc>,
    },
    LoanRemoved {
        loan_id: LoanId,
        installments_removed: usize,
        timestamp: DateTime<Utc>,
    },
    PaymentConfirmed {
        payment_id: PaymentId,
        installment_id: InstallmentId,
        loan_id: LoanId,
        amount: Money,
        collector_id: Option<UserId>,
        timestamp: DateTime<Utc>,
    },
    UserRegistered {
        user_id: UserId,
        role: Role,
        parent_id: Option<UserId>,
        timestamp: DateTime<Utc>,
    },
    UserUpdated {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    SnapshotSaved {
        collections: usize,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
///
/// Events accumulate until drained with [`EventStore::take_events`].
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// drain every pending event, oldest first
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
