use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::config::{LoanDefaults, MANUAL_ROUTE_ID};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::schedule::InstallmentSchedule;
use crate::state::Loan;
use crate::types::{LoanStatus, Periodicity, RouteId, UserId};

/// terms for a new loan
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub client_id: UserId,
    pub collector_id: UserId,
    pub route_id: RouteId,
    pub principal: Money,
    pub rate: Rate,
    pub periodicity: Periodicity,
    pub installments: u32,
    /// defaults to the time of origination
    pub start_date: Option<DateTime<Utc>>,
}

impl LoanRequest {
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    /// create the loan and its full schedule together
    pub fn originate(&self, loan_id: &str, now: DateTime<Utc>) -> Result<(Loan, InstallmentSchedule)> {
        let start_date = self.start_date.unwrap_or(now);
        let schedule = InstallmentSchedule::generate(
            loan_id,
            self.principal,
            self.rate,
            self.periodicity,
            self.installments,
            start_date,
        )?;

        let loan = Loan {
            id: loan_id.to_string(),
            client_id: self.client_id.clone(),
            collector_id: self.collector_id.clone(),
            route_id: self.route_id.clone(),
            principal: self.principal,
            total_interest: self.rate,
            total_amount: schedule.total_debt,
            periodicity: self.periodicity,
            installments_count: self.installments,
            start_date,
            status: LoanStatus::Active,
        };

        Ok((loan, schedule))
    }
}

/// new loan id, `l-` followed by eight hex digits
pub fn new_loan_id() -> String {
    format!("l-{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// builder for loan requests; rate and count fall back to the cadence presets
#[derive(Debug, Default)]
pub struct LoanBuilder {
    client_id: Option<UserId>,
    collector_id: Option<UserId>,
    route_id: Option<RouteId>,
    principal: Option<Money>,
    rate: Option<Rate>,
    periodicity: Option<Periodicity>,
    installments: Option<u32>,
    start_date: Option<DateTime<Utc>>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client_id: impl Into<UserId>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn collector(mut self, collector_id: impl Into<UserId>) -> Self {
        self.collector_id = Some(collector_id.into());
        self
    }

    pub fn route(mut self, route_id: impl Into<RouteId>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    pub fn amount(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    /// rate as typed in the collector form, a whole percentage
    pub fn rate_percent(self, percent: u32) -> Self {
        self.rate(Rate::from_percentage(percent))
    }

    pub fn periodicity(mut self, periodicity: Periodicity) -> Self {
        self.periodicity = Some(periodicity);
        self
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.installments = Some(count);
        self
    }

    pub fn start_date(mut self, date: DateTime<Utc>) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn build(self) -> Result<LoanRequest> {
        let client_id = self.client_id.ok_or(LedgerError::InvalidLoanTerms {
            message: "client required".to_string(),
        })?;

        let collector_id = self.collector_id.ok_or(LedgerError::InvalidLoanTerms {
            message: "collector required".to_string(),
        })?;

        let principal = self.principal.ok_or(LedgerError::InvalidLoanTerms {
            message: "amount required".to_string(),
        })?;

        let periodicity = self.periodicity.unwrap_or(Periodicity::Daily);
        let defaults = LoanDefaults::for_periodicity(periodicity);

        Ok(LoanRequest {
            client_id,
            collector_id,
            route_id: self.route_id.unwrap_or_else(|| MANUAL_ROUTE_ID.to_string()),
            principal,
            rate: self.rate.unwrap_or(defaults.rate),
            periodicity,
            installments: self.installments.unwrap_or(defaults.installments),
            start_date: self.start_date,
        })
    }

    /// build and originate immediately, stamping with the provider's clock
    pub fn originate_with_time(self, time: &SafeTimeProvider) -> Result<(Loan, InstallmentSchedule)> {
        let request = self.build()?;
        request.originate(&new_loan_id(), time.now())
    }
}
