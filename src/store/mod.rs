//! The loan book: the five collections, their snapshot persistence and the
//! operations that change them.

pub mod seed;
pub mod storage;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::advisory::{Advice, AdvisoryClient, Advisor};
use crate::collection::{self, RouteStop};
use crate::directory::{self, Route, User};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::origination::{new_loan_id, LoanRequest};
use crate::portfolio::{
    self, ClientWallet, CollectorStats, DailyTotal, DashboardView, PortfolioSummary, StatsScope,
    DEFAULT_WINDOW_DAYS,
};
use crate::state::{Installment, Loan, Payment};
use crate::types::Role;

pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};

/// persisted collections and their storage keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Routes,
    Loans,
    Installments,
    Payments,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Routes,
        Collection::Loans,
        Collection::Installments,
        Collection::Payments,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Routes => "routes",
            Collection::Loans => "loans",
            Collection::Installments => "installments",
            Collection::Payments => "payments",
        }
    }
}

/// full state of the book at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub routes: Vec<Route>,
    pub loans: Vec<Loan>,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
}

impl Snapshot {
    /// load every collection; keys never written fall back to the seed dataset
    ///
    /// Loans and installments are seeded as a pair: only when neither key was ever
    /// written. If just one of them is stored, the other loads empty, so a seed loan
    /// is never left without its schedule and stored loans never get the seed one.
    pub fn load<S: SnapshotStorage>(storage: &S, now: DateTime<Utc>) -> Result<Self> {
        let users = read_collection(storage, Collection::Users)?;
        let routes = read_collection(storage, Collection::Routes)?;
        let loans = read_collection(storage, Collection::Loans)?;
        let installments = read_collection(storage, Collection::Installments)?;
        let payments = read_collection(storage, Collection::Payments)?;

        let (loans, installments) = match (loans, installments) {
            (None, None) => seed::loan_book(now)?,
            (loans, installments) => (loans.unwrap_or_default(), installments.unwrap_or_default()),
        };

        Ok(Self {
            users: users.unwrap_or_else(seed::users),
            routes: routes.unwrap_or_else(seed::routes),
            loans,
            installments,
            payments: payments.unwrap_or_default(),
        })
    }

    /// overwrite every collection in storage
    pub fn save<S: SnapshotStorage>(&self, storage: &mut S) -> Result<()> {
        write_collection(storage, Collection::Users, &self.users)?;
        write_collection(storage, Collection::Routes, &self.routes)?;
        write_collection(storage, Collection::Loans, &self.loans)?;
        write_collection(storage, Collection::Installments, &self.installments)?;
        write_collection(storage, Collection::Payments, &self.payments)?;
        Ok(())
    }
}

fn read_collection<S, T>(storage: &S, collection: Collection) -> Result<Option<Vec<T>>>
where
    S: SnapshotStorage,
    T: DeserializeOwned,
{
    match storage.read(collection.key())? {
        Some(raw) => {
            let items: Vec<T> = serde_json::from_str(&raw)?;
            debug!(key = collection.key(), count = items.len(), "collection loaded");
            Ok(Some(items))
        }
        None => {
            info!(key = collection.key(), "collection not stored, using seed data");
            Ok(None)
        }
    }
}

fn write_collection<S, T>(storage: &mut S, collection: Collection, items: &[T]) -> Result<()>
where
    S: SnapshotStorage,
    T: Serialize,
{
    let raw = serde_json::to_string(items)?;
    storage.write(collection.key(), &raw)
}

/// owner of all collections; every change is written back as a full snapshot
pub struct LoanBook<S: SnapshotStorage> {
    storage: S,
    time: SafeTimeProvider,
    state: Snapshot,
    events: EventStore,
}

impl<S: SnapshotStorage> LoanBook<S> {
    /// load the book from storage
    pub fn open(storage: S, time: SafeTimeProvider) -> Result<Self> {
        let state = Snapshot::load(&storage, time.now())?;
        info!(
            users = state.users.len(),
            loans = state.loans.len(),
            installments = state.installments.len(),
            payments = state.payments.len(),
            "loan book opened"
        );
        Ok(Self {
            storage,
            time,
            state,
            events: EventStore::new(),
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn users(&self) -> &[User] {
        &self.state.users
    }

    pub fn routes(&self) -> &[Route] {
        &self.state.routes
    }

    pub fn loans(&self) -> &[Loan] {
        &self.state.loans
    }

    pub fn installments(&self) -> &[Installment] {
        &self.state.installments
    }

    pub fn payments(&self) -> &[Payment] {
        &self.state.payments
    }

    pub fn loan(&self, id: &str) -> Result<&Loan> {
        self.state
            .loans
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| LedgerError::UnknownLoan { id: id.to_string() })
    }

    pub fn installment(&self, id: &str) -> Result<&Installment> {
        self.state
            .installments
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| LedgerError::UnknownInstallment { id: id.to_string() })
    }

    pub fn user(&self, id: &str) -> Result<&User> {
        directory::find_user(&self.state.users, id)
            .ok_or_else(|| LedgerError::UnknownUser { id: id.to_string() })
    }

    /// installments of one loan in sequence order
    pub fn schedule_of(&self, loan_id: &str) -> Vec<&Installment> {
        let mut schedule: Vec<&Installment> = self
            .state
            .installments
            .iter()
            .filter(|i| i.loan_id == loan_id)
            .collect();
        schedule.sort_by_key(|i| i.number);
        schedule
    }

    pub fn replace_users(&mut self, users: Vec<User>) -> Result<()> {
        let next = Snapshot {
            users,
            ..self.state.clone()
        };
        self.commit(next, None)
    }

    pub fn replace_routes(&mut self, routes: Vec<Route>) -> Result<()> {
        let next = Snapshot {
            routes,
            ..self.state.clone()
        };
        self.commit(next, None)
    }

    pub fn replace_loans(&mut self, loans: Vec<Loan>) -> Result<()> {
        let next = Snapshot {
            loans,
            ..self.state.clone()
        };
        self.commit(next, None)
    }

    pub fn replace_installments(&mut self, installments: Vec<Installment>) -> Result<()> {
        let next = Snapshot {
            installments,
            ..self.state.clone()
        };
        self.commit(next, None)
    }

    pub fn replace_payments(&mut self, payments: Vec<Payment>) -> Result<()> {
        let next = Snapshot {
            payments,
            ..self.state.clone()
        };
        self.commit(next, None)
    }

    /// sign in against the stored users
    pub fn authenticate(&self, email: &str, password: &str, role: Role) -> Result<&User> {
        let user = directory::authenticate(&self.state.users, email, password, role)?;
        debug!(user_id = %user.id, role = ?role, "user authenticated");
        Ok(user)
    }

    pub fn register_user(&mut self, user: User) -> Result<()> {
        info!(user_id = %user.id, role = ?user.role, "registering user");
        let event = Event::UserRegistered {
            user_id: user.id.clone(),
            role: user.role,
            parent_id: user.parent_id.clone(),
            timestamp: self.now(),
        };

        let mut next = self.state.clone();
        next.users.push(user);
        self.commit(next, Some(event))
    }

    /// replace the stored user with the same id
    pub fn update_user(&mut self, user: User) -> Result<()> {
        let mut next = self.state.clone();
        let slot = next
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| LedgerError::UnknownUser { id: user.id.clone() })?;
        let event = Event::UserUpdated {
            user_id: user.id.clone(),
            timestamp: self.now(),
        };
        *slot = user;

        self.commit(next, Some(event))
    }

    pub fn add_route(&mut self, route: Route) -> Result<()> {
        let mut next = self.state.clone();
        next.routes.push(route);
        self.commit(next, None)
    }

    /// create a loan and its schedule; both are appended together
    pub fn originate(&mut self, request: &LoanRequest) -> Result<Loan> {
        self.user(&request.client_id)?;
        self.user(&request.collector_id)?;

        let now = self.now();
        let (loan, schedule) = request.originate(&new_loan_id(), now)?;
        let rounding_excess = schedule.rounding_excess();

        let event = Event::LoanOriginated {
            loan_id: loan.id.clone(),
            client_id: loan.client_id.clone(),
            collector_id: loan.collector_id.clone(),
            principal: loan.principal,
            total_amount: loan.total_amount,
            periodicity: loan.periodicity,
            installments: loan.installments_count,
            timestamp: now,
        };

        let mut next = self.state.clone();
        next.loans.push(loan.clone());
        next.installments.extend(schedule.into_installments());
        self.commit(next, Some(event))?;

        info!(
            loan_id = %loan.id,
            client_id = %loan.client_id,
            collector_id = %loan.collector_id,
            principal = %loan.principal,
            total = %loan.total_amount,
            installments = loan.installments_count,
            rounding_excess = %rounding_excess,
            "loan originated"
        );
        Ok(loan)
    }

    /// settle an installment in full and record the payment
    pub fn confirm_payment(&mut self, installment_id: &str, collector_id: Option<&str>) -> Result<Payment> {
        let now = self.now();
        let idx = self
            .state
            .installments
            .iter()
            .position(|i| i.id == installment_id)
            .ok_or_else(|| LedgerError::UnknownInstallment {
                id: installment_id.to_string(),
            })?;

        let (payment, updated) = collection::confirm_payment(&self.state.installments[idx], collector_id, now)?;

        let event = Event::PaymentConfirmed {
            payment_id: payment.id.clone(),
            installment_id: updated.id.clone(),
            loan_id: updated.loan_id.clone(),
            amount: payment.amount,
            collector_id: payment.collector_id.clone(),
            timestamp: now,
        };

        let mut next = self.state.clone();
        next.installments[idx] = updated;
        next.payments.push(payment.clone());
        self.commit(next, Some(event))?;

        info!(
            payment_id = %payment.id,
            installment_id = %installment_id,
            amount = %payment.amount,
            "payment confirmed"
        );
        Ok(payment)
    }

    /// remove a loan together with its installments; payments are kept
    pub fn remove_loan(&mut self, loan_id: &str) -> Result<Loan> {
        let mut next = self.state.clone();
        let idx = next
            .loans
            .iter()
            .position(|l| l.id == loan_id)
            .ok_or_else(|| LedgerError::UnknownLoan { id: loan_id.to_string() })?;
        let loan = next.loans.remove(idx);

        let before = next.installments.len();
        next.installments.retain(|i| i.loan_id != loan_id);
        let removed = before - next.installments.len();

        let event = Event::LoanRemoved {
            loan_id: loan_id.to_string(),
            installments_removed: removed,
            timestamp: self.now(),
        };
        self.commit(next, Some(event))?;

        warn!(loan_id = %loan_id, installments = removed, "loan removed");
        Ok(loan)
    }

    /// write every collection back to storage
    pub fn persist(&mut self) -> Result<()> {
        self.state.save(&mut self.storage)?;
        self.snapshot_saved();
        Ok(())
    }

    /// save `next` first; the in-memory state and events only change once it is stored
    fn commit(&mut self, next: Snapshot, event: Option<Event>) -> Result<()> {
        if let Err(err) = next.save(&mut self.storage) {
            warn!(error = %err, "snapshot not saved, change discarded");
            return Err(err);
        }
        self.state = next;
        if let Some(event) = event {
            self.events.emit(event);
        }
        self.snapshot_saved();
        Ok(())
    }

    fn snapshot_saved(&mut self) {
        let now = self.now();
        debug!(collections = Collection::ALL.len(), "snapshot saved");
        self.events.emit(Event::SnapshotSaved {
            collections: Collection::ALL.len(),
            timestamp: now,
        });
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::compute(
            &self.state.loans,
            &self.state.installments,
            &self.state.payments,
            self.now(),
        )
    }

    pub fn collector_stats(&self, scope: &StatsScope) -> CollectorStats {
        portfolio::collector_stats(scope, &self.state.loans, &self.state.installments, self.now())
    }

    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        portfolio::recent_daily_totals(&self.state.payments, self.now().date_naive(), DEFAULT_WINDOW_DAYS)
    }

    pub fn dashboard(&self, manager_id: &str) -> Result<DashboardView> {
        let manager = self.user(manager_id)?;
        Ok(DashboardView::build(
            manager,
            &self.state.users,
            &self.state.loans,
            &self.state.installments,
            &self.state.payments,
            self.now(),
        ))
    }

    pub fn wallet(&self, client_id: &str) -> ClientWallet {
        ClientWallet::for_client(client_id, &self.state.loans, &self.state.installments)
    }

    /// unpaid installments the collector still has to visit
    pub fn route_for(&self, collector_id: &str) -> Vec<RouteStop> {
        collection::pending_route(
            collector_id,
            &self.state.loans,
            &self.state.installments,
            &self.state.users,
        )
    }

    /// advice on the current portfolio; failures come back as fallback text
    pub fn advise<C: AdvisoryClient>(&self, advisor: &Advisor<C>) -> Advice {
        advisor.advise(&self.summary())
    }

    /// drain pending events
    ///
    /// Every saved change queues at least one event; a long-lived book should be
    /// drained regularly or the queue keeps growing.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::types::{InstallmentStatus, Periodicity};
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
    }

    fn empty_storage() -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        for collection in [Collection::Loans, Collection::Installments, Collection::Payments] {
            storage.write(collection.key(), "[]").unwrap();
        }
        storage
    }

    fn request() -> LoanRequest {
        LoanRequest::builder()
            .client("cli-1")
            .collector("rec-1")
            .route("r1")
            .amount(Money::from_major(100_000))
            .rate_percent(20)
            .periodicity(Periodicity::Daily)
            .installments(10)
            .build()
            .unwrap()
    }

    #[test]
    fn test_open_falls_back_to_seed() {
        let book = LoanBook::open(MemoryStorage::new(), test_time()).unwrap();
        assert_eq!(book.users().len(), 4);
        assert_eq!(book.routes().len(), 1);
        assert_eq!(book.loans().len(), 1);
        assert_eq!(book.installments().len(), 24);
        assert!(book.payments().is_empty());
        assert_eq!(book.loan(seed::SEED_LOAN_ID).unwrap().total_amount, Money::from_major(600_000));
    }

    #[test]
    fn test_stored_schedule_without_loans_is_not_seeded() {
        let mut storage = MemoryStorage::new();
        storage.write(Collection::Installments.key(), "[]").unwrap();
        let book = LoanBook::open(storage, test_time()).unwrap();
        assert!(book.loans().is_empty());
        assert!(book.installments().is_empty());
        assert!(book.loan(seed::SEED_LOAN_ID).is_err());
    }

    #[test]
    fn test_seed_loans_come_with_their_schedule() {
        let book = LoanBook::open(MemoryStorage::new(), test_time()).unwrap();
        for loan in book.loans() {
            assert_eq!(book.schedule_of(&loan.id).len(), loan.installments_count as usize);
        }
    }

    #[test]
    fn test_stored_loans_are_not_mixed_with_seed_schedule() {
        let mut storage = MemoryStorage::new();
        storage.write(Collection::Loans.key(), "[]").unwrap();
        let book = LoanBook::open(storage, test_time()).unwrap();
        assert!(book.loans().is_empty());
        assert!(book.installments().is_empty());
    }

    #[test]
    fn test_originate_and_confirm() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let loan = book.originate(&request()).unwrap();

        let schedule = book.schedule_of(&loan.id);
        assert_eq!(schedule.len(), 10);
        assert_eq!(schedule[0].due_date, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());

        let first_id = schedule[0].id.clone();
        let payment = book.confirm_payment(&first_id, Some("rec-1")).unwrap();
        assert_eq!(payment.amount, Money::from_major(12_000));

        let inst = book.installment(&first_id).unwrap();
        assert_eq!(inst.status, InstallmentStatus::Paid);
        assert_eq!(inst.paid_amount, Money::from_major(12_000));
        assert_eq!(book.summary().efficiency, dec!(10));
        assert_eq!(book.summary().collected_today, Money::from_major(12_000));

        let again = book.confirm_payment(&first_id, Some("rec-1"));
        assert!(matches!(again, Err(LedgerError::InstallmentAlreadySettled { .. })));
        assert_eq!(book.payments().len(), 1);
    }

    #[test]
    fn test_unknown_references() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        assert!(matches!(
            book.confirm_payment("inst-nope-1", None),
            Err(LedgerError::UnknownInstallment { .. })
        ));
        assert!(matches!(book.remove_loan("l-nope"), Err(LedgerError::UnknownLoan { .. })));

        let mut bad = request();
        bad.client_id = "cli-404".to_string();
        assert!(matches!(book.originate(&bad), Err(LedgerError::UnknownUser { .. })));
        assert!(book.loans().is_empty());
    }

    #[test]
    fn test_invalid_terms_leave_book_untouched() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let mut bad = request();
        bad.installments = 0;
        assert!(matches!(book.originate(&bad), Err(LedgerError::InvalidLoanTerms { .. })));
        assert!(book.loans().is_empty());
        assert!(book.installments().is_empty());
    }

    #[test]
    fn test_changes_are_persisted() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let loan = book.originate(&request()).unwrap();
        let first = book.schedule_of(&loan.id)[0].id.clone();
        book.confirm_payment(&first, Some("rec-1")).unwrap();

        let storage = book.into_storage();
        let reopened = LoanBook::open(storage, test_time()).unwrap();
        assert_eq!(reopened.loans(), &[loan]);
        assert_eq!(reopened.installments().len(), 10);
        assert_eq!(reopened.payments().len(), 1);
        assert_eq!(reopened.installment(&first).unwrap().status, InstallmentStatus::Paid);
    }

    #[test]
    fn test_remove_loan_cascades() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let keep = book.originate(&request()).unwrap();
        let dropped = book.originate(&request()).unwrap();
        assert_eq!(book.installments().len(), 20);

        book.remove_loan(&dropped.id).unwrap();
        assert_eq!(book.loans().len(), 1);
        assert_eq!(book.installments().len(), 10);
        assert!(book.installments().iter().all(|i| i.loan_id == keep.id));
    }

    #[test]
    fn test_users() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let supervisor = book.user("sup-1").unwrap().clone();
        let collector = User::managed_by(&supervisor, "Pedro", "pedro@paysd.com", None, Money::from_major(1_000_000), 10);
        let collector_id = collector.id.clone();
        book.register_user(collector).unwrap();

        assert!(book.authenticate("PEDRO@paysd.com", "123456", Role::Collector).is_ok());

        let mut renamed = book.user(&collector_id).unwrap().clone();
        renamed.name = "Pedro Pérez".to_string();
        book.update_user(renamed).unwrap();
        assert_eq!(book.user(&collector_id).unwrap().name, "Pedro Pérez");

        let mut ghost = supervisor;
        ghost.id = "ghost".to_string();
        assert!(matches!(book.update_user(ghost), Err(LedgerError::UnknownUser { .. })));
    }

    #[test]
    fn test_overdue_follows_the_clock() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let mut book = LoanBook::open(empty_storage(), time).unwrap();
        book.originate(&request()).unwrap();
        assert_eq!(book.summary().overdue, Money::ZERO);

        control.advance(chrono::Duration::days(3) + chrono::Duration::hours(1));
        assert_eq!(book.summary().overdue, Money::from_major(36_000));

        let stats = book.collector_stats(&StatsScope::Collector("rec-1".to_string()));
        assert_eq!(stats.overdue, Money::from_major(36_000));
        assert_eq!(stats.efficiency, Decimal::ZERO);
    }

    /// memory storage whose writes can be switched off
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: Rc<Cell<bool>>,
    }

    impl SnapshotStorage for FlakyStorage {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<()> {
            if self.failing.get() {
                return Err(LedgerError::Storage {
                    key: key.to_string(),
                    message: "disk full".to_string(),
                });
            }
            self.inner.write(key, value)
        }
    }

    #[test]
    fn test_failed_save_leaves_book_unchanged() {
        let failing = Rc::new(Cell::new(false));
        let storage = FlakyStorage {
            inner: empty_storage(),
            failing: Rc::clone(&failing),
        };
        let mut book = LoanBook::open(storage, test_time()).unwrap();
        let loan = book.originate(&request()).unwrap();
        let first = book.schedule_of(&loan.id)[0].id.clone();
        book.take_events();

        failing.set(true);
        let before = book.snapshot().clone();

        assert!(matches!(book.originate(&request()), Err(LedgerError::Storage { .. })));
        assert!(matches!(book.confirm_payment(&first, Some("rec-1")), Err(LedgerError::Storage { .. })));
        assert!(matches!(book.remove_loan(&loan.id), Err(LedgerError::Storage { .. })));

        let supervisor = book.user("sup-1").unwrap().clone();
        let collector = User::managed_by(&supervisor, "Pedro", "pedro@paysd.com", None, Money::from_major(1_000_000), 10);
        assert!(book.register_user(collector).is_err());

        let mut renamed = supervisor;
        renamed.name = "Roberto".to_string();
        assert!(book.update_user(renamed).is_err());
        assert!(book.replace_payments(Vec::new()).is_err());

        assert_eq!(book.snapshot(), &before);
        assert!(book.take_events().is_empty());

        // the same payment goes through once storage recovers
        failing.set(false);
        let payment = book.confirm_payment(&first, Some("rec-1")).unwrap();
        assert_eq!(payment.amount, Money::from_major(12_000));
        assert_eq!(book.payments().len(), 1);
        assert_eq!(book.loans().len(), 1);
    }

    #[test]
    fn test_events() {
        let mut book = LoanBook::open(empty_storage(), test_time()).unwrap();
        let loan = book.originate(&request()).unwrap();
        let first = book.schedule_of(&loan.id)[0].id.clone();
        book.confirm_payment(&first, None).unwrap();

        let events = book.take_events();
        assert!(matches!(events[0], Event::LoanOriginated { .. }));
        assert!(events.iter().any(|e| matches!(e, Event::PaymentConfirmed { .. })));
        assert!(book.take_events().is_empty());
    }
}
