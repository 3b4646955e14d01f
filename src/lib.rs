pub mod advisory;
pub mod collection;
pub mod config;
pub mod decimal;
pub mod directory;
pub mod errors;
pub mod events;
pub mod origination;
pub mod portfolio;
pub mod schedule;
pub mod state;
pub mod store;
pub mod types;

// re-export key types
pub use advisory::{Advice, AdviceSource, AdvisoryClient, AdvisoryRequest, Advisor};
pub use collection::{confirm_payment, pending_route, RouteStop};
pub use config::{AdvisoryConfig, LoanDefaults};
pub use decimal::{Money, Rate};
pub use directory::{authenticate, LandingView, Route, User};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use origination::{LoanBuilder, LoanRequest};
pub use portfolio::{
    collected_today, collection_efficiency, collector_stats, overdue_balance,
    recent_daily_totals, total_portfolio_value, ClientWallet, CollectorStats, DailyTotal,
    DashboardView, PortfolioSummary, StatsScope,
};
pub use schedule::{generate_schedule, InstallmentSchedule};
pub use state::{Installment, Loan, Payment};
pub use store::{Collection, FileStorage, LoanBook, MemoryStorage, Snapshot, SnapshotStorage};
pub use types::{
    InstallmentId, InstallmentStatus, LoanId, LoanStatus, PaymentMethod, Periodicity, Role,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
