/// snapshot state - persist the book to disk and reopen it
use collection_ledger::{
    AdvisoryClient, AdvisoryConfig, AdvisoryRequest, Advisor, FileStorage, LoanBook, SafeTimeProvider,
    TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

/// stand-in for a hosted model
struct CannedClient;

impl AdvisoryClient for CannedClient {
    fn generate(&self, request: &AdvisoryRequest) -> collection_ledger::Result<Option<String>> {
        Ok(Some(format!("({} chars of context) Prioriza las cuotas vencidas.", request.prompt.len())))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let dir = std::env::temp_dir().join("collection-ledger-demo");

    let mut book = LoanBook::open(FileStorage::open(&dir)?, time.clone())?;
    controller.advance(Duration::days(2));

    let next = book
        .route_for("rec-1")
        .into_iter()
        .next()
        .ok_or("nothing to collect")?;
    book.confirm_payment(&next.installment.id, Some("rec-1"))?;
    println!("files written to {}", dir.display());

    // reopen from disk
    let reopened = LoanBook::open(FileStorage::open(&dir)?, time.clone())?;
    println!("loans: {}", reopened.loans().len());
    println!("payments: {}", reopened.payments().len());

    let dashboard = reopened.dashboard("sup-1")?;
    println!("{}", dashboard.to_json_pretty()?);

    // without credentials the advisor answers with its fallback text
    let offline = Advisor::new(AdvisoryConfig::default(), CannedClient);
    println!("advisor (no key): {}", reopened.advise(&offline).text);

    let online = Advisor::new(AdvisoryConfig::default().with_api_key("demo-key"), CannedClient);
    println!("advisor: {}", reopened.advise(&online).text);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
