/// route day - a collector works through the pending route while the clock moves
use collection_ledger::{
    LoanBook, LoanRequest, MemoryStorage, Money, Periodicity, Role, SafeTimeProvider, StatsScope,
    TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    // empty storage: seed users, seed loan and its schedule
    let mut book = LoanBook::open(MemoryStorage::new(), time.clone())?;
    let collector = book.authenticate("juan@paysd.com", "rec123", Role::Collector)?.clone();
    println!("signed in as {}", collector.name);

    let request = LoanRequest::builder()
        .client("cli-1")
        .collector(collector.id.as_str())
        .route("r1")
        .amount(Money::from_major(200_000))
        .periodicity(Periodicity::Weekly)
        .build()?;
    let loan = book.originate(&request)?;
    println!("new weekly loan {} for {}", loan.id, loan.total_amount.to_cop());

    for day in 1..=3 {
        controller.advance(Duration::days(1));
        println!("\n=== day {} ({}) ===", day, time.now().format("%Y-%m-%d"));

        let due: Vec<_> = book
            .route_for(&collector.id)
            .into_iter()
            .filter(|stop| stop.installment.due_date <= time.now())
            .collect();

        for stop in due {
            println!("{}", stop.reminder());
            let payment = book.confirm_payment(&stop.installment.id, Some(&collector.id))?;
            println!("  collected {}", payment.amount.to_cop());
        }

        let stats = book.collector_stats(&StatsScope::Collector(collector.id.clone()));
        println!("collected so far: {}", stats.collected.to_cop());
        println!("efficiency: {:.1}%", stats.efficiency);
    }

    let summary = book.summary();
    println!("\nportfolio: {}", summary.total_portfolio.to_cop());
    println!("overdue: {}", summary.overdue.to_cop());
    println!("events recorded: {}", book.take_events().len());

    Ok(())
}
