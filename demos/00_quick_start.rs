/// quick start - originate a loan and look at its schedule
use collection_ledger::{LoanRequest, Money, Periodicity, SafeTimeProvider, TimeSource};
use chrono::{TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));

    // 100 000 at 20%, paid daily over 10 installments
    let (loan, schedule) = LoanRequest::builder()
        .client("cli-1")
        .collector("rec-1")
        .amount(Money::from_major(100_000))
        .rate_percent(20)
        .periodicity(Periodicity::Daily)
        .installments(10)
        .originate_with_time(&time)?;

    println!("loan {} owes {}", loan.id, loan.total_amount.to_cop());
    for inst in &schedule.installments {
        println!("  #{:<2} {} due {}", inst.number, inst.amount.to_cop(), inst.due_date.format("%d/%m/%Y"));
    }
    println!("rounding excess: {}", schedule.rounding_excess());

    Ok(())
}
