use chrono::{Duration, TimeZone, Utc};
use collection_ledger::{
    collection_efficiency, generate_schedule, Collection, InstallmentStatus, LoanBook, LoanRequest,
    MemoryStorage, Money, Periodicity, Rate, Role, SafeTimeProvider, SnapshotStorage, StatsScope,
    TimeSource, User,
};
use rust_decimal_macros::dec;

fn book_at(year: i32, month: u32, day: u32) -> (LoanBook<MemoryStorage>, SafeTimeProvider) {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap(),
    ));
    let mut storage = MemoryStorage::new();
    for collection in [Collection::Loans, Collection::Installments, Collection::Payments] {
        storage.write(collection.key(), "[]").unwrap();
    }
    (LoanBook::open(storage, time.clone()).unwrap(), time)
}

#[test]
fn daily_loan_scenario() {
    let (mut book, _time) = book_at(2024, 1, 1);

    let request = LoanRequest::builder()
        .client("cli-1")
        .collector("rec-1")
        .amount(Money::from_major(100_000))
        .rate(Rate::from_decimal(dec!(0.20)))
        .periodicity(Periodicity::Daily)
        .installments(10)
        .build()
        .unwrap();
    let loan = book.originate(&request).unwrap();
    assert_eq!(loan.total_amount, Money::from_major(120_000));

    let schedule = book.schedule_of(&loan.id);
    assert_eq!(schedule.len(), 10);
    for (n, inst) in schedule.iter().enumerate() {
        assert_eq!(inst.number, n as u32 + 1);
        assert_eq!(inst.amount, Money::from_major(12_000));
        assert_eq!(inst.paid_amount, Money::ZERO);
        assert_eq!(inst.status, InstallmentStatus::Pending);
        assert_eq!(
            inst.due_date,
            Utc.with_ymd_and_hms(2024, 1, n as u32 + 2, 0, 0, 0).unwrap()
        );
    }

    let first = schedule[0].id.clone();
    let payment = book.confirm_payment(&first, Some("rec-1")).unwrap();
    assert_eq!(payment.amount, Money::from_major(12_000));

    let paid = book.installment(&first).unwrap();
    assert_eq!(paid.status, InstallmentStatus::Paid);
    assert_eq!(paid.paid_amount, Money::from_major(12_000));
    assert_eq!(collection_efficiency(book.installments()), dec!(10));
}

#[test]
fn monthly_loan_from_month_end() {
    let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let installments = generate_schedule(
        "l-month-end",
        Money::from_major(200_000),
        Rate::from_percentage(25),
        Periodicity::Monthly,
        2,
        start,
    )
    .unwrap();

    assert_eq!(installments.len(), 2);
    assert!(installments[0].due_date > start);
    assert!(installments[1].due_date > installments[0].due_date);
    assert_eq!(installments[0].due_date.format("%Y-%m-%d").to_string(), "2024-02-29");
    assert_eq!(installments[1].due_date.format("%Y-%m-%d").to_string(), "2024-03-31");
}

#[test]
fn supervisor_dashboard_tracks_the_team() {
    let (mut book, time) = book_at(2024, 3, 4);
    let control = time.test_control().unwrap();

    let supervisor = book.user("sup-1").unwrap().clone();
    let pedro = User::managed_by(&supervisor, "Pedro", "pedro@paysd.com", Some("p123"), Money::from_major(2_000_000), 8);
    let pedro_id = pedro.id.clone();
    book.register_user(pedro).unwrap();

    let pedro_user = book.user(&pedro_id).unwrap().clone();
    let client = User::client_of(&pedro_user, "Lucia", "lucia@mail.com");
    let client_id = client.id.clone();
    book.register_user(client).unwrap();

    for (collector, client) in [("rec-1", "cli-1"), (pedro_id.as_str(), client_id.as_str())] {
        let request = LoanRequest::builder()
            .client(client)
            .collector(collector)
            .amount(Money::from_major(100_000))
            .periodicity(Periodicity::Weekly)
            .installments(4)
            .rate_percent(20)
            .build()
            .unwrap();
        book.originate(&request).unwrap();
    }

    // a week and a day later the first installment of each loan is due
    control.advance(Duration::days(8));
    let stop = book.route_for("rec-1").remove(0);
    book.confirm_payment(&stop.installment.id, Some("rec-1")).unwrap();

    let dashboard = book.dashboard("sup-1").unwrap();
    assert_eq!(dashboard.summary.total_portfolio, Money::from_major(240_000));
    assert_eq!(dashboard.summary.collected_today, Money::from_major(30_000));
    assert_eq!(dashboard.summary.overdue, Money::from_major(30_000));
    assert_eq!(dashboard.team.len(), 2);

    let juan = dashboard.team.iter().find(|c| c.user_id == "rec-1").unwrap();
    assert_eq!(juan.stats.collected, Money::from_major(30_000));
    assert_eq!(juan.stats.efficiency, dec!(25));

    let pedro_view = dashboard.team.iter().find(|c| c.user_id == pedro_id).unwrap();
    assert_eq!(pedro_view.stats.overdue, Money::from_major(30_000));
    assert_eq!(pedro_view.stats.efficiency, dec!(0));

    let today = dashboard.daily_totals.last().unwrap();
    assert_eq!(today.total, Money::from_major(30_000));
    assert_eq!(dashboard.daily_totals.len(), 7);

    let json = dashboard.to_json_pretty().unwrap();
    assert!(json.contains("\"collected_today\": \"$ 30.000\""));

    let first = book.collector_stats(&StatsScope::Collector("rec-1".to_string()));
    let second = book.collector_stats(&StatsScope::Collector("rec-1".to_string()));
    assert_eq!(first, second);
}

#[test]
fn client_signs_in_and_sees_wallet() {
    let (mut book, _time) = book_at(2024, 6, 1);
    let request = LoanRequest::builder()
        .client("cli-1")
        .collector("rec-1")
        .amount(Money::from_major(300_000))
        .periodicity(Periodicity::Biweekly)
        .build()
        .unwrap();
    let loan = book.originate(&request).unwrap();

    let client = book.authenticate("maria@gmail.com", "cli123", Role::Client).unwrap();
    let wallet = book.wallet(&client.id.clone());

    // biweekly preset: 20% over 6 installments
    assert_eq!(loan.total_amount, Money::from_major(360_000));
    assert_eq!(wallet.installments.len(), 6);
    assert_eq!(wallet.outstanding, Money::from_major(360_000));
    assert_eq!(wallet.next_due.unwrap().number, 1);
}
