//! Built-in dataset used when a collection has never been stored.

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::directory::{Route, User};
use crate::errors::Result;
use crate::origination::LoanRequest;
use crate::state::{Installment, Loan};
use crate::types::{Periodicity, Role};

pub const SEED_LOAN_ID: &str = "l-init";

pub fn users() -> Vec<User> {
    vec![
        User {
            id: "admin-1".to_string(),
            name: "Admin Principal".to_string(),
            email: "d123".to_string(),
            password: Some("1234".to_string()),
            role: Role::Owner,
            avatar: Some(avatar("Admin")),
            parent_id: None,
            assigned_capital: None,
            profit_margin: None,
            route_id: None,
        },
        User {
            id: "sup-1".to_string(),
            name: "Roberto Supervisor".to_string(),
            email: "sup@paysd.com".to_string(),
            password: Some("sup123".to_string()),
            role: Role::Supervisor,
            avatar: Some(avatar("Sup")),
            parent_id: Some("admin-1".to_string()),
            assigned_capital: None,
            profit_margin: None,
            route_id: None,
        },
        User {
            id: "rec-1".to_string(),
            name: "Juan Recaudador".to_string(),
            email: "juan@paysd.com".to_string(),
            password: Some("rec123".to_string()),
            role: Role::Collector,
            avatar: Some(avatar("Juan")),
            parent_id: Some("sup-1".to_string()),
            assigned_capital: Some(Money::from_major(5_000_000)),
            profit_margin: Some(10),
            route_id: Some("r1".to_string()),
        },
        User {
            id: "cli-1".to_string(),
            name: "Maria Cliente".to_string(),
            email: "maria@gmail.com".to_string(),
            password: Some("cli123".to_string()),
            role: Role::Client,
            avatar: Some(avatar("Maria")),
            parent_id: Some("rec-1".to_string()),
            assigned_capital: None,
            profit_margin: None,
            route_id: None,
        },
    ]
}

pub fn routes() -> Vec<Route> {
    vec![Route {
        id: "r1".to_string(),
        name: "Ruta Centro".to_string(),
        owner_id: "admin-1".to_string(),
        supervisor_id: Some("sup-1".to_string()),
        description: None,
    }]
}

/// 500 000 at 20% paid daily over 24 installments, starting `now`
pub fn loan_book(now: DateTime<Utc>) -> Result<(Vec<Loan>, Vec<Installment>)> {
    let request = LoanRequest {
        client_id: "cli-1".to_string(),
        collector_id: "rec-1".to_string(),
        route_id: "r1".to_string(),
        principal: Money::from_major(500_000),
        rate: Rate::from_decimal(dec!(0.20)),
        periodicity: Periodicity::Daily,
        installments: 24,
        start_date: Some(now),
    };
    let (loan, schedule) = request.originate(SEED_LOAN_ID, now)?;
    Ok((vec![loan], schedule.into_installments()))
}

fn avatar(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seed_loan() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let (loans, installments) = loan_book(now).unwrap();

        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].total_amount, Money::from_major(600_000));
        assert_eq!(installments.len(), 24);
        assert_eq!(installments[0].amount, Money::from_major(25_000));
    }

    #[test]
    fn test_seed_hierarchy_is_linked() {
        let users = users();
        for user in users.iter().filter(|u| u.role != Role::Owner) {
            let parent = user.parent_id.as_deref().unwrap();
            assert!(users.iter().any(|u| u.id == parent), "{} has no parent", user.id);
        }
    }
}
