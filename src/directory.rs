//! Users, routes and the owner → supervisor → collector → client hierarchy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{Role, RouteId, UserId};

/// password given to managed users created without one
pub const DEFAULT_PASSWORD: &str = "123456";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_capital: Option<Money>,
    /// whole percentage, e.g. 10 for 10%
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<RouteId>,
}

impl User {
    /// staff member created by `manager` with the role the manager manages
    pub fn managed_by(
        manager: &User,
        name: &str,
        email: &str,
        password: Option<&str>,
        capital: Money,
        profit_margin: u32,
    ) -> Self {
        Self {
            id: format!("u-{}", short_id()),
            name: name.to_string(),
            email: email.to_string(),
            password: Some(password.unwrap_or(DEFAULT_PASSWORD).to_string()),
            role: managed_role(manager.role),
            avatar: Some(avatar_url(name)),
            parent_id: Some(manager.id.clone()),
            assigned_capital: Some(capital),
            profit_margin: Some(profit_margin),
            route_id: None,
        }
    }

    /// client registered by a collector; clients have no password of their own
    pub fn client_of(collector: &User, name: &str, email: &str) -> Self {
        Self {
            id: format!("cli-{}", short_id()),
            name: name.to_string(),
            email: email.to_string(),
            password: None,
            role: Role::Client,
            avatar: Some(avatar_url(name)),
            parent_id: Some(collector.id.clone()),
            assigned_capital: None,
            profit_margin: None,
            route_id: None,
        }
    }

    /// the collector's cut of `amount` at their profit margin
    pub fn commission_on(&self, amount: Money) -> Money {
        let margin = Rate::from_percentage(self.profit_margin.unwrap_or(0));
        amount.apply_rate(margin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// screen a user lands on after signing in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingView {
    Dashboard,
    Collector,
    Wallet,
}

/// match email (case-insensitive), password and role against the user list
pub fn authenticate<'a>(users: &'a [User], email: &str, password: &str, role: Role) -> Result<&'a User> {
    users
        .iter()
        .find(|u| {
            u.email.eq_ignore_ascii_case(email)
                && u.password.as_deref() == Some(password)
                && u.role == role
        })
        .ok_or(LedgerError::InvalidCredentials { role })
}

pub fn landing_view(role: Role) -> LandingView {
    match role {
        Role::Collector => LandingView::Collector,
        Role::Client => LandingView::Wallet,
        _ => LandingView::Dashboard,
    }
}

/// owners manage supervisors; everyone else with a team manages collectors
pub fn managed_role(role: Role) -> Role {
    match role {
        Role::Owner => Role::Supervisor,
        _ => Role::Collector,
    }
}

/// direct reports of `manager`
pub fn managed_users<'a>(users: &'a [User], manager: &User) -> Vec<&'a User> {
    let role = managed_role(manager.role);
    users
        .iter()
        .filter(|u| u.role == role && u.parent_id.as_deref() == Some(manager.id.as_str()))
        .collect()
}

/// clients registered by the collector
pub fn clients_of<'a>(users: &'a [User], collector_id: &str) -> Vec<&'a User> {
    users
        .iter()
        .filter(|u| u.role == Role::Client && u.parent_id.as_deref() == Some(collector_id))
        .collect()
}

pub fn find_user<'a>(users: &'a [User], id: &str) -> Option<&'a User> {
    users.iter().find(|u| u.id == id)
}

fn avatar_url(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed.replace(' ', "%20"))
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
