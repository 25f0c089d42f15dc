use serde::{Deserialize, Serialize};

use crate::models::UserRole;

pub const CUSTOMER_DASHBOARD: &str = "/customer";
pub const ADMIN_DASHBOARD: &str = "/admin";
pub const SUPER_ADMIN_HUB: &str = "/super-admin/routing-hub";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub name: String,
    pub path: String,
}

impl NavLink {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Where the "Dashboard" entry of the navbar sends each role.
pub fn dashboard_url(role: UserRole) -> &'static str {
    match role {
        UserRole::Superadmin => SUPER_ADMIN_HUB,
        UserRole::Admin => ADMIN_DASHBOARD,
        _ => CUSTOMER_DASHBOARD,
    }
}

/// Entries of the customer panel sidebar, top to bottom.
pub fn customer_sidebar() -> Vec<NavLink> {
    [
        ("Go To Home", "/dashboard"),
        ("My Orders", "/orders"),
        ("Wishlist", "/wishlist"),
        ("Messages", "/messages"),
        ("Subscriptions", "/subscriptions"),
        ("Payment Methods", "/payment-methods"),
        ("Settings", "/settings"),
        ("Support", "/support"),
    ]
    .into_iter()
    .map(|(name, path)| NavLink::new(name, path))
    .collect()
}

/// Targets offered by the super-admin routing hub. Empty for everyone else.
pub fn routing_hub(role: UserRole) -> Vec<NavLink> {
    if role != UserRole::Superadmin {
        return vec![];
    }
    vec![NavLink::new("admin", ADMIN_DASHBOARD), NavLink::new("home page", "/")]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Already on the dashboard: only close the menu.
    Close,
    /// Close the menu and load the given path.
    CloseAndNavigate(String),
}

/// Outcome of tapping the dashboard entry in the mobile menu.
pub fn dashboard_click(current_path: &str, dashboard_url: &str) -> MenuAction {
    if current_path == dashboard_url {
        MenuAction::Close
    } else {
        MenuAction::CloseAndNavigate(dashboard_url.to_string())
    }
}
