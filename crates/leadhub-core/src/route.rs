//! Route protection for the admin back-office.
//!
//! Guards are pure functions of [`SessionState`]: they never fetch or
//! mutate anything, they only say what the visitor should see.

use crate::session::SessionState;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_ROOT: &str = "/admin";

/// Admin panel routes, in menu order.
pub const ADMIN_ROUTES: &[(&str, &str)] = &[
    ("Dashboard", "/admin"),
    ("Home", "/admin/homes"),
    ("Biography", "/admin/biography"),
    ("News", "/admin/news"),
    ("Events", "/admin/events"),
    ("Gallery", "/admin/gallery"),
    ("Bookstore", "/admin/bookstore"),
    ("Contact Info", "/admin/contact"),
    ("Inquiry Messages", "/admin/inquiry"),
    ("Setting", "/admin/setting"),
];

/// The two guard variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Admin pages: only for logged-in visitors.
    RequireAuth,
    /// The login page: only for anonymous visitors.
    RequireAnonymous,
}

/// What a guard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session not resolved yet; show a neutral loading indicator.
    Loading,
    Redirect(String),
    Render,
}

impl Guard {
    pub fn evaluate(self, state: &SessionState) -> GuardOutcome {
        match (self, state) {
            (_, SessionState::Loading) => GuardOutcome::Loading,
            (Guard::RequireAuth, SessionState::Unauthenticated) => {
                GuardOutcome::Redirect(LOGIN_PATH.to_string())
            }
            (Guard::RequireAnonymous, SessionState::Authenticated(_)) => {
                GuardOutcome::Redirect(ADMIN_ROOT.to_string())
            }
            _ => GuardOutcome::Render,
        }
    }

    /// The guard protecting `path`, if any.
    pub fn for_path(path: &str) -> Option<Guard> {
        let path = normalize(path);
        if path == LOGIN_PATH {
            Some(Guard::RequireAnonymous)
        } else if is_admin_path(&path) {
            Some(Guard::RequireAuth)
        } else {
            None
        }
    }
}

/// Whether `path` is `/admin` or below it.
pub fn is_admin_path(path: &str) -> bool {
    let path = normalize(path);
    path == ADMIN_ROOT || path.starts_with("/admin/")
}

/// Where a visitor requesting `path` lands, or `None` while loading.
///
/// Public paths always land where requested.
pub fn resolve(path: &str, state: &SessionState) -> Option<String> {
    let path = normalize(path);
    match Guard::for_path(&path).map(|guard| guard.evaluate(state)) {
        Some(GuardOutcome::Loading) => None,
        Some(GuardOutcome::Redirect(target)) => Some(target),
        Some(GuardOutcome::Render) | None => Some(path),
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}
