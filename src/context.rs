//! Application context
//!
//! Who is operating the console and which domain they are working in.
//! Built once at startup and handed to the pages that need it - an explicit
//! value, not an ambient service looked up at call time.

use crate::rest::models::CurrentUser;

/// The authority name the gateway gives its cross-domain administrators
pub const SUPER_ADMIN_ROLE: &str = "ROLE_AP_ADMIN";

#[derive(Debug, Clone, Default)]
pub struct AppContext {
    /// Username the console authenticates as
    pub username: String,

    /// Code of the domain the operator is working in
    pub current_domain: Option<String>,

    /// Cross-domain administrator: sees the domain column and checkbox
    pub super_admin: bool,
}

impl AppContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            current_domain: None,
            super_admin: false,
        }
    }

    /// Fold in what the gateway reports about the authenticated user
    pub fn apply_current_user(&mut self, user: &CurrentUser) {
        self.username = user.username.clone();
        self.super_admin = user.authorities.iter().any(|a| a == SUPER_ADMIN_ROLE);
    }

    pub fn is_current_user(&self, username: &str) -> bool {
        !self.username.is_empty() && self.username == username
    }

    pub fn is_current_domain(&self, code: &str) -> bool {
        self.current_domain.as_deref() == Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_detected_from_authorities() {
        let mut ctx = AppContext::new("admin");
        ctx.apply_current_user(&CurrentUser {
            username: "super".to_string(),
            authorities: vec!["ROLE_ADMIN".to_string(), SUPER_ADMIN_ROLE.to_string()],
            default_password_used: false,
        });
        assert!(ctx.super_admin);
        assert_eq!(ctx.username, "super");
    }

    #[test]
    fn test_current_user_comparison_requires_a_name() {
        let ctx = AppContext::default();
        assert!(!ctx.is_current_user(""));
    }
}
