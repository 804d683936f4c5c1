//! Route access decisions.
//!
//! Every request passes through [`decide`] before reaching a handler. The
//! decision depends only on the path and on who is asking:
//!
//! | Visitor            | Path                                  | Result              |
//! |--------------------|---------------------------------------|---------------------|
//! | anonymous          | protected prefix                      | `Login`             |
//! | organization       | `/cart`, `/checkout`                  | `Redirect("/owner")`|
//! | customer           | `/owner`                              | `Redirect("/")`     |
//! | any signed-in user | `/auth/login`, `/auth/signup`, `/auth/verify` | `Redirect(landing)` |
//!
//! Everything else is allowed.

use crate::types::Role;

/// Path prefixes that require a signed-in user.
pub const PROTECTED_PREFIXES: &[&str] = &["/account", "/cart", "/checkout", "/orders", "/owner"];

/// Customer-only prefixes an organization account is bounced away from.
pub const CUSTOMER_ONLY_PREFIXES: &[&str] = &["/cart", "/checkout"];

/// Organization-only prefixes a customer account is bounced away from.
pub const ORGANIZATION_ONLY_PREFIXES: &[&str] = &["/owner"];

/// Pages that make no sense once signed in.
pub const AUTH_PAGES: &[&str] = &["/auth/login", "/auth/signup", "/auth/verify"];

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Let the request through.
    Allow,
    /// Send the visitor to sign in.
    Login,
    /// Send the visitor somewhere else.
    Redirect(&'static str),
}

/// Decide whether `path` is reachable.
///
/// `session` is `None` for anonymous visitors, `Some(None)` for a signed-in
/// user whose role could not be determined, and `Some(Some(role))` otherwise.
/// A signed-in user without a role passes role checks unhindered and lands on
/// `/` when redirected away from the auth pages.
#[must_use]
pub fn decide(path: &str, session: Option<Option<Role>>) -> Access {
    let Some(role) = session else {
        return if matches_any(path, PROTECTED_PREFIXES) {
            Access::Login
        } else {
            Access::Allow
        };
    };

    if matches_any(path, AUTH_PAGES) {
        return Access::Redirect(role.unwrap_or_default().landing_path());
    }

    match role {
        Some(Role::Organization) if matches_any(path, CUSTOMER_ONLY_PREFIXES) => {
            Access::Redirect(Role::Organization.landing_path())
        }
        Some(Role::Customer) if matches_any(path, ORGANIZATION_ONLY_PREFIXES) => {
            Access::Redirect(Role::Customer.landing_path())
        }
        _ => Access::Allow,
    }
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Segment-aware prefix match: `/orders` matches `/orders` and `/orders/1`
/// but not `/ordersx`.
#[must_use]
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_protected_requires_login() {
        for path in ["/account", "/cart", "/checkout/", "/orders/abc", "/owner/products"] {
            assert_eq!(decide(path, None), Access::Login, "{path}");
        }
    }

    #[test]
    fn test_anonymous_public_allowed() {
        for path in ["/", "/products", "/farms/x", "/auth/login", "/ordersx", "/cartography"] {
            assert_eq!(decide(path, None), Access::Allow, "{path}");
        }
    }

    #[test]
    fn test_organization_kept_out_of_cart_and_checkout() {
        let org = Some(Some(Role::Organization));
        assert_eq!(decide("/cart", org), Access::Redirect("/owner"));
        assert_eq!(decide("/checkout", org), Access::Redirect("/owner"));
        assert_eq!(decide("/owner/orders", org), Access::Allow);
        assert_eq!(decide("/orders", org), Access::Allow);
    }

    #[test]
    fn test_customer_kept_out_of_owner() {
        let customer = Some(Some(Role::Customer));
        assert_eq!(decide("/owner", customer), Access::Redirect("/"));
        assert_eq!(decide("/owner/settings", customer), Access::Redirect("/"));
        assert_eq!(decide("/cart", customer), Access::Allow);
    }

    #[test]
    fn test_signed_in_users_leave_auth_pages() {
        assert_eq!(
            decide("/auth/login", Some(Some(Role::Organization))),
            Access::Redirect("/owner")
        );
        assert_eq!(
            decide("/auth/signup", Some(Some(Role::Customer))),
            Access::Redirect("/")
        );
        assert_eq!(decide("/auth/verify", Some(None)), Access::Redirect("/"));
        assert_eq!(decide("/auth/logout", Some(Some(Role::Customer))), Access::Allow);
    }

    #[test]
    fn test_unknown_role_passes_role_checks() {
        assert_eq!(decide("/owner", Some(None)), Access::Allow);
        assert_eq!(decide("/cart", Some(None)), Access::Allow);
    }

    #[test]
    fn test_prefix_match_is_segment_aware() {
        assert!(matches_prefix("/orders", "/orders"));
        assert!(matches_prefix("/orders/1", "/orders"));
        assert!(!matches_prefix("/ordersx", "/orders"));
        assert!(!matches_prefix("/order", "/orders"));
    }
}
