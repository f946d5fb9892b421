/*
 * Responsibility
 * - Handler / audit から見える「認証済み主体」と request-scoped な security context の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークン検証・Basic 認証は middleware/services 側の責務
 * - context はリクエストごとに作られ、リクエスト終了とともに捨てられる (global state は持たない)
 */
use std::collections::BTreeSet;

/// Authenticated caller of the current request.
///
/// - `username` is the subject the credentials (token or Basic) were issued for
/// - `authorities` are kept sorted so audit output and scope claims are stable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub authorities: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(username: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// `has_role("ADMIN")` and `has_role("ROLE_ADMIN")` are equivalent.
    pub fn has_role(&self, role: &str) -> bool {
        if role.starts_with("ROLE_") {
            self.has_authority(role)
        } else {
            self.has_authority(&format!("ROLE_{role}"))
        }
    }
}

/// Per-request holder of "who is currently authenticated".
///
/// Holds at most one principal; once set it is never replaced for the same request.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Populates the context. Returns `false` (and keeps the existing principal)
    /// when the context was already populated.
    pub fn authenticate(&mut self, principal: Principal) -> bool {
        if self.principal.is_some() {
            return false;
        }
        self.principal = Some(principal);
        true
    }
}
