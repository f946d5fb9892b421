/*
 * Responsibility
 * - URL pattern → 必要な認証状態 / role の宣言的なルール表
 * - management plane (/actuator/ 配下) と application plane の 2 chain を順番に評価する
 *
 * Notes
 * - chain ごとに認証方式が異なる (Basic vs Bearer)。信頼ドメインを混ぜない
 * - ルールは上から順に評価し、最初に match したものが勝つ
 */
use crate::api::extractors::SecurityContext;

/// `/actuator/info` (exact) or `/actuator/**` (the prefix itself and anything below it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => match path.strip_prefix(p.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/') || p.is_empty(),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    Authenticated,
    /// Role name with or without the `ROLE_` prefix.
    HasRole(String),
}

static AUTHENTICATED: Access = Access::Authenticated;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Unauthenticated,
    Forbidden,
}

impl Access {
    pub fn evaluate(&self, ctx: &SecurityContext) -> Decision {
        match (self, ctx.principal()) {
            (Access::PermitAll, _) => Decision::Permit,
            (_, None) => Decision::Unauthenticated,
            (Access::Authenticated, Some(_)) => Decision::Permit,
            (Access::HasRole(role), Some(p)) if p.has_role(role) => Decision::Permit,
            (Access::HasRole(_), Some(_)) => Decision::Forbidden,
        }
    }
}

/// How a chain establishes who the caller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// `Authorization: Bearer <jwt>` against application users.
    Bearer,
    /// `Authorization: Basic ...` against the management user.
    Basic,
}

#[derive(Debug, Clone)]
pub struct FilterChain {
    name: &'static str,
    scope: PathPattern,
    mechanism: Mechanism,
    rules: Vec<(PathPattern, Access)>,
}

impl FilterChain {
    pub fn new(name: &'static str, scope: &str, mechanism: Mechanism) -> Self {
        Self {
            name,
            scope: PathPattern::parse(scope),
            mechanism,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, pattern: &str, access: Access) -> Self {
        self.rules.push((PathPattern::parse(pattern), access));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    pub fn applies_to(&self, path: &str) -> bool {
        self.scope.matches(path)
    }

    /// First matching rule; paths no rule covers require authentication.
    pub fn access_for(&self, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, access)| access)
            .unwrap_or(&AUTHENTICATED)
    }
}

#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    chains: Vec<FilterChain>,
}

impl SecurityPolicy {
    pub fn new(chains: Vec<FilterChain>) -> Self {
        Self { chains }
    }

    /// Management plane first, then the application plane.
    pub fn standard() -> Self {
        let management = FilterChain::new("management", "/actuator/**", Mechanism::Basic)
            .rule("/actuator/health", Access::PermitAll)
            .rule("/actuator/health/**", Access::PermitAll)
            .rule("/actuator/info", Access::PermitAll)
            .rule("/actuator/**", Access::HasRole("ACTUATOR_ADMIN".to_string()));

        let application = FilterChain::new("application", "/**", Mechanism::Bearer)
            .rule("/api/public/info", Access::PermitAll)
            .rule("/auth/login", Access::PermitAll)
            .rule("/**", Access::Authenticated);

        Self::new(vec![management, application])
    }

    pub fn chain_for(&self, path: &str) -> Option<&FilterChain> {
        self.chains.iter().find(|chain| chain.applies_to(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::extractors::Principal;

    fn ctx_with(authorities: &[&str]) -> SecurityContext {
        let mut ctx = SecurityContext::new();
        ctx.authenticate(Principal::new("someone", authorities.iter().copied()));
        ctx
    }

    #[test]
    fn prefix_pattern_matches_itself_and_children_only() {
        let p = PathPattern::parse("/actuator/**");
        assert!(p.matches("/actuator"));
        assert!(p.matches("/actuator/prometheus"));
        assert!(p.matches("/actuator/health/liveness"));
        assert!(!p.matches("/actuatorx"));
        assert!(!p.matches("/api/actuator"));
    }

    #[test]
    fn root_wildcard_matches_everything() {
        let p = PathPattern::parse("/**");
        assert!(p.matches("/"));
        assert!(p.matches("/anything/at/all"));
    }

    #[test]
    fn management_paths_go_to_the_management_chain() {
        let policy = SecurityPolicy::standard();
        let chain = policy.chain_for("/actuator/prometheus").unwrap();
        assert_eq!(chain.name(), "management");
        assert_eq!(chain.mechanism(), Mechanism::Basic);

        let chain = policy.chain_for("/api/secure/data").unwrap();
        assert_eq!(chain.name(), "application");
        assert_eq!(chain.mechanism(), Mechanism::Bearer);
    }

    #[test]
    fn health_and_info_are_public_metrics_are_not() {
        let policy = SecurityPolicy::standard();
        let anon = SecurityContext::new();
        let chain = policy.chain_for("/actuator/health").unwrap();

        for path in ["/actuator/health", "/actuator/health/liveness", "/actuator/info"] {
            assert_eq!(chain.access_for(path).evaluate(&anon), Decision::Permit, "{path}");
        }
        assert_eq!(
            chain.access_for("/actuator/prometheus").evaluate(&anon),
            Decision::Unauthenticated
        );
        assert_eq!(
            chain
                .access_for("/actuator/prometheus")
                .evaluate(&ctx_with(&["ROLE_USER"])),
            Decision::Forbidden
        );
        assert_eq!(
            chain
                .access_for("/actuator/prometheus")
                .evaluate(&ctx_with(&["ROLE_ACTUATOR_ADMIN"])),
            Decision::Permit
        );
    }

    #[test]
    fn application_rules_are_first_match_wins() {
        let policy = SecurityPolicy::standard();
        let chain = policy.chain_for("/api/secure/admin").unwrap();
        let user = ctx_with(&["ROLE_USER", "read", "write"]);
        let anon = SecurityContext::new();

        assert_eq!(chain.access_for("/auth/login").evaluate(&anon), Decision::Permit);
        assert_eq!(chain.access_for("/api/public/info").evaluate(&anon), Decision::Permit);
        assert_eq!(
            chain.access_for("/api/secure/data").evaluate(&anon),
            Decision::Unauthenticated
        );
        assert_eq!(chain.access_for("/api/secure/data").evaluate(&user), Decision::Permit);
        // the admin role is checked by the handler, behind the audit layer
        assert_eq!(chain.access_for("/api/secure/admin").evaluate(&user), Decision::Permit);
        assert_eq!(
            chain.access_for("/api/secure/admin").evaluate(&anon),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn uncovered_paths_require_authentication() {
        let chain = FilterChain::new("empty", "/**", Mechanism::Bearer);
        assert_eq!(chain.access_for("/whatever"), &Access::Authenticated);
    }
}
