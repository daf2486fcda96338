//! Static route classification.
//!
//! Every flag is a case-sensitive prefix match evaluated independently, so a
//! path may fall into several categories at once. Precedence between them is
//! the decider's job.

use std::borrow::Cow;

/// Prefix tables used to classify request paths. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    api_prefix: Cow<'static, str>,
    public_prefixes: Vec<Cow<'static, str>>,
    auth_only_prefixes: Vec<Cow<'static, str>>,
    onboarding_prefix: Cow<'static, str>,
}

/// Categories a path belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteClassification {
    pub is_public: bool,
    pub is_auth_only: bool,
    pub is_onboarding: bool,
    pub is_api: bool,
}

const REFERENCE_UNAUTHENTICATED: [&str; 4] =
    ["/login", "/register", "/forgot-password", "/reset-password"];

impl RouteTable {
    pub fn new(
        api_prefix: impl Into<Cow<'static, str>>,
        public_prefixes: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
        auth_only_prefixes: impl IntoIterator<Item = impl Into<Cow<'static, str>>>,
        onboarding_prefix: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            public_prefixes: public_prefixes.into_iter().map(Into::into).collect(),
            auth_only_prefixes: auth_only_prefixes.into_iter().map(Into::into).collect(),
            onboarding_prefix: onboarding_prefix.into(),
        }
    }

    /// The dashboard's route layout.
    ///
    /// Public and auth-only tables hold the same entries here but are kept as
    /// separate sets.
    pub fn reference() -> Self {
        Self::new(
            "/api",
            REFERENCE_UNAUTHENTICATED,
            REFERENCE_UNAUTHENTICATED,
            "/onboarding",
        )
    }

    pub fn classify(&self, path: &str) -> RouteClassification {
        RouteClassification {
            is_public: any_prefix(&self.public_prefixes, path),
            is_auth_only: any_prefix(&self.auth_only_prefixes, path),
            is_onboarding: path.starts_with(self.onboarding_prefix.as_ref()),
            is_api: path.starts_with(self.api_prefix.as_ref()),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::reference()
    }
}

fn any_prefix(prefixes: &[Cow<'static, str>], path: &str) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_ref()))
}

/// Canonical form of a request path.
///
/// Empty segments collapse, `.` is dropped and `..` pops the previous
/// segment (never above the root). Backslashes and percent-encoded dots are
/// treated the way browsers and proxies treat them. The result always starts
/// with exactly one `/`.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" => {}
            s if is_dot(s) => {}
            s if is_dot_dot(s) => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

fn is_dot(segment: &str) -> bool {
    segment == "." || segment.eq_ignore_ascii_case("%2e")
}

fn is_dot_dot(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        ".." | ".%2e" | "%2e." | "%2e%2e"
    )
}
