//! Request authorization: session state + route classification -> allow or redirect.
//!
//! - No IO
//! - No panics
//! - Single pass, first matching rule wins

use std::borrow::Cow;

use serde::Serialize;

use crate::claims::SessionClaims;
use crate::routes::{RouteClassification, RouteTable, normalize_path};

pub const CALLBACK_URL_PARAM: &str = "callbackUrl";

/// Where forced redirects send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub login: Cow<'static, str>,
    pub onboarding: Cow<'static, str>,
    pub dashboard_home: Cow<'static, str>,
}

impl RedirectTargets {
    pub fn reference() -> Self {
        Self {
            login: Cow::Borrowed("/login"),
            onboarding: Cow::Borrowed("/onboarding"),
            dashboard_home: Cow::Borrowed("/dashboard"),
        }
    }
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self::reference()
    }
}

/// Session state as seen by the decider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { onboarded: bool },
}

impl SessionState {
    pub fn from_claims(claims: Option<&SessionClaims>) -> Self {
        match claims {
            Some(claims) => Self::Authenticated {
                onboarded: claims.onboarding_completed,
            },
            None => Self::Anonymous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub callback_url: Option<String>,
}

impl Redirect {
    fn to(target: &str) -> Self {
        Self {
            target: target.to_string(),
            callback_url: None,
        }
    }

    /// Value for the `Location` header.
    ///
    /// The callback is query-encoded segment by segment so `/` stays readable.
    pub fn location(&self) -> String {
        match &self.callback_url {
            None => self.target.clone(),
            Some(callback) => {
                let encoded = callback
                    .split('/')
                    .map(|segment| urlencoding::encode(segment).into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                let separator = if self.target.contains('?') { '&' } else { '?' };
                format!("{}{separator}{CALLBACK_URL_PARAM}={encoded}", self.target)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Allow,
    Redirect(Redirect),
}

impl AuthorizationOutcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The precedence rule that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    ApiPassthrough,
    SignedInOnAuthOnlyRoute,
    PublicRoute,
    SignInRequired,
    OnboardingRequired,
    OnboardingAlreadyCompleted,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub outcome: AuthorizationOutcome,
    pub rule: DecisionRule,
}

impl Decision {
    fn allow(rule: DecisionRule) -> Self {
        Self {
            outcome: AuthorizationOutcome::Allow,
            rule,
        }
    }

    fn redirect(rule: DecisionRule, redirect: Redirect) -> Self {
        Self {
            outcome: AuthorizationOutcome::Redirect(redirect),
            rule,
        }
    }
}

/// Decide the outcome for one request.
///
/// Rule order is significant: the signed-in/auth-only check must run before
/// the public-route check, because the two prefix sets may coincide.
pub fn decide(
    session: SessionState,
    route: RouteClassification,
    path: &str,
    targets: &RedirectTargets,
) -> Decision {
    if route.is_api {
        return Decision::allow(DecisionRule::ApiPassthrough);
    }

    if let SessionState::Authenticated { onboarded } = session {
        if route.is_auth_only {
            let target = if onboarded {
                &targets.dashboard_home
            } else {
                &targets.onboarding
            };
            return Decision::redirect(DecisionRule::SignedInOnAuthOnlyRoute, Redirect::to(target));
        }
    }

    if route.is_public {
        return Decision::allow(DecisionRule::PublicRoute);
    }

    let onboarded = match session {
        SessionState::Anonymous => {
            return Decision::redirect(
                DecisionRule::SignInRequired,
                Redirect {
                    target: targets.login.to_string(),
                    callback_url: Some(path.to_string()),
                },
            );
        }
        SessionState::Authenticated { onboarded } => onboarded,
    };

    match (onboarded, route.is_onboarding) {
        (false, false) => Decision::redirect(
            DecisionRule::OnboardingRequired,
            Redirect::to(&targets.onboarding),
        ),
        (true, true) => Decision::redirect(
            DecisionRule::OnboardingAlreadyCompleted,
            Redirect::to(&targets.dashboard_home),
        ),
        _ => Decision::allow(DecisionRule::Default),
    }
}

/// Route table + redirect targets, shared read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    routes: RouteTable,
    targets: RedirectTargets,
}

impl Authorizer {
    pub fn new(routes: RouteTable, targets: RedirectTargets) -> Self {
        Self { routes, targets }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide for a raw request path. The path is normalized first, so the
    /// classification and the callback both see its canonical form.
    pub fn authorize(&self, path: &str, session: Option<&SessionClaims>) -> Decision {
        let path = normalize_path(path);
        decide(
            SessionState::from_claims(session),
            self.routes.classify(&path),
            &path,
            &self.targets,
        )
    }
}
