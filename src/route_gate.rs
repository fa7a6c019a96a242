//! Route classification and gating decisions
//!
//! Every request path is classified against two static allow-lists (public pages and
//! public API routes); the gate then decides, from that class and the presence of a
//! signed-in user, whether the request passes or is redirected.
//!
//! Anonymous requests to public pages and public API routes pass through. Only
//! protected paths send an anonymous user to the sign-in page.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::GateConfig;

lazy_static! {
    // API and RPC paths are always gated, even when they look like files
    static ref ALWAYS_GATED: Regex = Regex::new(r"^/(api|trpc)(/|$)").expect("static regex");
}

const FRAMEWORK_PREFIX: &str = "/_next";
const WILDCARD: &str = "(.*)";

/// Category of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    PublicPage,
    PublicApi,
    Protected,
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    /// Signed-in user sent to the landing page
    RedirectToLanding(String),
    /// Anonymous user sent to the sign-in page
    RedirectToSignIn(String),
}

impl GateDecision {
    pub fn location(&self) -> Option<&str> {
        match self {
            GateDecision::PassThrough => None,
            GateDecision::RedirectToLanding(path) | GateDecision::RedirectToSignIn(path) => {
                Some(path)
            }
        }
    }
}

/// Matches paths against a list of route patterns
///
/// A pattern is a literal path, optionally ending in `(.*)` to match any
/// remainder. Matching is on the whole path and tolerates a trailing slash.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    patterns: Vec<Regex>,
}

impl RouteMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Regex::new(&pattern_to_regex(pattern.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

fn pattern_to_regex(pattern: &str) -> String {
    let (literal, wildcard) = match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => (prefix, true),
        None => (pattern, false),
    };
    let literal = literal.trim_end_matches('/');
    let tail = if wildcard { "(.*)" } else { "/?" };
    format!("^{}{}$", regex::escape(literal), tail)
}

/// Drops a trailing slash, keeping the root path intact
fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Decides pass-through or redirect for each request
#[derive(Debug, Clone)]
pub struct RouteGate {
    landing_path: String,
    sign_in_path: String,
    public_pages: RouteMatcher,
    public_api: RouteMatcher,
}

impl RouteGate {
    pub fn from_config(config: &GateConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            landing_path: normalize(&config.landing_path).to_string(),
            sign_in_path: normalize(&config.sign_in_path).to_string(),
            public_pages: RouteMatcher::new(&config.public_pages)?,
            public_api: RouteMatcher::new(&config.public_api)?,
        })
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Whether the gate runs at all for this path
    ///
    /// Static assets (any path containing a dot) and framework internals are
    /// skipped; the root and everything under `/api` or `/trpc` are always gated.
    pub fn applies_to(&self, path: &str) -> bool {
        if path == "/" || ALWAYS_GATED.is_match(path) {
            return true;
        }
        !(path.contains('.') || path.starts_with(FRAMEWORK_PREFIX))
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public_pages.matches(path) {
            RouteClass::PublicPage
        } else if self.public_api.matches(path) {
            RouteClass::PublicApi
        } else {
            RouteClass::Protected
        }
    }

    pub fn decide(&self, path: &str, user_id: Option<&str>) -> GateDecision {
        if !self.applies_to(path) {
            return GateDecision::PassThrough;
        }

        match (user_id, self.classify(path)) {
            (Some(_), RouteClass::PublicPage) if normalize(path) != self.landing_path => {
                GateDecision::RedirectToLanding(self.landing_path.clone())
            }
            // The sign-in page is always reachable, even when not listed as public
            (None, RouteClass::Protected) if normalize(path) != self.sign_in_path => {
                GateDecision::RedirectToSignIn(self.sign_in_path.clone())
            }
            _ => GateDecision::PassThrough,
        }
    }
}
