//! OAuth callback parameters and the page location they arrive on.

use url::Url;

use crate::error::Result;

/// Query parameters removed from the visible location once handled.
pub const OAUTH_PARAMS: [&str; 7] = [
    "code",
    "error",
    "error_description",
    "state",
    "scope",
    "authuser",
    "prompt",
];

/// Parameters read once from the callback URL. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub state: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            let slot = match &*key {
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                "state" => &mut params.state,
                _ => continue,
            };
            // First occurrence wins, empty values count as absent.
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Where the UI should go after a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Profile,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Profile => "/profile",
        }
    }
}

/// The current page location, standing in for the browser address bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(input)?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn params(&self) -> CallbackParams {
        CallbackParams::from_url(&self.url)
    }

    pub fn has_oauth_params(&self) -> bool {
        self.url
            .query_pairs()
            .any(|(key, _)| OAUTH_PARAMS.contains(&&*key))
    }

    /// Drops the query and fragment if any OAuth parameter is present.
    ///
    /// Returns whether the location changed.
    pub fn strip_oauth_params(&mut self) -> bool {
        if !self.has_oauth_params() {
            return false;
        }
        self.url.set_query(None);
        self.url.set_fragment(None);
        log::debug!("Location cleaned from OAuth parameters");
        true
    }

    /// Replaces the path, keeping origin, as a history replace would.
    pub fn replace_path(&mut self, route: Route) {
        self.url.set_path(route.path());
        self.url.set_query(None);
        self.url.set_fragment(None);
    }
}
