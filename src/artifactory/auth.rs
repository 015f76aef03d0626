//! Artifactory Authentication
//!
//! Artifactory accepts an access token (bearer), a legacy API key header or
//! basic credentials. Credentials are supplied by [`crate::config::ProviderConfig`];
//! nothing here stores or refreshes them.

use reqwest::RequestBuilder;

/// Header carrying a legacy Artifactory API key
pub const API_KEY_HEADER: &str = "X-JFrog-Art-Api";

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    AccessToken(String),
    ApiKey(String),
    Basic { username: String, password: String },
    Anonymous,
}

impl Credentials {
    /// Pick credentials by priority: access token, API key, then username/password
    pub fn resolve(
        access_token: Option<&str>,
        api_key: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Self {
        let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(String::from);

        if let Some(token) = non_empty(access_token) {
            return Credentials::AccessToken(token);
        }
        if let Some(key) = non_empty(api_key) {
            return Credentials::ApiKey(key);
        }
        match (non_empty(username), non_empty(password)) {
            (Some(username), Some(password)) => Credentials::Basic { username, password },
            _ => Credentials::Anonymous,
        }
    }

    /// Attach these credentials to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::AccessToken(token) => request.bearer_auth(token),
            Credentials::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credentials::Anonymous => request,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::AccessToken(_) => "access token",
            Credentials::ApiKey(_) => "api key",
            Credentials::Basic { .. } => "basic",
            Credentials::Anonymous => "anonymous",
        }
    }
}

// Secrets never reach logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            other => write!(f, "Credentials({})", other.kind()),
        }
    }
}
