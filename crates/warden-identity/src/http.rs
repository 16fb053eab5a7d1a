//! HTTP client for the identity authority.

use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use warden_protocol::{Credentials, LoginGrant, User};

use crate::{IdentityClient, IdentityConfig, IdentityError, LoginExchange};

/// ngrok tunnels interpose a browser warning page unless told not to.
const NGROK_SKIP_HEADER: &str = "ngrok-skip-browser-warning";

/// Talks to the identity authority over HTTP(S).
///
/// Implements both [`IdentityClient`] (`GET {base}{me_path}` with a bearer
/// token) and [`LoginExchange`] (`POST {base}{login_path}` with a JSON
/// credential body). Cheap to clone: clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    me_url: Url,
    refresh_url: Url,
    login_url: Url,
    ngrok: bool,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl HttpIdentityClient {
    /// Builds a client from the given config.
    ///
    /// # Errors
    /// [`IdentityError::InvalidConfig`] if the base URL doesn't parse or the
    /// underlying HTTP client can't be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            IdentityError::InvalidConfig(format!("base url {:?}: {e}", config.base_url))
        })?;
        let ngrok = base.host_str().is_some_and(|host| host.contains("ngrok"));

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IdentityError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            me_url: endpoint(&config.base_url, &config.me_path)?,
            refresh_url: endpoint(&config.base_url, config.refresh_path())?,
            login_url: endpoint(&config.base_url, &config.login_path)?,
            ngrok,
        })
    }

    pub fn me_url(&self) -> &Url {
        &self.me_url
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    async fn lookup(&self, url: &Url, token: &str) -> Result<User, IdentityError> {
        let response = self
            .decorate(self.client.get(url.clone()))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "identity authority rejected token");
            return Err(IdentityError::Unauthorized {
                status: status.as_u16(),
            });
        }

        response
            .json::<User>()
            .await
            .map_err(|e| IdentityError::Unreachable(format!("unreadable user payload: {e}")))
    }

    /// Sends the ngrok header regardless of host, so it can be checked
    /// against a local server.
    #[cfg(test)]
    fn with_ngrok_header(mut self) -> Self {
        self.ngrok = true;
        self
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        if self.ngrok {
            request.header(NGROK_SKIP_HEADER, "true")
        } else {
            request
        }
    }
}

impl IdentityClient for HttpIdentityClient {
    async fn fetch_current_user(&self, token: &str) -> Result<User, IdentityError> {
        self.lookup(&self.me_url, token).await
    }

    async fn refresh_current_user(&self, token: &str) -> Result<User, IdentityError> {
        self.lookup(&self.refresh_url, token).await
    }
}

impl LoginExchange for HttpIdentityClient {
    async fn exchange(&self, credentials: &Credentials) -> Result<LoginGrant, IdentityError> {
        let body = LoginBody {
            email: &credentials.identifier,
            password: &credentials.secret,
        };
        let response = self
            .decorate(self.client.post(self.login_url.clone()))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(IdentityError::Unreachable(format!(
                "identity authority failed with HTTP {status}"
            )));
        }
        if !status.is_success() {
            tracing::debug!(%status, "identity authority rejected credentials");
            return Err(IdentityError::Unauthorized {
                status: status.as_u16(),
            });
        }

        response
            .json::<LoginGrant>()
            .await
            .map_err(|e| IdentityError::Unreachable(format!("unreadable login payload: {e}")))
    }
}

/// Appends `path` to `base` verbatim so a base path prefix survives.
/// (`Url::join` would replace it for absolute paths.)
fn endpoint(base: &str, path: &str) -> Result<Url, IdentityError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| IdentityError::InvalidConfig(format!("{joined:?}: {e}")))
}

fn transport_error(e: reqwest::Error) -> IdentityError {
    tracing::debug!(error = %e, "identity authority request failed");
    if e.is_timeout() {
        return IdentityError::Unreachable("request timed out".to_string());
    }
    IdentityError::Unreachable(e.to_string())
}
