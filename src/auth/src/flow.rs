// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! OAuth 2.0 Authorization Code flow.
//!
//! [Flow] obtains user [Credentials] for an application registered with
//! Google. The application needs a [client secrets] file, which is
//! downloaded from the Google Cloud console.
//!
//! The flow has three steps:
//!
//! 1. Send the user to [Flow::authorization_url]. The user logs in and
//!    grants the application access.
//! 1. The authorization server redirects the user back to the application
//!    with an authorization code, which [Flow::fetch_token] exchanges for an
//!    access token and a refresh token.
//! 1. [Flow::credentials] returns user credentials built from the tokens.
//!
//! ```no_run
//! # use google_cloud_adc::flow::{AuthorizationGrant, Flow};
//! # tokio_test::block_on(async {
//! let mut flow = Flow::from_client_secrets_file(
//!     "client_secrets.json",
//!     ["https://www.googleapis.com/auth/userinfo.email"],
//! )
//! .await?
//! .with_redirect_uri("urn:ietf:wg:oauth:2.0:oob");
//! let (url, _state) = flow.authorization_url(&[("prompt", "consent")])?;
//! println!("Please go to this URL: {url}");
//!
//! let code = "the code the user received";
//! flow.fetch_token(AuthorizationGrant::Code(code.to_string())).await?;
//! let credentials = flow.credentials()?;
//! # Ok::<(), google_cloud_adc::flow::Error>(())
//! # });
//! ```
//!
//! [InstalledAppFlow] runs the whole flow for command-line applications.
//!
//! [client secrets]: https://developers.google.com/api-client-library/dotnet/guide/aaa_client_secrets

mod installed;

pub use installed::{InstalledAppFlow, Strategy};

use crate::credentials::{Credentials, user_account};
use crate::errors::{self, CredentialsError};
use crate::token::Token;
use http::HeaderMap;
use rand::Rng;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `Result` alias where the `Err` case is [Error].
pub type Result<T> = std::result::Result<T, Error>;

const STATE_LENGTH: usize = 30;

/// An error running the OAuth 2.0 flow.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// The client secrets are not valid.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self.0, ErrorKind::InvalidConfig(_))
    }

    /// The client secrets file could not be read or parsed.
    pub fn is_loading(&self) -> bool {
        matches!(self.0, ErrorKind::Loading { .. })
    }

    /// The `state` in the authorization response is not the one sent.
    pub fn is_state_mismatch(&self) -> bool {
        matches!(self.0, ErrorKind::StateMismatch)
    }

    /// The authorization server rejected the request, or its response has no
    /// authorization code.
    pub fn is_authorization(&self) -> bool {
        matches!(self.0, ErrorKind::Authorization(_))
    }

    /// No token has been fetched yet.
    pub fn is_missing_token(&self) -> bool {
        matches!(self.0, ErrorKind::MissingToken)
    }

    /// Fetching or using a token failed.
    pub fn is_token(&self) -> bool {
        matches!(self.0, ErrorKind::Token(_))
    }

    /// A local I/O problem, e.g. reading the console or listening for the
    /// redirect.
    pub fn is_io(&self) -> bool {
        matches!(self.0, ErrorKind::Io(_))
    }

    pub(crate) fn invalid_config<T: Into<String>>(message: T) -> Error {
        Error(ErrorKind::InvalidConfig(message.into()))
    }

    pub(crate) fn authorization<T: Into<String>>(message: T) -> Error {
        Error(ErrorKind::Authorization(message.into()))
    }

    pub(crate) fn io(source: std::io::Error) -> Error {
        Error(ErrorKind::Io(source))
    }

    fn loading<T: Into<BoxError>>(path: &Path, source: T) -> Error {
        Error(ErrorKind::Loading {
            path: path.display().to_string(),
            source: source.into(),
        })
    }

    fn token(source: CredentialsError) -> Error {
        Error(ErrorKind::Token(source))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot load client secrets from {path}: {source}")]
    Loading {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("the state in the authorization response does not match the state in the request")]
    StateMismatch,
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("no access token is available, fetch a token first")]
    MissingToken,
    #[error(transparent)]
    Token(CredentialsError),
    #[error("local I/O error during the authorization flow: {0}")]
    Io(#[source] std::io::Error),
}

/// The kind of OAuth client in a client secrets file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientType {
    /// A web application, the secrets are under a `web` key.
    Web,
    /// An installed application, the secrets are under an `installed` key.
    Installed,
}

/// The OAuth client configuration from a client secrets file.
#[derive(Clone, PartialEq, serde::Deserialize)]
pub struct ClientConfig {
    /// The OAuth client id.
    pub client_id: String,
    /// The OAuth client secret.
    pub client_secret: String,
    /// The authorization endpoint.
    pub auth_uri: String,
    /// The token endpoint.
    pub token_uri: String,
    /// The redirect URIs registered for the client.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// The project that owns the client.
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uris", &self.redirect_uris)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// How the application received the authorization code.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthorizationGrant {
    /// The authorization code itself, e.g. pasted by the user.
    Code(String),
    /// The full redirect URL the authorization server sent the user to.
    ///
    /// The `state` parameter in the URL is checked against the state of the
    /// flow.
    AuthorizationResponse(String),
}

/// The tokens returned by the token endpoint.
#[derive(Clone, PartialEq, serde::Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// The token type, usually `Bearer`.
    pub token_type: String,
    /// The lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// The refresh token, returned when offline access was requested.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// The scopes granted, separated by spaces.
    #[serde(default)]
    pub scope: Option<String>,
    /// An OpenID Connect ID token, if requested.
    #[serde(default)]
    pub id_token: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let censor = |v: &Option<String>| v.as_ref().map(|_| "[censored]");
        f.debug_struct("TokenResponse")
            .field("access_token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &censor(&self.refresh_token))
            .field("scope", &self.scope)
            .field("id_token", &censor(&self.id_token))
            .finish()
    }
}

/// Runs the OAuth 2.0 Authorization Code flow.
#[derive(Debug)]
pub struct Flow {
    client_type: ClientType,
    client_config: ClientConfig,
    scopes: Vec<String>,
    redirect_uri: Option<String>,
    state: Option<String>,
    client: reqwest::Client,
    token: Option<(TokenResponse, Token)>,
}

impl Flow {
    /// Creates a flow from the contents of a client secrets file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration has no `web` or `installed`
    /// object, or if that object is missing required fields.
    pub fn from_client_config<I, S>(client_config: Value, scopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (client_type, config) = if let Some(web) = client_config.get("web") {
            (ClientType::Web, web)
        } else if let Some(installed) = client_config.get("installed") {
            (ClientType::Installed, installed)
        } else {
            return Err(Error::invalid_config(
                "Client secrets must be for a web or installed app.",
            ));
        };
        let client_config = serde_json::from_value::<ClientConfig>(config.clone())
            .map_err(|e| Error::invalid_config(e.to_string()))?;
        Ok(Self {
            client_type,
            client_config,
            scopes: scopes.into_iter().map(Into::into).collect(),
            redirect_uri: None,
            state: None,
            client: reqwest::Client::new(),
            token: None,
        })
    }

    /// Creates a flow from a client secrets file.
    pub async fn from_client_secrets_file<P, I, S>(path: P, scopes: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| Error::loading(path, e))?;
        let config =
            serde_json::from_slice::<Value>(&contents).map_err(|e| Error::loading(path, e))?;
        Self::from_client_config(config, scopes)
    }

    /// Sets the redirect URI sent to the authorization server.
    pub fn with_redirect_uri<S: Into<String>>(mut self, redirect_uri: S) -> Self {
        self.set_redirect_uri(redirect_uri);
        self
    }

    /// Uses `state` instead of a random value in the authorization request.
    pub fn with_state<S: Into<String>>(mut self, state: S) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Uses `client` to talk to the token endpoint.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Changes the redirect URI.
    pub fn set_redirect_uri<S: Into<String>>(&mut self, redirect_uri: S) {
        self.redirect_uri = Some(redirect_uri.into());
    }

    /// The redirect URI, if set.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// The kind of client in the configuration.
    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    /// The client configuration.
    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    /// The scopes requested.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The tokens from the last successful [fetch_token][Flow::fetch_token].
    pub fn token_response(&self) -> Option<&TokenResponse> {
        self.token.as_ref().map(|(response, _)| response)
    }

    /// Generates the URL of the authorization page.
    ///
    /// Offline access is always requested, so the token endpoint returns a
    /// refresh token. `params` are added to the URL, replacing any parameter
    /// with the same name.
    ///
    /// Returns the URL and the `state` sent with it. The state is random
    /// unless it was set with [with_state][Flow::with_state].
    pub fn authorization_url(&mut self, params: &[(&str, &str)]) -> Result<(String, String)> {
        let state = self.state.clone().unwrap_or_else(generate_state);
        self.state = Some(state.clone());

        let mut url = Url::parse(&self.client_config.auth_uri)
            .map_err(|e| Error::invalid_config(format!("invalid auth_uri: {e}")))?;
        let scope = self.scopes.join(" ");
        let mut query = vec![
            ("response_type", "code"),
            ("client_id", self.client_config.client_id.as_str()),
        ];
        if let Some(redirect_uri) = &self.redirect_uri {
            query.push(("redirect_uri", redirect_uri.as_str()));
        }
        query.push(("scope", scope.as_str()));
        query.push(("state", state.as_str()));
        query.push(("access_type", "offline"));
        query.retain(|(k, _)| !params.iter().any(|(p, _)| p == k));
        query.extend(params.iter().copied());

        url.query_pairs_mut().extend_pairs(query);
        Ok((url.into(), state))
    }

    /// Exchanges the authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization response carries an error, has
    /// no code, or has the wrong state, and if the token endpoint rejects the
    /// exchange.
    pub async fn fetch_token(&mut self, grant: AuthorizationGrant) -> Result<TokenResponse> {
        let code = match grant {
            AuthorizationGrant::Code(code) => code,
            AuthorizationGrant::AuthorizationResponse(response) => self.code_from(&response)?,
        };

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", self.client_config.client_id.as_str()),
            ("client_secret", self.client_config.client_secret.as_str()),
        ];
        if let Some(redirect_uri) = &self.redirect_uri {
            form.push(("redirect_uri", redirect_uri.as_str()));
        }

        let error_message = "failed to exchange the authorization code";
        let response = self
            .client
            .post(self.client_config.token_uri.as_str())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::token(errors::from_http_error(e, error_message)))?;
        if !response.status().is_success() {
            let err = errors::from_http_response(response, error_message).await;
            return Err(Error::token(err));
        }
        let token_response = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::token(errors::non_retryable(e)))?;

        let token = Token {
            token: token_response.access_token.clone(),
            token_type: token_response.token_type.clone(),
            expires_at: token_response
                .expires_in
                .map(|d| Instant::now() + Duration::from_secs(d)),
            metadata: None,
        };
        self.token = Some((token_response.clone(), token));
        Ok(token_response)
    }

    fn code_from(&self, authorization_response: &str) -> Result<String> {
        let url = Url::parse(authorization_response)
            .map_err(|e| Error::authorization(format!("invalid authorization response: {e}")))?;
        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut description = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "code" => code = Some(v.into_owned()),
                "state" => state = Some(v.into_owned()),
                "error" => error = Some(v.into_owned()),
                "error_description" => description = Some(v.into_owned()),
                _ => {}
            }
        }
        if let Some(error) = error {
            return Err(Error::authorization(match description {
                Some(d) => format!("{error}: {d}"),
                None => error,
            }));
        }
        if self.state.is_some() && state != self.state {
            return Err(Error(ErrorKind::StateMismatch));
        }
        code.ok_or_else(|| Error::authorization("the authorization response has no code"))
    }

    /// Returns user credentials for the fetched tokens.
    ///
    /// The credentials use the access token until it expires, and then the
    /// refresh token, if any.
    pub fn credentials(&self) -> Result<Credentials> {
        let Some((response, token)) = &self.token else {
            return Err(Error(ErrorKind::MissingToken));
        };
        let mut authorized_user = serde_json::json!({
            "client_id": self.client_config.client_id,
            "client_secret": self.client_config.client_secret,
            "token_uri": self.client_config.token_uri,
        });
        if let Some(refresh_token) = &response.refresh_token {
            authorized_user["refresh_token"] = Value::from(refresh_token.as_str());
        }
        user_account::Builder::new(authorized_user)
            .with_access_token(token.clone())
            .with_scopes(self.scopes.clone())
            .build()
            .map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Returns the headers to authorize a request with the fetched tokens.
    pub async fn authorized_headers(&self) -> Result<HeaderMap> {
        self.credentials()?.headers().await.map_err(Error::token)
    }
}

fn generate_state() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
