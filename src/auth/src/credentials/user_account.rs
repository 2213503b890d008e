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

//! [User Account] Credentials type.
//!
//! User accounts represent a developer, administrator, or any other person who
//! interacts with Google APIs and services. This module provides
//! [Credentials] derived from user account information, specifically an
//! OAuth 2.0 refresh token obtained via the [Authorization Code grant].
//!
//! These credentials are found automatically when a file created by
//! `gcloud auth application-default login` is in the standard search path.
//! They are also the result of completing an [OAuth 2.0 flow](crate::flow).
//!
//! ```
//! # use google_cloud_adc::credentials::user_account::Builder;
//! # use google_cloud_adc::credentials::Credentials;
//! let authorized_user = serde_json::json!({
//!     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
//!     "client_secret": "YOUR_CLIENT_SECRET",
//!     "refresh_token": "YOUR_REFRESH_TOKEN",
//!     "type": "authorized_user",
//! });
//! let credentials: Credentials = Builder::new(authorized_user).build()?;
//! # Ok::<(), google_cloud_adc::errors::DefaultCredentialsError>(())
//! ```
//!
//! [Authorization Code grant]: https://tools.ietf.org/html/rfc6749#section-1.3.1
//! [User Account]: https://cloud.google.com/docs/authentication#user-accounts

use crate::build_errors::{self, Error as BuildError};
use crate::constants::OAUTH2_TOKEN_ENDPOINT;
use crate::credentials::{Credentials, CredentialsProvider, Result};
use crate::errors::{self, CredentialsError};
use crate::headers_util::build_bearer_headers;
use crate::token::{Token, TokenProvider};
use http::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

const KIND: &str = "authorized user";

/// A builder for `user_account` [Credentials].
pub struct Builder {
    authorized_user: Value,
    scopes: Option<Vec<String>>,
    quota_project_id: Option<String>,
    token_uri: Option<String>,
    access_token: Option<Token>,
}

impl Builder {
    /// Creates a new builder using an `authorized_user` JSON value.
    pub fn new(authorized_user: Value) -> Self {
        Self {
            authorized_user,
            scopes: None,
            quota_project_id: None,
            token_uri: None,
            access_token: None,
        }
    }

    /// Sets the URI for the token endpoint used to refresh access tokens.
    ///
    /// Overrides any `token_uri` in the JSON. Defaults to
    /// `https://oauth2.googleapis.com/token`.
    pub fn with_token_uri<S: Into<String>>(mut self, token_uri: S) -> Self {
        self.token_uri = Some(token_uri.into());
        self
    }

    /// Sets the [scopes] requested when refreshing access tokens.
    ///
    /// [scopes]: https://developers.google.com/identity/protocols/oauth2/scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(|s| s.into()).collect());
        self
    }

    /// Sets the [quota project] for these credentials.
    ///
    /// Overrides any `quota_project_id` in the JSON.
    ///
    /// [quota project]: https://cloud.google.com/docs/quotas/quota-project
    pub fn with_quota_project_id<S: Into<String>>(mut self, quota_project_id: S) -> Self {
        self.quota_project_id = Some(quota_project_id.into());
        self
    }

    /// Starts the credentials with an access token obtained elsewhere.
    ///
    /// The token is used until it expires. With an access token the
    /// `refresh_token` field becomes optional, but without it the credentials
    /// stop working once the token expires.
    pub fn with_access_token(mut self, token: Token) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Returns a [Credentials] instance with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is missing `client_id` or
    /// `client_secret`, or is missing `refresh_token` and no access token was
    /// provided.
    pub fn build(self) -> build_errors::Result<Credentials> {
        let authorized_user =
            AuthorizedUser::from_value(&self.authorized_user, self.access_token.is_some())?;
        let endpoint = self
            .token_uri
            .or(authorized_user.token_uri)
            .unwrap_or_else(|| OAUTH2_TOKEN_ENDPOINT.to_string());
        let quota_project_id = self.quota_project_id.or(authorized_user.quota_project_id);

        let token_provider = UserTokenProvider {
            client_id: authorized_user.client_id,
            client_secret: authorized_user.client_secret,
            refresh_token: authorized_user.refresh_token,
            endpoint,
            scopes: self.scopes.map(|scopes| scopes.join(" ")),
            access_token: self.access_token,
            client: Client::new(),
        };
        Ok(Credentials::from(UserCredentials {
            token_provider,
            quota_project_id,
        }))
    }
}

/// The fields of an `authorized_user` JSON object.
#[derive(Debug, PartialEq)]
struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    token_uri: Option<String>,
    quota_project_id: Option<String>,
}

impl AuthorizedUser {
    fn from_value(value: &Value, has_access_token: bool) -> build_errors::Result<Self> {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        let client_id = field("client_id");
        let client_secret = field("client_secret");
        let refresh_token = field("refresh_token");

        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push("client_id");
        }
        if client_secret.is_none() {
            missing.push("client_secret");
        }
        if refresh_token.is_none() && !has_access_token {
            missing.push("refresh_token");
        }
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) if missing.is_empty() => Ok(Self {
                client_id,
                client_secret,
                refresh_token,
                token_uri: field("token_uri"),
                quota_project_id: field("quota_project_id"),
            }),
            _ => Err(BuildError::missing_fields(KIND, missing)),
        }
    }
}

struct UserTokenProvider {
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    endpoint: String,
    scopes: Option<String>,
    access_token: Option<Token>,
    client: Client,
}

impl std::fmt::Debug for UserTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserTokenProvider")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[censored]"))
            .field("endpoint", &self.endpoint)
            .field("scopes", &self.scopes)
            .field("access_token", &self.access_token)
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for UserTokenProvider {
    async fn token(&self) -> Result<Token> {
        if let Some(token) = self.access_token.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.clone());
        }
        let Some(refresh_token) = &self.refresh_token else {
            return Err(errors::non_retryable_from_str(
                "the access token has expired and there is no refresh token",
            ));
        };

        let req = Oauth2RefreshRequest {
            grant_type: RefreshGrantType::RefreshToken,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: refresh_token.clone(),
            scope: self.scopes.clone(),
        };
        let error_message = "failed to refresh user access token";
        let resp = self
            .client
            .post(self.endpoint.as_str())
            .json(&req)
            .send()
            .await
            .map_err(|e| errors::from_http_error(e, error_message))?;
        if !resp.status().is_success() {
            return Err(errors::from_http_response(resp, error_message).await);
        }
        let response = resp.json::<Oauth2RefreshResponse>().await.map_err(|e| {
            let retryable = !e.is_decode();
            CredentialsError::from_source(retryable, e)
        })?;
        Ok(Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at: response
                .expires_in
                .map(|d| Instant::now() + Duration::from_secs(d)),
            metadata: None,
        })
    }
}

/// Credentials for a user account.
#[derive(Debug)]
pub(crate) struct UserCredentials<T>
where
    T: TokenProvider,
{
    token_provider: T,
    quota_project_id: Option<String>,
}

impl<T> CredentialsProvider for UserCredentials<T>
where
    T: TokenProvider,
{
    async fn token(&self) -> Result<Token> {
        self.token_provider.token().await
    }

    async fn headers(&self) -> Result<HeaderMap> {
        let token = self.token().await?;
        build_bearer_headers(&token, &self.quota_project_id)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
enum RefreshGrantType {
    #[serde(rename = "refresh_token")]
    RefreshToken,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
struct Oauth2RefreshRequest {
    grant_type: RefreshGrantType,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
struct Oauth2RefreshResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<u64>,
    token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers_util::QUOTA_PROJECT_KEY;
    use crate::token::tests::MockTokenProvider;
    use http::header::AUTHORIZATION;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;

    type TestResult = anyhow::Result<()>;

    fn authorized_user_json(token_uri: &str) -> Value {
        json!({
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
            "refresh_token": "test-refresh-token",
            "type": "authorized_user",
            "token_uri": token_uri,
        })
    }

    #[test]
    fn debug_token_provider() {
        let provider = UserTokenProvider {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            refresh_token: Some("test-refresh-token".to_string()),
            endpoint: OAUTH2_TOKEN_ENDPOINT.to_string(),
            scopes: Some("https://www.googleapis.com/auth/pubsub".to_string()),
            access_token: None,
            client: Client::new(),
        };
        let fmt = format!("{provider:?}");
        assert!(fmt.contains("test-client-id"), "{fmt}");
        assert!(!fmt.contains("test-client-secret"), "{fmt}");
        assert!(!fmt.contains("test-refresh-token"), "{fmt}");
        assert!(fmt.contains(OAUTH2_TOKEN_ENDPOINT), "{fmt}");
        assert!(fmt.contains("https://www.googleapis.com/auth/pubsub"), "{fmt}");
    }

    #[test]
    fn parse_full() {
        let json = json!({
            "account": "",
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
            "refresh_token": "test-refresh-token",
            "type": "authorized_user",
            "universe_domain": "googleapis.com",
            "quota_project_id": "test-project",
            "token_uri" : "test-token-uri",
        });
        let got = AuthorizedUser::from_value(&json, false).unwrap();
        let want = AuthorizedUser {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            refresh_token: Some("test-refresh-token".to_string()),
            token_uri: Some("test-token-uri".to_string()),
            quota_project_id: Some("test-project".to_string()),
        };
        assert_eq!(got, want);
    }

    #[test]
    fn missing_fields() {
        let json = json!({
            "client_secret": "test-client-secret",
            "type": "authorized_user",
        });
        let err = Builder::new(json).build().unwrap_err();
        assert!(err.is_missing_fields(), "{err:?}");
        let msg = err.to_string();
        assert!(msg.contains("authorized user"), "{msg}");
        assert!(msg.contains("missing fields client_id, refresh_token"), "{msg}");
    }

    #[test]
    fn non_string_fields_are_missing() {
        let json = json!({
            "client_id": 42,
            "client_secret": "test-client-secret",
            "refresh_token": "test-refresh-token",
        });
        let err = Builder::new(json).build().unwrap_err();
        assert!(err.to_string().contains("missing fields client_id"), "{err}");
    }

    #[test]
    fn refresh_token_optional_with_access_token() {
        let json = json!({
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
        });
        let token = Token {
            token: "test-access-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            metadata: None,
        };
        let credentials = Builder::new(json).with_access_token(token).build();
        assert!(credentials.is_ok(), "{credentials:?}");
    }

    #[tokio::test]
    async fn headers_with_quota_project() -> TestResult {
        let mut mock = MockTokenProvider::new();
        mock.expect_token().times(1).return_once(|| {
            Ok(Token {
                token: "test-token".to_string(),
                token_type: "Bearer".to_string(),
                expires_at: None,
                metadata: None,
            })
        });
        let credentials = UserCredentials {
            token_provider: mock,
            quota_project_id: Some("test-quota-project".to_string()),
        };
        let headers = credentials.headers().await?;
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer test-token")
        );
        assert_eq!(
            headers.get(QUOTA_PROJECT_KEY).and_then(|v| v.to_str().ok()),
            Some("test-quota-project")
        );
        Ok(())
    }

    #[tokio::test]
    async fn headers_failure() {
        let mut mock = MockTokenProvider::new();
        mock.expect_token()
            .times(1)
            .return_once(|| Err(errors::non_retryable_from_str("fail")));
        let credentials = UserCredentials {
            token_provider: mock,
            quota_project_id: None,
        };
        let err = credentials.headers().await.unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
    }

    #[tokio::test]
    async fn refresh_success() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/token"),
                request::body(json_decoded(eq(json!({
                    "grant_type": "refresh_token",
                    "client_id": "test-client-id",
                    "client_secret": "test-client-secret",
                    "refresh_token": "test-refresh-token",
                    "scope": "scope1 scope2",
                })))),
            ])
            .respond_with(json_encoded(json!({
                "access_token": "test-access-token",
                "expires_in": 3600,
                "token_type": "Bearer",
            }))),
        );

        let credentials = Builder::new(authorized_user_json(&server.url_str("/token")))
            .with_scopes(["scope1", "scope2"])
            .build()?;
        let token = credentials.token().await?;
        assert_eq!(token.token, "test-access-token");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_some(), "{token:?}");
        Ok(())
    }

    #[tokio::test]
    async fn refresh_builder_token_uri_wins() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![request::method("POST"), request::path("/override")])
                .respond_with(json_encoded(json!({
                    "access_token": "test-access-token",
                    "token_type": "Bearer",
                }))),
        );

        let credentials = Builder::new(authorized_user_json("http://127.0.0.1:9/unused"))
            .with_token_uri(server.url_str("/override"))
            .build()?;
        let token = credentials.token().await?;
        assert_eq!(token.token, "test-access-token");
        assert_eq!(token.expires_at, None);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_failure_status() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::path("/token"))
                .respond_with(status_code(401).body("bad refresh token")),
        );
        let credentials = Builder::new(authorized_user_json(&server.url_str("/token"))).build()?;
        let err = credentials.token().await.unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
        assert!(err.to_string().contains("bad refresh token"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn refresh_failure_retryable() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::path("/token"))
                .respond_with(status_code(503).body("try again")),
        );
        let credentials = Builder::new(authorized_user_json(&server.url_str("/token"))).build()?;
        let err = credentials.token().await.unwrap_err();
        assert!(err.is_retryable(), "{err:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn access_token_until_expired() -> TestResult {
        let json = json!({
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
        });
        let token = Token {
            token: "test-access-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(60)),
            metadata: None,
        };
        let credentials = Builder::new(json).with_access_token(token).build()?;
        let got = credentials.token().await?;
        assert_eq!(got.token, "test-access-token");

        tokio::time::advance(Duration::from_secs(120)).await;
        let err = credentials.token().await.unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
        assert!(err.to_string().contains("no refresh token"), "{err}");
        Ok(())
    }
}
