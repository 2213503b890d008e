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

//! App Engine Credentials type.
//!
//! Some App Engine runtimes expose an in-process [App Identity] API. That API
//! is not reachable over the network, so applications running in such a
//! runtime provide an implementation of [AppIdentityService] and pass it to
//! the credentials search with
//! [adc::Builder::with_app_identity](crate::adc::Builder::with_app_identity).
//! Without one, the App Engine step of the search is skipped.
//!
//! [App Identity]: https://cloud.google.com/appengine/docs/legacy/standard/python/appidentity

use crate::credentials::{Credentials, CredentialsProvider, Result};
use crate::headers_util::build_bearer_headers;
use crate::token::Token;
use http::HeaderMap;
use std::sync::Arc;

/// The App Engine identity API of the hosting runtime.
#[async_trait::async_trait]
pub trait AppIdentityService: std::fmt::Debug + Send + Sync {
    /// Returns the id of the running application.
    ///
    /// Returns an error if the runtime does not expose an application id,
    /// e.g. outside a hosted environment.
    async fn application_id(&self) -> Result<String>;

    /// Returns an access token for the application's service account.
    async fn access_token(&self, scopes: &[String]) -> Result<Token>;
}

/// A builder for App Engine [Credentials].
#[derive(Debug)]
pub struct Builder {
    service: Arc<dyn AppIdentityService>,
    scopes: Vec<String>,
    quota_project_id: Option<String>,
}

impl Builder {
    /// Creates a builder for credentials backed by `service`.
    pub fn new(service: Arc<dyn AppIdentityService>) -> Self {
        Self {
            service,
            scopes: Vec::new(),
            quota_project_id: None,
        }
    }

    /// Sets the [scopes] for these credentials.
    ///
    /// [scopes]: https://developers.google.com/identity/protocols/oauth2/scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Sets the [quota project] for these credentials.
    ///
    /// [quota project]: https://cloud.google.com/docs/quotas/quota-project
    pub fn with_quota_project_id<S: Into<String>>(mut self, quota_project_id: S) -> Self {
        self.quota_project_id = Some(quota_project_id.into());
        self
    }

    /// Returns a [Credentials] instance with the configured settings.
    pub fn build(self) -> Credentials {
        Credentials::from(AppEngineCredentials {
            service: self.service,
            scopes: self.scopes,
            quota_project_id: self.quota_project_id,
        })
    }
}

#[derive(Clone, Debug)]
struct AppEngineCredentials {
    service: Arc<dyn AppIdentityService>,
    scopes: Vec<String>,
    quota_project_id: Option<String>,
}

impl CredentialsProvider for AppEngineCredentials {
    async fn token(&self) -> Result<Token> {
        self.service.access_token(&self.scopes).await
    }

    async fn headers(&self) -> Result<HeaderMap> {
        let token = self.token().await?;
        build_bearer_headers(&token, &self.quota_project_id)
    }

    fn requires_scopes(&self) -> bool {
        self.scopes.is_empty()
    }

    fn with_scopes(&self, scopes: &[String]) -> Option<Credentials> {
        Some(Credentials::from(Self {
            scopes: scopes.to_vec(),
            ..self.clone()
        }))
    }
}
