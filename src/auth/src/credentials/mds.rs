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

//! [Metadata Service] Credentials type.
//!
//! Google Cloud environments such as [Google Compute Engine (GCE)][gce-link],
//! [Google Kubernetes Engine (GKE)][gke-link], or [Cloud Run] provide a
//! metadata service. This is a local service to the VM (or pod) which (as the
//! name implies) provides metadata information about the VM. The service also
//! provides access tokens associated with the [default service account] for
//! the corresponding VM.
//!
//! The metadata service endpoint is `http://metadata.google.internal`. The
//! `GCE_METADATA_HOST` environment variable, and [Builder::with_endpoint],
//! override it.
//!
//! ```
//! # use google_cloud_adc::credentials::mds::Builder;
//! # use google_cloud_adc::credentials::Credentials;
//! let credentials: Credentials = Builder::default()
//!     .with_quota_project_id("my-quota-project")
//!     .build();
//! ```
//!
//! [Cloud Run]: https://cloud.google.com/run
//! [default service account]: https://cloud.google.com/iam/docs/service-account-types#default
//! [gce-link]: https://cloud.google.com/products/compute
//! [gke-link]: https://cloud.google.com/kubernetes-engine
//! [Metadata Service]: https://cloud.google.com/compute/docs/metadata/overview

use crate::credentials::{Credentials, CredentialsProvider, Result};
use crate::environment::{Environment, SystemEnvironment};
use crate::headers_util::build_bearer_headers;
use crate::mds::client::Client as MDSClient;
use crate::mds::resolve_endpoints;
use crate::token::{Token, TokenProvider};
use http::HeaderMap;
use std::sync::Arc;

/// Creates [Credentials] backed by the metadata service.
#[derive(Clone, Debug)]
pub struct Builder {
    endpoint: Option<String>,
    quota_project_id: Option<String>,
    scopes: Option<Vec<String>>,
    client: Option<reqwest::Client>,
    env: Arc<dyn Environment>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            endpoint: None,
            quota_project_id: None,
            scopes: None,
            client: None,
            env: Arc::new(SystemEnvironment),
        }
    }
}

impl Builder {
    /// Sets the endpoint for this credentials.
    ///
    /// The `GCE_METADATA_HOST` environment variable takes precedence over
    /// this value.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the [quota project] for these credentials.
    ///
    /// [quota project]: https://cloud.google.com/docs/quotas/quota-project
    pub fn with_quota_project_id<S: Into<String>>(mut self, quota_project_id: S) -> Self {
        self.quota_project_id = Some(quota_project_id.into());
        self
    }

    /// Sets the [scopes] requested from the metadata service.
    ///
    /// Without scopes the metadata service uses the scopes configured for
    /// the VM.
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

    /// Uses `client` to talk to the metadata service.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub(crate) fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    pub(crate) fn build_client(&self) -> MDSClient {
        let endpoints = resolve_endpoints(self.env.as_ref(), self.endpoint.clone());
        MDSClient::new(endpoints, self.client.clone().unwrap_or_default())
    }

    /// Returns a [Credentials] instance with the configured settings.
    pub fn build(self) -> Credentials {
        let token_provider = MDSAccessTokenProvider {
            client: self.build_client(),
            scopes: self.scopes,
        };
        Credentials::from(MDSCredentials {
            token_provider,
            quota_project_id: self.quota_project_id,
        })
    }
}

#[derive(Debug)]
struct MDSAccessTokenProvider {
    client: MDSClient,
    scopes: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl TokenProvider for MDSAccessTokenProvider {
    async fn token(&self) -> Result<Token> {
        self.client.access_token(self.scopes.as_deref()).await
    }
}

#[derive(Debug)]
struct MDSCredentials<T>
where
    T: TokenProvider,
{
    token_provider: T,
    quota_project_id: Option<String>,
}

impl<T> CredentialsProvider for MDSCredentials<T>
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
