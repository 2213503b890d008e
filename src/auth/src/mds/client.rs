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

use super::{Endpoints, METADATA_FLAVOR, METADATA_FLAVOR_VALUE};
use crate::errors::{self, CredentialsError};
use crate::token::Token;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use std::time::Duration;
use tokio::time::Instant;

/// A client for the Google Cloud metadata service (MDS).
#[derive(Clone, Debug)]
pub(crate) struct Client {
    endpoint: String,
    ping_endpoint: String,
    inner: ReqwestClient,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub(crate) struct MDSTokenResponse {
    pub(crate) access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_in: Option<u64>,
    pub(crate) token_type: String,
}

impl Client {
    pub(crate) fn new(endpoints: Endpoints, inner: ReqwestClient) -> Self {
        Self {
            endpoint: endpoints.metadata,
            ping_endpoint: endpoints.ping,
            inner,
        }
    }

    /// Creates a GET request to the MDS service with the correct headers.
    fn get(&self, root: &str, path: &str) -> RequestBuilder {
        let url = format!("{root}{path}");
        self.inner
            .get(url)
            .header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE)
    }

    /// Returns `true` if the metadata service is reachable.
    ///
    /// Something else may be listening on the metadata address, so the
    /// response must carry the `Metadata-Flavor: Google` header to count.
    /// Transport errors and timeouts mean the service is not there.
    pub(crate) async fn ping(&self, timeout: Duration) -> bool {
        let response = match self.get(&self.ping_endpoint, "/").timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("metadata service ping at {} failed: {e}", self.ping_endpoint);
                return false;
            }
        };
        let flavor = response
            .headers()
            .get(METADATA_FLAVOR)
            .and_then(|v| v.to_str().ok());
        response.status() == reqwest::StatusCode::OK && flavor == Some(METADATA_FLAVOR_VALUE)
    }

    /// Fetches the id of the project this workload runs in.
    pub(crate) async fn project_id(&self) -> crate::Result<String> {
        let error_message = "failed to fetch project id";
        let response = self
            .get(&self.endpoint, super::MDS_PROJECT_ID_URI)
            .send()
            .await
            .map_err(|e| errors::from_http_error(e, error_message))?;

        let response = Self::check_response_status(response, error_message).await?;

        let project_id = response
            .text()
            .await
            .map_err(|e| CredentialsError::from_source(!e.is_decode(), e))?;
        Ok(project_id.trim().to_string())
    }

    /// Fetches an access token for the default service account.
    pub(crate) async fn access_token(&self, scopes: Option<&[String]>) -> crate::Result<Token> {
        let path = format!("{}/token", super::MDS_DEFAULT_URI);
        let request = self.get(&self.endpoint, &path);

        // Without `scopes` the MDS uses the scopes configured for the instance.
        let scopes = scopes.map(|v| v.join(","));
        let request = scopes
            .into_iter()
            .fold(request, |r, s| r.query(&[("scopes", s)]));

        let error_message = "failed to fetch access token";
        let response = request
            .send()
            .await
            .map_err(|e| errors::from_http_error(e, error_message))?;

        let response = Self::check_response_status(response, error_message).await?;

        let response = response.json::<MDSTokenResponse>().await.map_err(|e| {
            // Decoding errors are not transient. Typically they indicate a badly
            // configured MDS endpoint, or DNS redirecting the request to a random
            // server, e.g., ISPs that redirect unknown services to HTTP.
            CredentialsError::from_source(!e.is_decode(), e)
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

    async fn check_response_status(
        response: reqwest::Response,
        error_message: &str,
    ) -> crate::Result<reqwest::Response> {
        if !response.status().is_success() {
            let err = errors::from_http_response(response, error_message).await;
            Err(err)
        } else {
            Ok(response)
        }
    }
}
