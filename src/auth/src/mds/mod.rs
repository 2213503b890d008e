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

pub(crate) mod client;

use crate::constants::{GCE_METADATA_HOST, GCE_METADATA_IP, GCE_METADATA_TIMEOUT};
use crate::environment::{Environment, non_empty_var};
use std::time::Duration;

pub(crate) const MDS_DEFAULT_URI: &str = "/computeMetadata/v1/instance/service-accounts/default";
pub(crate) const MDS_PROJECT_ID_URI: &str = "/computeMetadata/v1/project/project-id";
pub(crate) const METADATA_FLAVOR_VALUE: &str = "Google";
pub(crate) const METADATA_FLAVOR: &str = "metadata-flavor";
pub(crate) const METADATA_ROOT: &str = "http://metadata.google.internal";
pub(crate) const METADATA_IP_ROOT: &str = "http://169.254.169.254";
pub(crate) const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the metadata service lives.
///
/// The ping goes to the IP address by default, avoiding a DNS lookup on
/// machines that are not running on Google Cloud.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Endpoints {
    pub(crate) metadata: String,
    pub(crate) ping: String,
}

/// Resolves the metadata endpoints.
///
/// `GCE_METADATA_HOST` wins over everything, then an endpoint configured in
/// code, then the defaults. `GCE_METADATA_IP` only changes the ping endpoint.
pub(crate) fn resolve_endpoints(
    env: &dyn Environment,
    endpoint_override: Option<String>,
) -> Endpoints {
    if let Some(host) = non_empty_var(env, GCE_METADATA_HOST) {
        let endpoint = format!("http://{host}");
        return Endpoints {
            metadata: endpoint.clone(),
            ping: endpoint,
        };
    }
    if let Some(endpoint) = endpoint_override {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        return Endpoints {
            metadata: endpoint.clone(),
            ping: endpoint,
        };
    }
    let ping = non_empty_var(env, GCE_METADATA_IP)
        .map(|ip| format!("http://{ip}"))
        .unwrap_or_else(|| METADATA_IP_ROOT.to_string());
    Endpoints {
        metadata: METADATA_ROOT.to_string(),
        ping,
    }
}

/// The ping timeout, `GCE_METADATA_TIMEOUT` is in seconds.
pub(crate) fn ping_timeout(env: &dyn Environment) -> Duration {
    let Some(value) = non_empty_var(env, GCE_METADATA_TIMEOUT) else {
        return DEFAULT_PING_TIMEOUT;
    };
    match value.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(e) => {
            tracing::debug!(
                "ignoring invalid {GCE_METADATA_TIMEOUT} value {value:?}: {e}, using the default"
            );
            DEFAULT_PING_TIMEOUT
        }
    }
}
