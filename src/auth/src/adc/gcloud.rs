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

use super::{DefaultCredentials, Probe, loader};
use crate::build_errors::Result;
use crate::cloud_sdk::CloudSdk;
use crate::environment::Environment;
use std::sync::Arc;

/// Credentials from `gcloud auth application-default login`.
#[derive(Debug)]
pub(crate) struct GcloudFile {
    env: Arc<dyn Environment>,
    sdk: Arc<dyn CloudSdk>,
}

impl GcloudFile {
    pub(crate) fn new(env: Arc<dyn Environment>, sdk: Arc<dyn CloudSdk>) -> Self {
        Self { env, sdk }
    }
}

#[async_trait::async_trait]
impl Probe for GcloudFile {
    fn name(&self) -> &'static str {
        "gcloud credentials file"
    }

    async fn attempt(&self) -> Result<Option<DefaultCredentials>> {
        let Some(path) = self.sdk.credentials_path() else {
            return Ok(None);
        };
        if !self.env.is_file(&path) {
            tracing::debug!("no gcloud credentials at {}", path.display());
            return Ok(None);
        }
        let mut found = loader::load_credentials_from_file(&path).await?;
        if found.project_id.is_none() {
            found.project_id = self.sdk.project_id().await;
        }
        Ok(Some(found))
    }
}
