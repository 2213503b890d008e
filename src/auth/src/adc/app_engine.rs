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

use super::{DefaultCredentials, Probe};
use crate::build_errors::Result;
use crate::credentials::app_engine::{self, AppIdentityService};
use std::sync::Arc;

/// Credentials from the App Engine identity API, when the runtime has one.
#[derive(Debug)]
pub(crate) struct AppEngine {
    service: Option<Arc<dyn AppIdentityService>>,
}

impl AppEngine {
    pub(crate) fn new(service: Option<Arc<dyn AppIdentityService>>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Probe for AppEngine {
    fn name(&self) -> &'static str {
        "App Engine identity"
    }

    async fn attempt(&self) -> Result<Option<DefaultCredentials>> {
        let Some(service) = &self.service else {
            return Ok(None);
        };
        match service.application_id().await {
            Ok(application_id) => Ok(Some(DefaultCredentials {
                credentials: app_engine::Builder::new(service.clone()).build(),
                project_id: Some(application_id),
            })),
            Err(e) => {
                tracing::debug!("App Engine identity API has no application id: {e}");
                Ok(None)
            }
        }
    }
}
