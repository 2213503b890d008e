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

//! Integration with the [Google Cloud CLI] (`gcloud`) configuration.
//!
//! `gcloud auth application-default login` stores user credentials in the
//! gcloud configuration directory. The same directory holds the gcloud
//! "configurations", which may name a default project.
//!
//! [Google Cloud CLI]: https://cloud.google.com/sdk/gcloud

use crate::constants::{
    CLOUDSDK_ACTIVE_CONFIG_NAME, CLOUDSDK_CONFIG, CLOUDSDK_CORE_PROJECT, UNIX_HOME,
    WINDOWS_APPDATA,
};
use crate::environment::{Environment, SystemEnvironment, non_empty_path, non_empty_var};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CREDENTIALS_FILE: &str = "application_default_credentials.json";
const DEFAULT_CONFIGURATION: &str = "default";

/// Locates the gcloud credentials file and the gcloud default project.
#[async_trait::async_trait]
pub trait CloudSdk: std::fmt::Debug + Send + Sync {
    /// The path where `gcloud auth application-default login` stores
    /// credentials for the current user.
    ///
    /// The file may not exist. Returns `None` if there is no place to look,
    /// e.g. `$HOME` is not set.
    fn credentials_path(&self) -> Option<PathBuf>;

    /// The project of the active gcloud configuration, if any.
    ///
    /// Problems reading the configuration are not errors, the project is
    /// simply unknown.
    async fn project_id(&self) -> Option<String>;
}

/// The [CloudSdk] of the locally installed gcloud CLI.
#[derive(Clone, Debug)]
pub struct GcloudSdk {
    env: Arc<dyn Environment>,
}

impl Default for GcloudSdk {
    fn default() -> Self {
        Self::new(Arc::new(SystemEnvironment))
    }
}

impl GcloudSdk {
    /// Creates a new instance reading variables from `env`.
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    /// The gcloud configuration directory.
    fn config_dir(&self) -> Option<PathBuf> {
        let env = self.env.as_ref();
        if let Some(dir) = non_empty_path(env, CLOUDSDK_CONFIG) {
            return Some(dir);
        }
        if cfg!(windows) {
            non_empty_path(env, WINDOWS_APPDATA).map(|d| d.join("gcloud"))
        } else {
            non_empty_path(env, UNIX_HOME).map(|d| d.join(".config").join("gcloud"))
        }
    }

    async fn active_configuration(&self, config_dir: &Path) -> String {
        if let Some(name) = non_empty_var(self.env.as_ref(), CLOUDSDK_ACTIVE_CONFIG_NAME) {
            return name;
        }
        read_optional(&config_dir.join("active_config"))
            .await
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string())
    }
}

#[async_trait::async_trait]
impl CloudSdk for GcloudSdk {
    fn credentials_path(&self) -> Option<PathBuf> {
        self.config_dir().map(|d| d.join(CREDENTIALS_FILE))
    }

    async fn project_id(&self) -> Option<String> {
        if let Some(project) = non_empty_var(self.env.as_ref(), CLOUDSDK_CORE_PROJECT) {
            return Some(project);
        }
        let config_dir = self.config_dir()?;
        let active = self.active_configuration(&config_dir).await;
        let path = config_dir
            .join("configurations")
            .join(format!("config_{active}"));
        let contents = read_optional(&path).await?;
        let project = core_project(&contents);
        tracing::debug!(
            "gcloud configuration {active} at {} has project {project:?}",
            path.display()
        );
        project
    }
}

/// Reads a file that may legitimately not exist.
async fn read_optional(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("cannot read gcloud configuration {}: {e}", path.display());
            None
        }
    }
}

/// Finds `project` in the `[core]` section of a gcloud configuration.
fn core_project(contents: &str) -> Option<String> {
    let mut in_core = false;
    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_core = section.trim() == "core";
            continue;
        }
        if !in_core {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) if key.trim() == "project" => {
                let value = value.trim();
                return (!value.is_empty()).then(|| value.to_string());
            }
            _ => {}
        }
    }
    None
}
