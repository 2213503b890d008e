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

use super::DefaultCredentials;
use crate::build_errors::{Error as BuildError, Result};
use crate::constants::{AUTHORIZED_USER_TYPE, SERVICE_ACCOUNT_TYPE};
use crate::credentials::{service_account, user_account};
use serde_json::Value;
use std::path::Path;

/// Loads credentials from a JSON credentials file.
///
/// The file must contain an `authorized_user` or a `service_account` JSON
/// object. Service account files may carry a `project_id`, user files never
/// do.
///
/// # Example
/// ```no_run
/// # use google_cloud_adc::adc::load_credentials_from_file;
/// # tokio_test::block_on(async {
/// let found = load_credentials_from_file("/path/to/key.json").await?;
/// println!("project = {:?}", found.project_id);
/// # Ok::<(), google_cloud_adc::errors::DefaultCredentialsError>(())
/// # });
/// ```
pub async fn load_credentials_from_file<P: AsRef<Path>>(path: P) -> Result<DefaultCredentials> {
    let path = path.as_ref();
    let contents = tokio::fs::read(path)
        .await
        .map_err(|e| BuildError::loading(path, e))?;
    let json = serde_json::from_slice::<Value>(&contents).map_err(|e| BuildError::parsing(path, e))?;
    from_json(path, json)
}

fn from_json(path: &Path, json: Value) -> Result<DefaultCredentials> {
    match json.get("type").and_then(Value::as_str) {
        Some(AUTHORIZED_USER_TYPE) => {
            let credentials = user_account::Builder::new(json)
                .build()
                .map_err(|e| e.in_file(path))?;
            Ok(DefaultCredentials {
                credentials,
                project_id: None,
            })
        }
        Some(SERVICE_ACCOUNT_TYPE) => {
            let project_id = json
                .get("project_id")
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty())
                .map(str::to_string);
            let credentials = service_account::Builder::new(json)
                .build()
                .map_err(|e| e.in_file(path))?;
            Ok(DefaultCredentials {
                credentials,
                project_id,
            })
        }
        other => Err(BuildError::unknown_type(path, other)),
    }
}
