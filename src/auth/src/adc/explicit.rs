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
use crate::constants::GOOGLE_APPLICATION_CREDENTIALS;
use crate::environment::{Environment, non_empty_path};
use std::sync::Arc;

/// Credentials from the file named by `GOOGLE_APPLICATION_CREDENTIALS`.
#[derive(Debug)]
pub(crate) struct ExplicitFile {
    env: Arc<dyn Environment>,
}

impl ExplicitFile {
    pub(crate) fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }
}

#[async_trait::async_trait]
impl Probe for ExplicitFile {
    fn name(&self) -> &'static str {
        GOOGLE_APPLICATION_CREDENTIALS
    }

    async fn attempt(&self) -> Result<Option<DefaultCredentials>> {
        let Some(path) = non_empty_path(self.env.as_ref(), GOOGLE_APPLICATION_CREDENTIALS) else {
            return Ok(None);
        };
        tracing::debug!(
            "loading credentials from {GOOGLE_APPLICATION_CREDENTIALS}={}",
            path.display()
        );
        // A broken file is an error, the search does not continue.
        loader::load_credentials_from_file(&path).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::tests::FakeEnvironment;
    use std::io::Write;

    #[tokio::test]
    async fn unset() -> anyhow::Result<()> {
        let probe = ExplicitFile::new(Arc::new(FakeEnvironment::new()));
        assert!(probe.attempt().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn empty() -> anyhow::Result<()> {
        let env = FakeEnvironment::new().with_var(GOOGLE_APPLICATION_CREDENTIALS, "");
        let probe = ExplicitFile::new(Arc::new(env));
        assert!(probe.attempt().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let env = FakeEnvironment::new()
            .with_var(GOOGLE_APPLICATION_CREDENTIALS, "/test-only/missing.json");
        let probe = ExplicitFile::new(Arc::new(env));
        let err = probe.attempt().await.unwrap_err();
        assert!(err.is_loading(), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_unicode_path_is_used() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;
        let path = OsString::from_vec(b"/test-only/\xff-missing.json".to_vec());
        let env = FakeEnvironment::new().with_var_os(GOOGLE_APPLICATION_CREDENTIALS, path);
        let probe = ExplicitFile::new(Arc::new(env));
        let err = probe.attempt().await.unwrap_err();
        assert!(err.is_loading(), "{err:?}");
        assert!(err.to_string().contains("-missing.json"), "{err}");
    }

    #[tokio::test]
    async fn invalid_file_is_error() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"[1, 2")?;
        let env = FakeEnvironment::new().with_var(
            GOOGLE_APPLICATION_CREDENTIALS,
            &file.path().to_string_lossy(),
        );
        let probe = ExplicitFile::new(Arc::new(env));
        let err = probe.attempt().await.unwrap_err();
        assert!(err.is_parsing(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn found() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        let contents = serde_json::json!({
            "type": "authorized_user",
            "client_id": "test-client-id",
            "client_secret": "test-client-secret",
            "refresh_token": "test-refresh-token",
        });
        file.write_all(contents.to_string().as_bytes())?;
        let env = FakeEnvironment::new().with_var(
            GOOGLE_APPLICATION_CREDENTIALS,
            &file.path().to_string_lossy(),
        );
        let probe = ExplicitFile::new(Arc::new(env));
        let found = probe.attempt().await?;
        let found = found.expect("credentials should be found");
        assert_eq!(found.project_id, None);
        Ok(())
    }
}
