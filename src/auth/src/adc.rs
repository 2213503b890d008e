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

//! [Application Default Credentials] (ADC).
//!
//! ADC finds credentials based on the application environment. The sources
//! are tried in order, and the first one that is present wins:
//!
//! 1. The file named by the `GOOGLE_APPLICATION_CREDENTIALS` environment
//!    variable.
//! 1. The file created by `gcloud auth application-default login`. If that
//!    file names no project, the project of the active gcloud configuration
//!    is used.
//! 1. The App Engine identity API, if the application provides one, see
//!    [Builder::with_app_identity].
//! 1. The metadata service available on Google Cloud, if it answers a ping.
//!
//! A source that is not present is skipped. A source that is present but
//! broken, e.g. a credentials file that is not valid JSON, stops the search
//! with an error.
//!
//! Once credentials are found the `GOOGLE_CLOUD_PROJECT` environment variable
//! (or the legacy `GCLOUD_PROJECT`) overrides the project id that came with
//! them.
//!
//! [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials

mod app_engine;
mod explicit;
mod gcloud;
mod loader;
mod metadata;

pub use loader::load_credentials_from_file;

use crate::build_errors::{Error as BuildError, Result};
use crate::cloud_sdk::{CloudSdk, GcloudSdk};
use crate::constants::{GCLOUD_PROJECT, GOOGLE_CLOUD_PROJECT};
use crate::credentials::app_engine::AppIdentityService;
use crate::credentials::{self, Credentials};
use crate::environment::{Environment, SystemEnvironment, non_empty_var};
use std::sync::Arc;

/// Credentials found by the ADC search, and the project they belong to.
#[derive(Clone, Debug)]
pub struct DefaultCredentials {
    /// The credentials.
    pub credentials: Credentials,
    /// The project id, if the credentials source or the environment names one.
    pub project_id: Option<String>,
}

/// Runs the ADC search with all the defaults.
///
/// # Example
/// ```no_run
/// # tokio_test::block_on(async {
/// let found = google_cloud_adc::adc::default().await?;
/// println!("project = {:?}", found.project_id);
/// # Ok::<(), google_cloud_adc::errors::DefaultCredentialsError>(())
/// # });
/// ```
pub async fn default() -> Result<DefaultCredentials> {
    Builder::default().build().await
}

/// Configures the ADC search.
///
/// # Example
/// ```no_run
/// # use google_cloud_adc::adc::Builder;
/// # tokio_test::block_on(async {
/// let found = Builder::default()
///     .with_scopes(["https://www.googleapis.com/auth/pubsub"])
///     .build()
///     .await?;
/// # Ok::<(), google_cloud_adc::errors::DefaultCredentialsError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct Builder {
    scopes: Option<Vec<String>>,
    client: Option<reqwest::Client>,
    env: Arc<dyn Environment>,
    cloud_sdk: Option<Arc<dyn CloudSdk>>,
    app_identity: Option<Arc<dyn AppIdentityService>>,
    metadata_endpoint: Option<String>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            scopes: None,
            client: None,
            env: Arc::new(SystemEnvironment),
            cloud_sdk: None,
            app_identity: None,
            metadata_endpoint: None,
        }
    }
}

impl Builder {
    /// Applies `scopes` to the credentials found, if they require scopes.
    ///
    /// See [credentials::with_scopes_if_required].
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(|s| s.into()).collect());
        self
    }

    /// The HTTP client used to talk to the metadata service.
    ///
    /// The client is also used by the metadata credentials, if those are
    /// found.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Reads environment variables and checks files through `env`.
    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Locates the gcloud credentials and project through `sdk`.
    ///
    /// Defaults to a [GcloudSdk] using the same environment.
    pub fn with_cloud_sdk(mut self, sdk: Arc<dyn CloudSdk>) -> Self {
        self.cloud_sdk = Some(sdk);
        self
    }

    /// Enables the App Engine step of the search.
    pub fn with_app_identity(mut self, service: Arc<dyn AppIdentityService>) -> Self {
        self.app_identity = Some(service);
        self
    }

    /// Overrides the metadata service endpoint.
    ///
    /// The `GCE_METADATA_HOST` environment variable takes precedence.
    pub fn with_metadata_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.metadata_endpoint = Some(endpoint.into());
        self
    }

    /// Runs the search.
    ///
    /// # Errors
    ///
    /// Returns an error if a credentials source is present but broken, or if
    /// no source is present ([is_not_found][BuildError::is_not_found]).
    pub async fn build(self) -> Result<DefaultCredentials> {
        let cloud_sdk = self
            .cloud_sdk
            .unwrap_or_else(|| Arc::new(GcloudSdk::new(self.env.clone())));
        let mut mds = credentials::mds::Builder::default().with_environment(self.env.clone());
        if let Some(endpoint) = self.metadata_endpoint {
            mds = mds.with_endpoint(endpoint);
        }
        if let Some(client) = self.client {
            mds = mds.with_client(client);
        }

        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(explicit::ExplicitFile::new(self.env.clone())),
            Box::new(gcloud::GcloudFile::new(self.env.clone(), cloud_sdk)),
            Box::new(app_engine::AppEngine::new(self.app_identity)),
            Box::new(metadata::Metadata::new(
                mds,
                crate::mds::ping_timeout(self.env.as_ref()),
            )),
        ];
        resolve(&probes, self.env.as_ref(), self.scopes.as_deref()).await
    }
}

/// One source of credentials.
#[async_trait::async_trait]
pub(crate) trait Probe: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `Ok(None)` if the source is not present.
    async fn attempt(&self) -> Result<Option<DefaultCredentials>>;
}

/// Tries `probes` in order and returns the first credentials found.
pub(crate) async fn resolve(
    probes: &[Box<dyn Probe>],
    env: &dyn Environment,
    scopes: Option<&[String]>,
) -> Result<DefaultCredentials> {
    for probe in probes {
        let Some(found) = probe.attempt().await? else {
            tracing::debug!("no credentials found by {}", probe.name());
            continue;
        };
        tracing::debug!(
            "using credentials found by {}, project id {:?}",
            probe.name(),
            found.project_id
        );
        let project_id = project_override(env).or(found.project_id);
        let credentials = match scopes {
            Some(scopes) => credentials::with_scopes_if_required(found.credentials, scopes),
            None => found.credentials,
        };
        return Ok(DefaultCredentials {
            credentials,
            project_id,
        });
    }
    Err(BuildError::not_found())
}

fn project_override(env: &dyn Environment) -> Option<String> {
    non_empty_var(env, GOOGLE_CLOUD_PROJECT).or_else(|| non_empty_var(env, GCLOUD_PROJECT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::FakeCredentials;
    use crate::environment::tests::FakeEnvironment;
    use std::path::Path;

    mockall::mock! {
        #[derive(Debug)]
        pub Probe {}

        #[async_trait::async_trait]
        impl Probe for Probe {
            fn name(&self) -> &'static str;
            async fn attempt(&self) -> Result<Option<DefaultCredentials>>;
        }
    }

    fn found(project_id: Option<&str>) -> DefaultCredentials {
        DefaultCredentials {
            credentials: Credentials::from(FakeCredentials::scopable()),
            project_id: project_id.map(str::to_string),
        }
    }

    fn absent() -> MockProbe {
        let mut probe = MockProbe::new();
        probe.expect_name().return_const("absent");
        probe.expect_attempt().times(1).returning(|| Ok(None));
        probe
    }

    fn present(project_id: Option<&'static str>) -> MockProbe {
        let mut probe = MockProbe::new();
        probe.expect_name().return_const("present");
        probe
            .expect_attempt()
            .times(1)
            .returning(move || Ok(Some(found(project_id))));
        probe
    }

    fn never() -> MockProbe {
        let mut probe = MockProbe::new();
        probe.expect_name().return_const("never");
        probe.expect_attempt().times(0);
        probe
    }

    #[tokio::test]
    async fn first_success_short_circuits() -> anyhow::Result<()> {
        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(present(Some("first-project"))),
            Box::new(never()),
            Box::new(never()),
            Box::new(never()),
        ];
        let got = resolve(&probes, &FakeEnvironment::new(), None).await?;
        assert_eq!(got.project_id.as_deref(), Some("first-project"));
        Ok(())
    }

    #[tokio::test]
    async fn later_probe_found() -> anyhow::Result<()> {
        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(absent()),
            Box::new(absent()),
            Box::new(present(None)),
            Box::new(never()),
        ];
        let got = resolve(&probes, &FakeEnvironment::new(), None).await?;
        assert_eq!(got.project_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn exhausted() {
        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(absent()),
            Box::new(absent()),
            Box::new(absent()),
            Box::new(absent()),
        ];
        let err = resolve(&probes, &FakeEnvironment::new(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
        let msg = err.to_string();
        assert!(msg.contains("GOOGLE_APPLICATION_CREDENTIALS"), "{msg}");
        assert!(msg.contains("gcloud auth application-default login"), "{msg}");
    }

    #[tokio::test]
    async fn error_stops_search() {
        let mut broken = MockProbe::new();
        broken.expect_name().return_const("broken");
        broken.expect_attempt().times(1).returning(|| {
            Err(BuildError::unknown_type(
                Path::new("/test-only/creds.json"),
                Some("bad"),
            ))
        });
        let probes: Vec<Box<dyn Probe>> =
            vec![Box::new(broken), Box::new(never()), Box::new(never())];
        let err = resolve(&probes, &FakeEnvironment::new(), None)
            .await
            .unwrap_err();
        assert!(err.is_unknown_type(), "{err:?}");
    }

    #[tokio::test]
    async fn project_override() -> anyhow::Result<()> {
        let env = FakeEnvironment::new()
            .with_var(GOOGLE_CLOUD_PROJECT, "explicit-env")
            .with_var(GCLOUD_PROJECT, "legacy-env");
        let probes: Vec<Box<dyn Probe>> = vec![Box::new(present(Some("probe-project")))];
        let got = resolve(&probes, &env, None).await?;
        assert_eq!(got.project_id.as_deref(), Some("explicit-env"));
        Ok(())
    }

    #[tokio::test]
    async fn project_override_legacy() -> anyhow::Result<()> {
        let env = FakeEnvironment::new()
            .with_var(GOOGLE_CLOUD_PROJECT, "")
            .with_var(GCLOUD_PROJECT, "legacy-env");
        let probes: Vec<Box<dyn Probe>> = vec![Box::new(present(None))];
        let got = resolve(&probes, &env, None).await?;
        assert_eq!(got.project_id.as_deref(), Some("legacy-env"));
        Ok(())
    }

    #[tokio::test]
    async fn project_override_empty_ignored() -> anyhow::Result<()> {
        let env = FakeEnvironment::new()
            .with_var(GOOGLE_CLOUD_PROJECT, "")
            .with_var(GCLOUD_PROJECT, "");
        let probes: Vec<Box<dyn Probe>> = vec![Box::new(present(Some("probe-project")))];
        let got = resolve(&probes, &env, None).await?;
        assert_eq!(got.project_id.as_deref(), Some("probe-project"));
        Ok(())
    }

    #[tokio::test]
    async fn scopes_applied() -> anyhow::Result<()> {
        let probes: Vec<Box<dyn Probe>> = vec![Box::new(present(None))];
        let scopes = ["one".to_string(), "two".to_string()];
        let got = resolve(&probes, &FakeEnvironment::new(), Some(&scopes)).await?;

        let want = credentials::with_scopes_if_required(
            Credentials::from(FakeCredentials::scopable()),
            &scopes,
        );
        assert_eq!(format!("{:?}", got.credentials), format!("{want:?}"));
        assert!(!got.credentials.requires_scopes());
        Ok(())
    }

    #[tokio::test]
    async fn unscopable_pass_through() -> anyhow::Result<()> {
        let mut probe = MockProbe::new();
        probe.expect_name().return_const("present");
        probe.expect_attempt().times(1).returning(|| {
            Ok(Some(DefaultCredentials {
                credentials: Credentials::from(FakeCredentials::default()),
                project_id: None,
            }))
        });
        let probes: Vec<Box<dyn Probe>> = vec![Box::new(probe)];
        let got = resolve(&probes, &FakeEnvironment::new(), Some(&["one".to_string()])).await?;
        let fmt = format!("{:?}", got.credentials);
        assert!(fmt.contains("scopes: None"), "{fmt}");
        Ok(())
    }

    #[tokio::test]
    async fn builder_nothing_found() {
        // An environment with no variables and no files, an SDK with no
        // credentials, and a metadata endpoint where nothing listens.
        let env = Arc::new(FakeEnvironment::new());
        let err = Builder::default()
            .with_environment(env)
            .with_metadata_endpoint("http://127.0.0.1:9")
            .build()
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
    }
}
