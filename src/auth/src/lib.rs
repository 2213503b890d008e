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

//! Google Cloud Client Libraries for Rust - Application Default Credentials
//!
//! This crate finds the credentials an application should use when it does
//! not configure any explicitly. The process is called
//! [Application Default Credentials] (ADC) and searches, in order:
//!
//! 1. The file named by the `GOOGLE_APPLICATION_CREDENTIALS` environment
//!    variable.
//! 2. The file created by `gcloud auth application-default login`.
//! 3. The App Engine identity service, if the application provides one.
//! 4. The [Metadata Service] available on Compute Engine, GKE, Cloud Run, and
//!    other Google Cloud environments.
//!
//! ```no_run
//! # tokio_test::block_on(async {
//! let found = google_cloud_adc::adc::default().await?;
//! println!("project = {:?}", found.project_id);
//! let headers = found.credentials.headers().await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! The crate also contains helpers to run the OAuth 2.0
//! [Authorization Code grant] for installed and web applications, see the
//! [flow] module.
//!
//! [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials
//! [Authorization Code grant]: https://tools.ietf.org/html/rfc6749#section-1.3.1
//! [Metadata Service]: https://cloud.google.com/compute/docs/metadata/overview

pub mod adc;
pub mod build_errors;
pub mod cloud_sdk;
pub mod environment;
pub mod errors;
pub mod flow;

/// Types and functions to work with Google Cloud authentication [Credentials].
///
/// [Credentials]: https://cloud.google.com/docs/authentication#credentials
pub mod credentials;

/// Types and functions to work with auth [Tokens].
///
/// [Tokens]: https://cloud.google.com/docs/authentication#token
pub mod token;

pub(crate) mod constants;
pub(crate) mod headers_util;
pub(crate) mod mds;

/// A `Result` alias where the `Err` case is
/// `google_cloud_adc::errors::CredentialsError`.
pub(crate) type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;
