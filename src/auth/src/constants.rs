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

pub(crate) const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub(crate) const OAUTH2_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Path to a credentials file, consulted before anything else.
pub(crate) const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Overrides the project id found by the credentials search.
pub(crate) const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
/// Legacy name for `GOOGLE_CLOUD_PROJECT`.
pub(crate) const GCLOUD_PROJECT: &str = "GCLOUD_PROJECT";

pub(crate) const CLOUDSDK_CONFIG: &str = "CLOUDSDK_CONFIG";
pub(crate) const CLOUDSDK_ACTIVE_CONFIG_NAME: &str = "CLOUDSDK_ACTIVE_CONFIG_NAME";
pub(crate) const CLOUDSDK_CORE_PROJECT: &str = "CLOUDSDK_CORE_PROJECT";
pub(crate) const WINDOWS_APPDATA: &str = "APPDATA";
pub(crate) const UNIX_HOME: &str = "HOME";

pub(crate) const GCE_METADATA_HOST: &str = "GCE_METADATA_HOST";
pub(crate) const GCE_METADATA_IP: &str = "GCE_METADATA_IP";
pub(crate) const GCE_METADATA_TIMEOUT: &str = "GCE_METADATA_TIMEOUT";

pub(crate) const AUTHORIZED_USER_TYPE: &str = "authorized_user";
pub(crate) const SERVICE_ACCOUNT_TYPE: &str = "service_account";
