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

//! Access to the process environment.
//!
//! The credentials search reads environment variables and checks for files.
//! Both go through the [Environment] trait, so applications and tests can
//! run the search against something other than the real process state.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The environment variables and files visible to the credentials search.
///
/// # Example
/// ```
/// # use google_cloud_adc::environment::Environment;
/// # use std::ffi::OsString;
/// # use std::path::Path;
/// #[derive(Debug)]
/// struct NoEnvironment;
/// impl Environment for NoEnvironment {
///     fn var_os(&self, _name: &str) -> Option<OsString> { None }
///     fn is_file(&self, _path: &Path) -> bool { false }
/// }
/// ```
pub trait Environment: std::fmt::Debug + Send + Sync {
    /// Returns the value of the environment variable `name`, or `None` if
    /// it is not set.
    fn var_os(&self, name: &str) -> Option<OsString>;

    /// Returns the value of the environment variable `name` as a string.
    ///
    /// Invalid unicode is replaced by `U+FFFD`. Only unset variables return
    /// `None`.
    fn var(&self, name: &str) -> Option<String> {
        self.var_os(name).map(|v| v.to_string_lossy().into_owned())
    }

    /// Returns `true` if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// The real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Reads `name`, treating an empty value as unset.
pub(crate) fn non_empty_var(env: &dyn Environment, name: &str) -> Option<String> {
    env.var(name).filter(|v| !v.is_empty())
}

/// Reads a path from `name`, treating an empty value as unset.
///
/// Paths need not be valid unicode, they are used as is.
pub(crate) fn non_empty_path(env: &dyn Environment, name: &str) -> Option<PathBuf> {
    env.var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}
