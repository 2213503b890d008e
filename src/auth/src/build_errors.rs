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

//! Errors created while finding and loading credentials.

use std::path::Path;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `Result` alias where the `Err` case is [Error].
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the [Application Default Credentials] search and for
/// the credentials builders.
///
/// A source that is simply not configured (the environment variable is unset,
/// the gcloud file does not exist, the metadata service is unreachable) is
/// never an error. This type reports sources that exist but are broken, and
/// the case where no source was found at all.
///
/// [Application Default Credentials]: https://cloud.google.com/docs/authentication/application-default-credentials
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// A problem finding or opening the credentials file.
    pub fn is_loading(&self) -> bool {
        matches!(self.0, ErrorKind::Loading { .. })
    }

    /// The credentials file is not valid JSON.
    pub fn is_parsing(&self) -> bool {
        matches!(self.0, ErrorKind::Parsing { .. })
    }

    /// The credentials type is missing or unknown.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self.0, ErrorKind::UnknownType { .. })
    }

    /// The credentials are missing one or more required fields.
    pub fn is_missing_fields(&self) -> bool {
        matches!(self.0, ErrorKind::MissingFields { .. })
    }

    /// None of the credential sources was available.
    pub fn is_not_found(&self) -> bool {
        matches!(self.0, ErrorKind::NotFound)
    }

    pub(crate) fn loading<T>(path: &Path, source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Loading {
            path: path.display().to_string(),
            source: source.into(),
        })
    }

    pub(crate) fn parsing(path: &Path, source: serde_json::Error) -> Error {
        Error(ErrorKind::Parsing {
            path: path.display().to_string(),
            source,
        })
    }

    pub(crate) fn unknown_type(path: &Path, found: Option<&str>) -> Error {
        Error(ErrorKind::UnknownType {
            path: path.display().to_string(),
            found: found.map(str::to_string),
        })
    }

    /// Some required fields are missing for the `kind` credentials.
    ///
    /// `kind` is a human readable name, e.g. "authorized user".
    pub(crate) fn missing_fields(kind: &'static str, fields: Vec<&'static str>) -> Error {
        Error(ErrorKind::MissingFields {
            kind,
            file: None,
            fields,
        })
    }

    pub(crate) fn not_found() -> Error {
        Error(ErrorKind::NotFound)
    }

    /// Records the file that produced this error, if the error does not
    /// already name one.
    pub(crate) fn in_file(self, path: &Path) -> Error {
        match self.0 {
            ErrorKind::MissingFields {
                kind,
                file: None,
                fields,
            } => Error(ErrorKind::MissingFields {
                kind,
                file: Some(path.display().to_string()),
                fields,
            }),
            kind => Error(kind),
        }
    }
}

const NOT_FOUND_MSG: &str = "Could not automatically determine credentials. \
Please set GOOGLE_APPLICATION_CREDENTIALS to the path of a credentials file, \
run `gcloud auth application-default login`, or run the application on \
Google Cloud (Compute Engine, App Engine, GKE, Cloud Run, and similar \
environments). For more information, please see \
https://cloud.google.com/docs/authentication/application-default-credentials";

fn from_file(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" from {f}"))
        .unwrap_or_default()
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("File {path} was not found or could not be read: {source}")]
    Loading {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("File {path} is not a valid json file: {source}")]
    Parsing {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "The file {path} does not have a valid type. Type is {}, expected one of (\"authorized_user\", \"service_account\").",
        .found.as_deref().unwrap_or("<missing>")
    )]
    UnknownType { path: String, found: Option<String> },
    #[error(
        "Failed to load {kind} credentials{}, missing fields {}.",
        from_file(.file),
        .fields.join(", ")
    )]
    MissingFields {
        kind: &'static str,
        file: Option<String>,
        fields: Vec<&'static str>,
    },
    #[error("{}", NOT_FOUND_MSG)]
    NotFound,
}
