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

//! Errors created while using credentials.
//!
//! Problems *finding* or *loading* credentials are reported as
//! [DefaultCredentialsError]. Problems *using* credentials, e.g. a failure to
//! fetch an access token, are reported as [CredentialsError].

use http::StatusCode;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

pub use crate::build_errors::Error as DefaultCredentialsError;

/// Represents an error using a [Credentials](crate::credentials::Credentials).
///
/// Credentials may experience problems creating [access tokens]. Some of
/// these problems are transient, such as a temporary network failure talking
/// to the metadata service. Others are permanent, such as a malformed private
/// key.
///
/// [access tokens]: https://cloud.google.com/docs/authentication/token-types
#[derive(Clone, Debug)]
pub struct CredentialsError {
    /// A boolean value indicating whether the error is retryable.
    ///
    /// If `true`, the operation that resulted in this error might succeed upon
    /// retry.
    is_retryable: bool,

    /// The underlying source of the error.
    source: CredentialsErrorImpl,
}

#[derive(Clone, Debug)]
enum CredentialsErrorImpl {
    SimpleMessage(String),
    Source(Arc<dyn Error + Send + Sync>),
}

impl CredentialsError {
    /// Creates a new `CredentialsError` from an existing error.
    ///
    /// # Arguments
    /// * `is_retryable` - A boolean indicating whether the error is retryable.
    /// * `source` - The underlying error that caused the auth failure.
    pub fn from_source<T: Error + Send + Sync + 'static>(is_retryable: bool, source: T) -> Self {
        CredentialsError {
            is_retryable,
            source: CredentialsErrorImpl::Source(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message.
    ///
    /// # Example
    /// ```
    /// # use google_cloud_adc::errors::CredentialsError;
    /// let err = CredentialsError::from_msg(true, "simulated retryable error");
    /// assert!(err.is_retryable());
    /// assert!(format!("{err}").contains("simulated retryable error"));
    /// ```
    pub fn from_msg<T: Into<String>>(is_retryable: bool, message: T) -> Self {
        CredentialsError::from_source(
            is_retryable,
            CredentialsErrorImpl::SimpleMessage(message.into()),
        )
    }

    /// Returns `true` if the error is retryable; otherwise returns `false`.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }
}

/// A helper to create a retryable error.
pub(crate) fn retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(true, source)
}

/// A helper to create a non-retryable error.
pub(crate) fn non_retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(false, source)
}

pub(crate) fn non_retryable_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

/// Wraps a transport error, e.g. a failure to connect.
///
/// Transport errors are treated as transient, the caller's retry policy
/// decides whether they are worth retrying.
pub(crate) fn from_http_error(err: reqwest::Error, message: &str) -> CredentialsError {
    retryable(HttpError {
        message: message.to_string(),
        source: err,
    })
}

/// Converts an unsuccessful HTTP response into an error.
pub(crate) async fn from_http_response(
    response: reqwest::Response,
    message: &str,
) -> CredentialsError {
    let status = response.status();
    let retryable = is_retryable(status);
    match response.text().await {
        Ok(body) => CredentialsError::from_msg(
            retryable,
            format!("{message}, status: {status}, body: <{body}>"),
        ),
        Err(e) => CredentialsError::from_source(
            retryable,
            HttpError {
                message: format!("{message}, status: {status}"),
                source: e,
            },
        ),
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{message}: {source}")]
struct HttpError {
    message: String,
    #[source]
    source: reqwest::Error,
}

impl std::error::Error for CredentialsErrorImpl {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self {
            CredentialsErrorImpl::SimpleMessage(_) => None,
            CredentialsErrorImpl::Source(source) => Some(source),
        }
    }
}

impl Display for CredentialsErrorImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self {
            CredentialsErrorImpl::SimpleMessage(message) => write!(f, "{message}"),
            CredentialsErrorImpl::Source(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for CredentialsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

const RETRYABLE_MSG: &str = "but future attempts may succeed";
const NON_RETRYABLE_MSG: &str = "and future attempts will not succeed";

impl Display for CredentialsError {
    /// Formats the error message to include retryability and source.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = if self.is_retryable {
            RETRYABLE_MSG
        } else {
            NON_RETRYABLE_MSG
        };
        write!(
            f,
            "cannot create access token, {}, source:{}",
            msg, self.source
        )
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(StatusCode::SERVICE_UNAVAILABLE)]
    #[test_case(StatusCode::REQUEST_TIMEOUT)]
    #[test_case(StatusCode::TOO_MANY_REQUESTS)]
    fn retryable_status(c: StatusCode) {
        assert!(is_retryable(c));
    }

    #[test_case(StatusCode::NOT_FOUND)]
    #[test_case(StatusCode::UNAUTHORIZED)]
    #[test_case(StatusCode::BAD_REQUEST)]
    #[test_case(StatusCode::BAD_GATEWAY)]
    #[test_case(StatusCode::PRECONDITION_FAILED)]
    fn non_retryable_status(c: StatusCode) {
        assert!(!is_retryable(c));
    }

    #[test]
    fn fmt() {
        let e = CredentialsError::from_msg(true, "test-only-err-123");
        let got = format!("{e}");
        assert!(got.contains("test-only-err-123"), "{got}");
        assert!(got.contains(RETRYABLE_MSG), "{got}");

        let e = CredentialsError::from_msg(false, "test-only-err-123");
        let got = format!("{e}");
        assert!(got.contains("test-only-err-123"), "{got}");
        assert!(got.contains(NON_RETRYABLE_MSG), "{got}");
    }

    #[test]
    fn helpers() {
        let e = non_retryable_from_str("test-only");
        assert!(!e.is_retryable(), "{e:?}");
        assert!(e.source().is_some(), "{e:?}");

        let io = std::io::Error::other("test-only-io");
        let e = retryable(io);
        assert!(e.is_retryable(), "{e:?}");
        assert!(format!("{e}").contains("test-only-io"), "{e}");

        let io = std::io::Error::other("test-only-io");
        let e = non_retryable(io);
        assert!(!e.is_retryable(), "{e:?}");
    }
}
