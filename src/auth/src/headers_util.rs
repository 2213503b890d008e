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

use crate::Result;
use crate::errors;
use crate::token::Token;
use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// The name of the header used to set the quota project.
pub(crate) const QUOTA_PROJECT_KEY: &str = "x-goog-user-project";

/// A utility function to create bearer headers.
pub(crate) fn build_bearer_headers(
    token: &Token,
    quota_project_id: &Option<String>,
) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(&format!("{} {}", token.token_type, token.token))
        .map_err(errors::non_retryable)?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(2);
    headers.insert(AUTHORIZATION, value);
    if let Some(project) = quota_project_id {
        headers.insert(
            HeaderName::from_static(QUOTA_PROJECT_KEY),
            HeaderValue::from_str(project).map_err(errors::non_retryable)?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_token() -> Token {
        Token {
            token: "test-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            metadata: None,
        }
    }

    #[test]
    fn bearer_headers() {
        let headers = build_bearer_headers(&test_token(), &None).unwrap();
        assert_eq!(headers.len(), 1, "{headers:?}");
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value, HeaderValue::from_static("Bearer test-token"));
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_headers_with_quota_project() {
        let headers =
            build_bearer_headers(&test_token(), &Some("test-quota-project".to_string())).unwrap();
        assert_eq!(headers.len(), 2, "{headers:?}");
        assert_eq!(
            headers.get(QUOTA_PROJECT_KEY).unwrap(),
            HeaderValue::from_static("test-quota-project")
        );
    }

    #[test]
    fn bearer_headers_invalid_token() {
        let mut token = test_token();
        token.token = "bad\ntoken".to_string();
        let err = build_bearer_headers(&token, &None).unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
    }
}
