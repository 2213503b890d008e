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

use super::{DefaultCredentials, Probe};
use crate::build_errors::Result;
use crate::credentials::mds::Builder;
use std::time::Duration;

/// Credentials from the metadata service, if it answers a ping.
#[derive(Debug)]
pub(crate) struct Metadata {
    builder: Builder,
    timeout: Duration,
}

impl Metadata {
    pub(crate) fn new(builder: Builder, timeout: Duration) -> Self {
        Self { builder, timeout }
    }
}

#[async_trait::async_trait]
impl Probe for Metadata {
    fn name(&self) -> &'static str {
        "metadata service"
    }

    async fn attempt(&self) -> Result<Option<DefaultCredentials>> {
        let client = self.builder.build_client();
        if !client.ping(self.timeout).await {
            return Ok(None);
        }
        // The credentials work even if the project id is unavailable.
        let project_id = match client.project_id().await {
            Ok(p) if !p.is_empty() => Some(p),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("cannot fetch the project id from the metadata service: {e}");
                None
            }
        };
        Ok(Some(DefaultCredentials {
            credentials: self.builder.clone().build(),
            project_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::tests::FakeEnvironment;
    use crate::mds::{MDS_PROJECT_ID_URI, METADATA_FLAVOR_VALUE};
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn probe_for(endpoint: &str) -> Metadata {
        let builder = Builder::default()
            .with_environment(Arc::new(FakeEnvironment::new()))
            .with_endpoint(endpoint);
        Metadata::new(builder, Duration::from_secs(3))
    }

    fn expect_ping(server: &Server) {
        server.expect(
            Expectation::matching(all_of![request::method("GET"), request::path("/")])
                .respond_with(
                    status_code(200).insert_header("Metadata-Flavor", METADATA_FLAVOR_VALUE),
                ),
        );
    }

    #[tokio::test]
    async fn unreachable() -> anyhow::Result<()> {
        let probe = probe_for("http://127.0.0.1:9");
        assert!(probe.attempt().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn not_metadata_server() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::path("/")).respond_with(status_code(404)),
        );
        let probe = probe_for(&format!("http://{}", server.addr()));
        assert!(probe.attempt().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn with_project() -> anyhow::Result<()> {
        let server = Server::run();
        expect_ping(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method("GET"),
                request::path(MDS_PROJECT_ID_URI),
            ])
            .respond_with(status_code(200).body("example-project")),
        );
        let probe = probe_for(&format!("http://{}", server.addr()));
        let found = probe.attempt().await?.expect("credentials should be found");
        assert_eq!(found.project_id.as_deref(), Some("example-project"));
        let fmt = format!("{:?}", found.credentials);
        assert!(fmt.contains("MDSCredentials"), "{fmt}");
        Ok(())
    }

    #[tokio::test]
    async fn project_fetch_fails() -> anyhow::Result<()> {
        let server = Server::run();
        expect_ping(&server);
        server.expect(
            Expectation::matching(request::path(MDS_PROJECT_ID_URI))
                .respond_with(status_code(500)),
        );
        let probe = probe_for(&format!("http://{}", server.addr()));
        let found = probe.attempt().await?.expect("credentials should be found");
        assert_eq!(found.project_id, None);
        let fmt = format!("{:?}", found.credentials);
        assert!(fmt.contains("MDSCredentials"), "{fmt}");
        Ok(())
    }

    // Answers one ping, then stops listening. Later requests cannot connect.
    async fn ping_only_server() -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let endpoint = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            drop(listener);
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nMetadata-Flavor: {METADATA_FLAVOR_VALUE}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        Ok(endpoint)
    }

    #[tokio::test]
    async fn project_fetch_cannot_connect() -> anyhow::Result<()> {
        let endpoint = ping_only_server().await?;
        let probe = probe_for(&endpoint);
        let found = probe.attempt().await?.expect("credentials should be found");
        assert_eq!(found.project_id, None);
        let fmt = format!("{:?}", found.credentials);
        assert!(fmt.contains("MDSCredentials"), "{fmt}");
        Ok(())
    }
}
