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

use super::{AuthorizationGrant, Error, Flow, Result};
use crate::credentials::Credentials;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const DEFAULT_AUTH_PROMPT_MESSAGE: &str =
    "Please visit this URL to authorize this application: {url}";
const DEFAULT_AUTH_CODE_MESSAGE: &str = "Enter the authorization code: ";
const DEFAULT_SUCCESS_MESSAGE: &str =
    "The authentication flow has completed, you may close this window.";
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;

/// How [InstalledAppFlow] receives the authorization code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// The user copies the code from the browser and pastes it in the
    /// console.
    Console,
    /// The browser is redirected to a temporary HTTP server on the local
    /// host, which captures the code.
    Server,
}

/// Runs the authorization flow for command-line applications.
///
/// ```no_run
/// # use google_cloud_adc::flow::{InstalledAppFlow, Strategy};
/// # tokio_test::block_on(async {
/// let mut flow = InstalledAppFlow::from_client_secrets_file(
///     "client_secrets.json",
///     ["https://www.googleapis.com/auth/cloud-platform"],
/// )
/// .await?;
/// let credentials = flow.run(Strategy::Server, &[]).await?;
/// # Ok::<(), google_cloud_adc::flow::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct InstalledAppFlow {
    flow: Flow,
    authorization_prompt_message: String,
    authorization_code_message: String,
    success_message: String,
    host: String,
    port: u16,
    open_browser: bool,
}

impl InstalledAppFlow {
    /// Wraps `flow` with the default messages, redirect server address
    /// (`localhost:8080`) and browser setting.
    pub fn new(flow: Flow) -> Self {
        Self {
            flow,
            authorization_prompt_message: DEFAULT_AUTH_PROMPT_MESSAGE.to_string(),
            authorization_code_message: DEFAULT_AUTH_CODE_MESSAGE.to_string(),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            open_browser: true,
        }
    }

    /// See [Flow::from_client_config].
    pub fn from_client_config<I, S>(client_config: Value, scopes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Flow::from_client_config(client_config, scopes).map(Self::new)
    }

    /// See [Flow::from_client_secrets_file].
    pub async fn from_client_secrets_file<P, I, S>(path: P, scopes: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Flow::from_client_secrets_file(path, scopes)
            .await
            .map(Self::new)
    }

    /// The message shown with the authorization URL.
    ///
    /// `{url}` in the message is replaced by the URL.
    pub fn with_authorization_prompt_message<S: Into<String>>(mut self, message: S) -> Self {
        self.authorization_prompt_message = message.into();
        self
    }

    /// The prompt for the code, used by [Strategy::Console].
    pub fn with_authorization_code_message<S: Into<String>>(mut self, message: S) -> Self {
        self.authorization_code_message = message.into();
        self
    }

    /// The page shown in the browser once [Strategy::Server] receives the
    /// redirect.
    pub fn with_success_message<S: Into<String>>(mut self, message: S) -> Self {
        self.success_message = message.into();
        self
    }

    /// The host for the local redirect server. Defaults to `localhost`.
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// The port for the local redirect server. Defaults to `8080`.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Whether [Strategy::Server] opens the authorization URL in a browser.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// The underlying [Flow], e.g. to inspect the token response after
    /// [run][InstalledAppFlow::run].
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Consumes this value and returns the underlying [Flow].
    pub fn into_flow(self) -> Flow {
        self.flow
    }

    /// Runs the flow and returns the user credentials.
    ///
    /// `params` are added to the authorization URL. Unless `params` says
    /// otherwise the user is always asked for consent, so the token endpoint
    /// returns a refresh token.
    pub async fn run(
        &mut self,
        strategy: Strategy,
        params: &[(&str, &str)],
    ) -> Result<Credentials> {
        match strategy {
            Strategy::Console => {
                let input = BufReader::new(tokio::io::stdin());
                self.run_console(params, input, tokio::io::stdout()).await
            }
            Strategy::Server => {
                let listener = TcpListener::bind((self.host.as_str(), self.port))
                    .await
                    .map_err(Error::io)?;
                self.run_server(params, listener, tokio::io::stdout()).await
            }
        }
    }

    pub(crate) async fn run_console<R, W>(
        &mut self,
        params: &[(&str, &str)],
        mut input: R,
        mut output: W,
    ) -> Result<Credentials>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.flow.set_redirect_uri(OOB_REDIRECT_URI);
        let (url, _) = self.flow.authorization_url(&with_consent(params))?;

        let prompt = format!(
            "{}\n\n{}",
            self.authorization_prompt_message.replace("{url}", &url),
            self.authorization_code_message
        );
        output.write_all(prompt.as_bytes()).await.map_err(Error::io)?;
        output.flush().await.map_err(Error::io)?;

        let mut code = String::new();
        input.read_line(&mut code).await.map_err(Error::io)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::authorization("no authorization code was entered"));
        }
        self.flow
            .fetch_token(AuthorizationGrant::Code(code.to_string()))
            .await?;
        self.flow.credentials()
    }

    pub(crate) async fn run_server<W>(
        &mut self,
        params: &[(&str, &str)],
        listener: TcpListener,
        mut output: W,
    ) -> Result<Credentials>
    where
        W: AsyncWrite + Unpin,
    {
        let port = listener.local_addr().map_err(Error::io)?.port();
        let redirect_uri = format!("http://{}:{port}/", self.host);
        self.flow.set_redirect_uri(redirect_uri.as_str());
        let (url, _) = self.flow.authorization_url(&with_consent(params))?;

        if self.open_browser {
            if let Err(e) = webbrowser::open(&url) {
                tracing::warn!("cannot open a browser for the authorization URL: {e}");
            }
        }
        let prompt = format!(
            "{}\n",
            self.authorization_prompt_message.replace("{url}", &url)
        );
        output.write_all(prompt.as_bytes()).await.map_err(Error::io)?;
        output.flush().await.map_err(Error::io)?;

        let path = receive_redirect(&listener, &self.success_message).await?;
        tracing::info!("received the authorization redirect on port {port}");
        let authorization_response = format!("http://{}:{port}{path}", self.host);
        self.flow
            .fetch_token(AuthorizationGrant::AuthorizationResponse(
                authorization_response,
            ))
            .await?;
        self.flow.credentials()
    }
}

fn with_consent<'a>(params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut params = params.to_vec();
    if !params.iter().any(|(k, _)| *k == "prompt") {
        params.push(("prompt", "consent"));
    }
    params
}

/// Accepts one request on `listener`, answers it with `success_message`,
/// and returns the request target.
pub(crate) async fn receive_redirect(
    listener: &TcpListener,
    success_message: &str,
) -> Result<String> {
    let (stream, peer) = listener.accept().await.map_err(Error::io)?;
    tracing::debug!("redirect connection from {peer}");
    let mut stream = BufReader::new(stream);

    let mut request_line = String::new();
    stream
        .read_line(&mut request_line)
        .await
        .map_err(Error::io)?;
    loop {
        let mut header = String::new();
        let n = stream.read_line(&mut header).await.map_err(Error::io)?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{success_message}",
        success_message.len()
    );
    let stream = stream.get_mut();
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(Error::io)?;
    stream.shutdown().await.map_err(Error::io)?;

    // Request line: METHOD SP request-target SP HTTP-version
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(_), Some(target)) if target.starts_with('/') => Ok(target.to_string()),
        _ => Err(Error::authorization(format!(
            "unexpected redirect request: {}",
            request_line.trim_end()
        ))),
    }
}
