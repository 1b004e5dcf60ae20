//! HTTP client for the model-backed remote predictor.
//!
//! Sends `{"pct_min", "cum_min"}` as a JSON POST over HTTP/1.1, in the
//! clear for `http://` endpoints and through rustls for `https://` ones.
//! One deadline covers the whole exchange including retries, so a dead
//! remote costs at most `timeout` before the caller falls back.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use matsize_core::config::RemoteConfig;
use matsize_core::{InputPair, ResultSummary};

use crate::error::{PredictError, PredictResult};
use crate::Predictor;

/// The remote answers either with the `{"success", "result"}` envelope or
/// with a bare result object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteBody {
    Envelope { result: ResultSummary },
    Bare(ResultSummary),
}

impl RemoteBody {
    fn into_summary(self) -> ResultSummary {
        match self {
            RemoteBody::Envelope { result } | RemoteBody::Bare(result) => result,
        }
    }
}

/// Client for one remote predict endpoint.
pub struct RemotePredictor {
    endpoint: String,
    /// `host:port` to dial.
    addr: String,
    /// Value of the `Host` header.
    authority: String,
    host: String,
    path: String,
    /// Present for `https://` endpoints only.
    tls: Option<TlsConnector>,
    timeout: Duration,
    retries: u32,
}

impl RemotePredictor {
    /// Create a client for `url` (`http://` or `https://`).
    pub fn new(url: &str, timeout: Duration, retries: u32) -> PredictResult<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| PredictError::InvalidUrl(format!("{url}: {e}")))?;

        let (default_port, tls) = match uri.scheme_str() {
            Some("http") => (80, None),
            Some("https") => (443, Some(tls_connector()?)),
            other => {
                return Err(PredictError::InvalidUrl(format!(
                    "{url}: unsupported scheme {}",
                    other.unwrap_or("(none)")
                )));
            }
        };

        let authority = uri
            .authority()
            .ok_or_else(|| PredictError::InvalidUrl(format!("{url}: missing host")))?;
        let host = authority.host().to_string();
        let port = authority.port_u16().unwrap_or(default_port);
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            endpoint: url.to_string(),
            addr: format!("{host}:{port}"),
            authority: authority.as_str().to_string(),
            host,
            path,
            tls,
            timeout,
            retries,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> PredictResult<Self> {
        Self::new(&config.predict_url(), config.timeout(), config.retries)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn predict_with_retries(&self, body: Bytes) -> PredictResult<ResultSummary> {
        let mut attempt = 0;
        loop {
            match self.attempt(body.clone()).await {
                Ok(summary) => return Ok(summary),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    debug!(
                        error = %e,
                        attempt,
                        retries = self.retries,
                        endpoint = %self.endpoint,
                        "remote predict failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, body: Bytes) -> PredictResult<ResultSummary> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| PredictError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        let (status, payload) = match &self.tls {
            Some(connector) => {
                let server_name = rustls::pki_types::ServerName::try_from(self.host.clone())
                    .map_err(|e| PredictError::TlsConfig(format!("invalid server name '{}': {e}", self.host)))?;
                let tls_stream = connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|source| PredictError::Connect {
                        addr: self.addr.clone(),
                        source,
                    })?;
                self.exchange(tls_stream, body).await?
            }
            None => self.exchange(stream, body).await?,
        };

        if !status.is_success() {
            debug!(%status, endpoint = %self.endpoint, "remote predict non-2xx");
            return Err(PredictError::Status(status.as_u16()));
        }

        let parsed: RemoteBody = serde_json::from_slice(&payload)?;
        Ok(parsed.into_summary())
    }

    async fn exchange<S>(&self, stream: S, body: Bytes) -> PredictResult<(http::StatusCode, Bytes)>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "remote predictor connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(self.path.as_str())
            .header(HOST, self.authority.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, concat!("matsize/", env!("CARGO_PKG_VERSION")))
            .body(Full::new(body))?;

        let resp = sender.send_request(req).await?;
        let status = resp.status();
        let payload = resp.into_body().collect().await?.to_bytes();
        Ok((status, payload))
    }
}

impl Predictor for RemotePredictor {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn predict(&self, input: InputPair) -> PredictResult<ResultSummary> {
        let body = Bytes::from(serde_json::to_vec(&input)?);
        match tokio::time::timeout(self.timeout, self.predict_with_retries(body)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(endpoint = %self.endpoint, timeout = ?self.timeout, "remote predict timed out");
                Err(PredictError::Timeout(self.timeout))
            }
        }
    }
}

/// rustls client config backed by the Mozilla root store.
fn tls_connector() -> PredictResult<TlsConnector> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .map_err(|e| PredictError::TlsConfig(format!("tls protocol version error: {e}")))?
    .with_root_certificates(root_store)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
