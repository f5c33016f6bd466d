use crate::endpoints::{MiniMaxEndpoint, RequestBody};
use crate::error::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, Response, Url};
use std::time::Duration;
use tracing::{debug, warn};

const TRACE_ID_HEADER: &str = "trace-id";
const APPLICATION_JSON: &str = "application/json";

/// Public MiniMax API host.
pub const DEFAULT_BASE_URL: &str = "https://api.minimaxi.com";

/// MiniMax client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host every endpoint path is resolved against
    pub base_url: String,
    /// Optional account group id, appended as `GroupId` query parameter
    pub group_id: Option<String>,
    /// TCP + TLS connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout, including streamed response bodies
    pub request_timeout: Duration,
    /// How long idle pooled connections are kept
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            group_id: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Response value paired with the provider trace id of the call.
#[derive(Debug, Clone)]
pub struct Traced<T> {
    pub value: T,
    pub trace_id: Option<String>,
}

impl<T> Traced<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Traced<U> {
        Traced {
            value: f(self.value),
            trace_id: self.trace_id,
        }
    }
}

#[derive(Clone)]
pub struct MiniMaxClient {
    inner: reqwest::Client,
    base_url: Url,
    group_id: Option<String>,
    api_key: String,
}

impl std::fmt::Debug for MiniMaxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniMaxClient")
            .field("base_url", &self.base_url.as_str())
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

impl MiniMaxClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::new_with_config(api_key, ClientConfig::default())
    }

    pub fn new_with_config(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let client = http_client_builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self {
            inner: client,
            base_url: config.base_url.parse()?,
            group_id: config.group_id,
            api_key: api_key.into(),
        })
    }

    /// Same connection pool and host, different caller credentials.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            inner: self.inner.clone(),
            base_url: self.base_url.clone(),
            group_id: self.group_id.clone(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn hit<T: MiniMaxEndpoint>(&self, endpoint: T) -> Result<T::ResponseBody> {
        Ok(self.hit_with_trace(endpoint).await?.value)
    }

    /// Hit an endpoint and keep the `Trace-Id` the provider assigned to the call
    pub async fn hit_with_trace<T: MiniMaxEndpoint>(
        &self,
        endpoint: T,
    ) -> Result<Traced<T::ResponseBody>> {
        let resp = self.send(&endpoint).await?;
        let trace_id = trace_id(resp.headers());

        let value = endpoint
            .response_body(resp)
            .await
            .map_err(|e| e.with_trace_id(trace_id.clone()))?;

        Ok(Traced { value, trace_id })
    }

    async fn send<T: MiniMaxEndpoint>(&self, endpoint: &T) -> Result<Response> {
        let mut url = endpoint.url(&self.base_url)?;
        if let Some(group_id) = &self.group_id {
            url.query_pairs_mut().append_pair("GroupId", group_id);
        }
        debug!(method = %T::METHOD, path = url.path(), "calling MiniMax");

        let mut builder = self
            .inner
            .request(T::METHOD, url)
            .bearer_auth(&self.api_key);

        if matches!(T::METHOD, Method::POST | Method::PATCH) {
            let request_body = endpoint.request_body().await?;
            builder = match request_body {
                RequestBody::Json(json) => {
                    builder.header(CONTENT_TYPE, APPLICATION_JSON).json(&json)
                }
                RequestBody::Multipart(form) => builder.multipart(form),
                RequestBody::Empty => return Err(Error::MissingRequestBody),
            };
        }

        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let trace_id = trace_id(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            warn!(status, trace_id = ?trace_id, "MiniMax returned an error status");
            return Err(Error::HttpError {
                status,
                body,
                trace_id,
            });
        }

        Ok(resp)
    }
}

/// `reqwest` builder with rustls (ring) and the webpki root store, shared by
/// every outbound HTTP client in the service.
pub fn http_client_builder() -> reqwest::ClientBuilder {
    // Another component may already have installed a process-wide provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    tls_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    reqwest::Client::builder().use_preconfigured_tls(tls_config)
}

fn trace_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}
