// Suspension-capable ISAPI client.
//
// Same contract as the blocking `Client`, but the session is created lazily
// on first use and requests suspend at each network hop, so several may be
// in flight on one client at a time.

use std::sync::Mutex;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, DigestState, digest_challenge};
use crate::endpoint::DeviceEndpoint;
use crate::error::Error;
use crate::options::RequestOptions;
use crate::transport::TransportConfig;

/// Async HTTP client for one ISAPI device.
///
/// A 401 from the device triggers one transparent reauthentication: the
/// digest state is rebuilt from the stored credentials and the request is
/// re-issued exactly once. HTTP error statuses are returned to the caller
/// unchanged; only transport failures raise.
///
/// Concurrent requests share the session and its digest state. When several
/// in-flight calls hit a 401 at the same time, each rebinds and retries;
/// the last challenge written wins. Each swap is atomic, but the pairs are
/// deliberately not serialized against each other.
pub struct AsyncClient {
    endpoint: DeviceEndpoint,
    auth: DigestState,
    transport: TransportConfig,
    http: Mutex<Option<reqwest::Client>>,
}

impl AsyncClient {
    /// Create a client with default transport settings (TLS verification
    /// off -- these devices ship self-signed certificates).
    ///
    /// No network I/O happens here; the session is built on first use.
    pub fn new(endpoint: DeviceEndpoint, credentials: Credentials) -> Self {
        Self::with_transport(endpoint, credentials, TransportConfig::default())
    }

    /// Create a client with explicit transport settings.
    pub fn with_transport(
        endpoint: DeviceEndpoint,
        credentials: Credentials,
        transport: TransportConfig,
    ) -> Self {
        Self {
            endpoint,
            auth: DigestState::new(credentials),
            transport,
            http: Mutex::new(None),
        }
    }

    /// The device this client talks to.
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// The device base URL, e.g. `http://10.0.0.1:80`.
    pub fn base_url(&self) -> String {
        self.endpoint.base_url()
    }

    /// Send `method` to `endpoint` (joined against the base URL) and return
    /// the response, reauthenticating once on a 401.
    ///
    /// The second response is returned whatever its status; a persistent
    /// 401 means the credentials themselves are wrong.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let mut url = self.endpoint.join(endpoint)?;
        options.apply_query(&mut url);

        let response = self.send(&method, &url, &options).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!("received 401, endpoint: {endpoint}; refreshing digest credentials");
        let Some(challenge) = digest_challenge(response.headers()).map(str::to_owned) else {
            warn!("401 without a digest challenge, endpoint: {endpoint}");
            return Ok(response);
        };
        self.auth.rebind(&challenge)?;

        let retried = self.send(&method, &url, &options).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("still 401 after refresh, endpoint: {endpoint}; check username and password");
        }
        Ok(retried)
    }

    /// `GET` convenience wrapper.
    pub async fn get(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(Method::GET, endpoint, RequestOptions::new()).await
    }

    /// `POST` convenience wrapper.
    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<Response, Error> {
        self.request(Method::POST, endpoint, options).await
    }

    /// `PUT` convenience wrapper.
    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<Response, Error> {
        self.request(Method::PUT, endpoint, options).await
    }

    /// `DELETE` convenience wrapper.
    pub async fn delete(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(Method::DELETE, endpoint, RequestOptions::new()).await
    }

    /// One physical exchange: answer the cached digest challenge if there is
    /// one, apply per-call options, classify transport failures.
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<Response, Error> {
        let http = self.session()?;
        debug!("{method} {url}");

        let mut builder = http.request(method.clone(), url.clone());
        if let Some(header) = self.auth.authorize(method, url, options.body_bytes())? {
            builder = builder.header(AUTHORIZATION, header);
        }

        options
            .apply(builder)
            .send()
            .await
            .map_err(|err| Error::transport(url.path(), err))
    }

    /// The session, built on first use (and again after `close()`).
    fn session(&self) -> Result<reqwest::Client, Error> {
        let mut guard = self.http.lock().expect("session lock poisoned");
        if let Some(ref http) = *guard {
            return Ok(http.clone());
        }
        let http = self.transport.build_client()?;
        *guard = Some(http.clone());
        Ok(http)
    }

    /// Release the connection pool. Safe to call more than once; a later
    /// `request` builds a fresh session. Dropping the client releases the
    /// pool as well.
    pub fn close(&self) {
        self.http.lock().expect("session lock poisoned").take();
    }
}
