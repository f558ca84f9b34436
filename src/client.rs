// Blocking ISAPI client.
//
// Same contract as `AsyncClient`, but the session is built eagerly at
// construction and every request runs to completion on the calling thread.
// No locking is added beyond what the digest state needs; thread safety of
// concurrent requests is the transport's business.

use std::sync::Mutex;

use reqwest::blocking::Response;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, DigestState, digest_challenge};
use crate::endpoint::DeviceEndpoint;
use crate::error::Error;
use crate::options::RequestOptions;
use crate::transport::TransportConfig;

/// Blocking HTTP client for one ISAPI device.
///
/// A 401 from the device triggers one transparent reauthentication: the
/// digest state is rebuilt from the stored credentials and the request is
/// re-issued exactly once. HTTP error statuses are returned to the caller
/// unchanged; only transport failures raise.
pub struct Client {
    endpoint: DeviceEndpoint,
    auth: DigestState,
    http: Mutex<Option<reqwest::blocking::Client>>,
}

impl Client {
    /// Create a client with default transport settings (TLS verification
    /// off -- these devices ship self-signed certificates).
    ///
    /// The session is built here, eagerly; no network I/O happens yet.
    pub fn new(endpoint: DeviceEndpoint, credentials: Credentials) -> Result<Self, Error> {
        Self::with_transport(endpoint, credentials, TransportConfig::default())
    }

    /// Create a client with explicit transport settings.
    pub fn with_transport(
        endpoint: DeviceEndpoint,
        credentials: Credentials,
        transport: TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_blocking_client()?;
        Ok(Self {
            endpoint,
            auth: DigestState::new(credentials),
            http: Mutex::new(Some(http)),
        })
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
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, Error> {
        let mut url = self.endpoint.join(endpoint)?;
        options.apply_query(&mut url);

        let response = self.send(&method, &url, &options)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!("received 401, endpoint: {endpoint}; refreshing digest credentials");
        let Some(challenge) = digest_challenge(response.headers()).map(str::to_owned) else {
            warn!("401 without a digest challenge, endpoint: {endpoint}");
            return Ok(response);
        };
        self.auth.rebind(&challenge)?;

        let retried = self.send(&method, &url, &options)?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("still 401 after refresh, endpoint: {endpoint}; check username and password");
        }
        Ok(retried)
    }

    /// `GET` convenience wrapper.
    pub fn get(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(Method::GET, endpoint, RequestOptions::new())
    }

    /// `POST` convenience wrapper.
    pub fn post(&self, endpoint: &str, options: RequestOptions) -> Result<Response, Error> {
        self.request(Method::POST, endpoint, options)
    }

    /// `PUT` convenience wrapper.
    pub fn put(&self, endpoint: &str, options: RequestOptions) -> Result<Response, Error> {
        self.request(Method::PUT, endpoint, options)
    }

    /// `DELETE` convenience wrapper.
    pub fn delete(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(Method::DELETE, endpoint, RequestOptions::new())
    }

    /// One physical exchange: answer the cached digest challenge if there is
    /// one, apply per-call options, classify transport failures.
    fn send(
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
            .apply_blocking(builder)
            .send()
            .map_err(|err| Error::transport(url.path(), err))
    }

    fn session(&self) -> Result<reqwest::blocking::Client, Error> {
        self.http
            .lock()
            .expect("session lock poisoned")
            .as_ref()
            .cloned()
            .ok_or(Error::Closed)
    }

    /// Release the connection pool. Safe to call more than once; requests
    /// after `close()` fail with [`Error::Closed`] without touching the
    /// network. Dropping the client releases the pool as well.
    pub fn close(&self) {
        self.http.lock().expect("session lock poisoned").take();
    }
}
