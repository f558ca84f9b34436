// Digest authentication state: the stored credentials plus the cached
// WWW-Authenticate challenge that is answered on every outgoing request.
//
// The digest algorithm itself lives in the `digest_auth` crate; this module
// only wires it to the request/response cycle.

use std::sync::Mutex;

use digest_auth::{AuthContext, HttpMethod, WwwAuthenticateHeader};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue, WWW_AUTHENTICATE};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Username/password pair for Digest authentication.
///
/// The password is held as a [`SecretString`] and never logged.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into().into(),
        }
    }

    /// The login username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Digest handshake state shared by one client.
///
/// Holds at most one parsed challenge at a time. [`rebind`](Self::rebind)
/// discards it for a fresh one parsed from a 401 -- the connection pool is
/// untouched, only the auth state is rebuilt.
pub(crate) struct DigestState {
    credentials: Credentials,
    challenge: Mutex<Option<WwwAuthenticateHeader>>,
}

impl DigestState {
    pub(crate) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            challenge: Mutex::new(None),
        }
    }

    /// Answer the cached challenge for one outgoing request.
    ///
    /// Returns `None` before the first handshake -- the device's 401 supplies
    /// the initial challenge. The nonce-use counter inside the cached
    /// challenge advances on every call.
    pub(crate) fn authorize(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<Option<HeaderValue>, Error> {
        let mut guard = self.challenge.lock().expect("digest state lock poisoned");
        let Some(challenge) = guard.as_mut() else {
            return Ok(None);
        };
        let uri = request_uri(url);
        let context = AuthContext::new_with_method(
            self.credentials.username.as_str(),
            self.credentials.password.expose_secret(),
            uri.as_str(),
            body,
            HttpMethod::from(method.as_str()),
        );
        let answer = challenge.respond(&context)?;
        Ok(Some(HeaderValue::from_str(&answer.to_header_string())?))
    }

    /// Replace the cached challenge with a fresh one parsed from a 401's
    /// `WWW-Authenticate` value.
    pub(crate) fn rebind(&self, www_authenticate: &str) -> Result<(), Error> {
        let fresh = WwwAuthenticateHeader::parse(www_authenticate)?;
        *self.challenge.lock().expect("digest state lock poisoned") = Some(fresh);
        Ok(())
    }
}

/// Pick the Digest challenge out of a 401's headers, skipping other schemes.
pub(crate) fn digest_challenge(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| {
            let value = value.trim_start();
            value.len() >= 6 && value[..6].eq_ignore_ascii_case("digest")
        })
}

/// Request-URI for the digest hash: path plus query, matching what goes on
/// the wire.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_owned(),
    }
}
