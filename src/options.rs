// Per-request passthrough options, forwarded to the transport unvalidated.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

/// Options for a single request: extra headers, query parameters, a body,
/// and a per-call timeout.
///
/// The set of meaningful knobs is defined by the transport, not by this
/// crate; everything here is handed through as-is.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header to this request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Per-call deadline, overriding the transport default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Append the query parameters to the resolved URL. This happens before
    /// the Authorization header is computed, so the digest request-uri
    /// matches what actually goes on the wire.
    pub(crate) fn apply_query(&self, url: &mut Url) {
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    pub(crate) fn apply(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder = builder.headers(self.headers.clone());
        if let Some(ref body) = self.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    pub(crate) fn apply_blocking(
        &self,
        mut builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        builder = builder.headers(self.headers.clone());
        if let Some(ref body) = self.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parameters_extend_the_url() {
        let options = RequestOptions::new().query("security", "1").query("format", "json");
        let mut url = Url::parse("http://10.0.0.1/ISAPI/Streaming/channels").expect("url");
        options.apply_query(&mut url);
        assert_eq!(url.query(), Some("security=1&format=json"));
    }

    #[test]
    fn empty_options_leave_the_url_alone() {
        let mut url = Url::parse("http://10.0.0.1/ISAPI/System/status").expect("url");
        RequestOptions::new().apply_query(&mut url);
        assert_eq!(url.query(), None);
    }
}
