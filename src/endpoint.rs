// Device addressing: scheme/host/port and base-URL construction.

use url::Url;

use crate::error::Error;

/// Network identity of a target device.
///
/// The scheme is lowercased at construction and defaults to `http`. The
/// effective port defaults to 443 for `https` and 80 for everything else,
/// so an unrecognized scheme is carried verbatim into the base URL and only
/// changes which default port applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    host: String,
    port: Option<u16>,
    scheme: String,
}

impl DeviceEndpoint {
    /// Endpoint for `host` with the default scheme (`http`, port 80).
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            scheme: "http".into(),
        }
    }

    /// Set the scheme (`http` or `https`; lowercased).
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_ascii_lowercase();
        self
    }

    /// Set an explicit port, overriding the scheme default.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The device host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The normalized scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The effective port: the explicit value if one was given, else 443
    /// for `https`, else 80.
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or(if self.scheme == "https" { 443 } else { 80 })
    }

    /// The base URL, `{scheme}://{host}:{port}`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port())
    }

    /// Resolve `endpoint` against the base URL with standard relative-URL
    /// join rules. An absolute endpoint overrides the base entirely.
    pub fn join(&self, endpoint: &str) -> Result<Url, Error> {
        let base = Url::parse(&self.base_url())?;
        Ok(base.join(endpoint)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_follow_scheme() {
        assert_eq!(DeviceEndpoint::new("10.0.0.1").base_url(), "http://10.0.0.1:80");
        assert_eq!(
            DeviceEndpoint::new("10.0.0.1").with_scheme("https").base_url(),
            "https://10.0.0.1:443"
        );
    }

    #[test]
    fn explicit_port_overrides_default() {
        let ep = DeviceEndpoint::new("10.0.0.1").with_scheme("https").with_port(8443);
        assert_eq!(ep.base_url(), "https://10.0.0.1:8443");
    }

    #[test]
    fn scheme_is_lowercased() {
        let ep = DeviceEndpoint::new("cam.local").with_scheme("HTTPS");
        assert_eq!(ep.scheme(), "https");
        assert_eq!(ep.port(), 443);
    }

    #[test]
    fn unrecognized_scheme_keeps_the_http_default_port() {
        let ep = DeviceEndpoint::new("cam.local").with_scheme("rtsp");
        assert_eq!(ep.base_url(), "rtsp://cam.local:80");
    }

    #[test]
    fn join_resolves_relative_endpoints() {
        let ep = DeviceEndpoint::new("10.0.0.1");
        let url = ep.join("/ISAPI/System/status").expect("join");
        assert_eq!(url.as_str(), "http://10.0.0.1/ISAPI/System/status");

        let ep = DeviceEndpoint::new("10.0.0.1").with_scheme("https").with_port(8443);
        let url = ep.join("/ISAPI/System/status").expect("join");
        assert_eq!(url.as_str(), "https://10.0.0.1:8443/ISAPI/System/status");
    }

    #[test]
    fn join_accepts_paths_without_a_leading_slash() {
        let ep = DeviceEndpoint::new("10.0.0.1");
        let url = ep.join("ISAPI/System/status").expect("join");
        assert_eq!(url.as_str(), "http://10.0.0.1/ISAPI/System/status");
    }

    #[test]
    fn absolute_endpoint_overrides_the_base() {
        let ep = DeviceEndpoint::new("10.0.0.1");
        let url = ep
            .join("http://192.168.1.5:8080/ISAPI/Streaming/channels")
            .expect("join");
        assert_eq!(url.as_str(), "http://192.168.1.5:8080/ISAPI/Streaming/channels");
    }
}
