#![allow(clippy::unwrap_used)]
// Behavior tests for the blocking `Client`. wiremock is async-only, so the
// mock device runs on a manually driven runtime while the client itself
// stays on the test thread.

use std::time::Duration;

use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use isapi_client::{Client, Credentials, DeviceEndpoint, Error, Method, RequestOptions};

const CHALLENGE: &str = r#"Digest realm="IP Camera(C1024)", qop="auth", nonce="b29a3c11d6e1aa8f5f4a", algorithm=MD5"#;

/// Matches requests carrying a digest Authorization header for `admin`.
struct DigestAuthHeader;

impl Match for DigestAuthHeader {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value.starts_with("Digest ") && value.contains(r#"username="admin""#)
            })
    }
}

fn start() -> (Runtime, MockServer) {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    (rt, server)
}

fn client(server: &MockServer) -> Client {
    let addr = server.address();
    let endpoint = DeviceEndpoint::new(addr.ip().to_string()).with_port(addr.port());
    Client::new(endpoint, Credentials::new("admin", "secret")).unwrap()
}

#[test]
fn non_401_means_a_single_exchange() {
    let (rt, server) = start();
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<DeviceStatus/>"))
            .expect(1)
            .mount(&server),
    );

    let client = client(&server);
    let resp = client.get("/ISAPI/System/status").unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().unwrap(), "<DeviceStatus/>");
}

#[test]
fn reauthenticates_exactly_once_on_401() {
    let (rt, server) = start();
    rt.block_on(async {
        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .and(DigestAuthHeader)
            .respond_with(ResponseTemplate::new(200).set_body_string("<DeviceStatus/>"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", CHALLENGE))
            .expect(1)
            .mount(&server)
            .await;
    });

    let client = client(&server);
    let resp = client
        .request(Method::GET, "/ISAPI/System/status", RequestOptions::new())
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[test]
fn persistent_401_is_returned_after_two_exchanges() {
    let (rt, server) = start();
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", CHALLENGE))
            .expect(2)
            .mount(&server),
    );

    let client = client(&server);
    let resp = client.get("/ISAPI/System/status").unwrap();

    assert_eq!(resp.status(), 401);
}

#[test]
fn http_error_statuses_do_not_raise() {
    let (rt, server) = start();
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server),
    );

    let client = client(&server);
    let resp = client.get("/ISAPI/System/status").unwrap();

    assert_eq!(resp.status(), 404);
}

#[test]
fn timeout_propagates_without_triggering_a_retry() {
    let (rt, server) = start();
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/ISAPI/System/status"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .expect(1)
            .mount(&server),
    );

    let client = client(&server);
    let options = RequestOptions::new().timeout(Duration::from_millis(50));
    let err = client
        .request(Method::GET, "/ISAPI/System/status", options)
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got: {err:?}");
}

#[test]
fn request_after_close_fails_without_touching_the_network() {
    let (rt, server) = start();

    let client = client(&server);
    client.close();
    client.close();

    let err = client.get("/ISAPI/System/status").unwrap_err();
    assert!(matches!(err, Error::Closed), "expected Closed, got: {err:?}");

    let received = rt.block_on(server.received_requests()).unwrap();
    assert!(received.is_empty(), "no physical request should be attempted");
}
