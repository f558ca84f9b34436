// isapi-client: blocking and async HTTP clients for ISAPI camera/NVR
// devices, with transparent Digest reauthentication on session expiry.

pub mod async_client;
pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod options;
pub mod transport;

pub use async_client::AsyncClient;
pub use auth::Credentials;
pub use client::Client;
pub use endpoint::DeviceEndpoint;
pub use error::Error;
pub use options::RequestOptions;
pub use transport::{TlsMode, TransportConfig};

pub use reqwest::{Method, StatusCode};
