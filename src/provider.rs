//! # Provider
//!
//! The HTTP transport is a capability supplied by the application. The
//! library never owns sockets, retries, or redirects: it builds
//! [`http::Request`] values and validates the [`http::Response`] values
//! the provider hands back.

use std::future::Future;

use bytes::Bytes;

/// `HttpClient` dispatches a single HTTP exchange.
///
/// Implementations MUST NOT follow redirects: authorization-callback
/// and protected-resource semantics depend on the relying party seeing
/// 3xx responses as-is. Cancellation and timeouts are expressed by
/// dropping the returned future.
pub trait HttpClient: Send + Sync {
    /// Execute the request, resolving with the complete response body.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport-level failures (DNS, TLS,
    /// connection reset). Non-2xx statuses are responses, not errors.
    fn fetch(
        &self, request: http::Request<Bytes>,
    ) -> impl Future<Output = anyhow::Result<http::Response<Bytes>>> + Send;
}

#[cfg(test)]
pub(crate) mod test {
    use anyhow::anyhow;
    use bytes::Bytes;

    use super::HttpClient;

    /// A provider for paths that must not reach the network.
    pub struct Unreachable;

    impl HttpClient for Unreachable {
        async fn fetch(
            &self, request: http::Request<Bytes>,
        ) -> anyhow::Result<http::Response<Bytes>> {
            Err(anyhow!("unexpected fetch of {}", request.uri()))
        }
    }

    pub fn unreachable() -> Unreachable {
        Unreachable
    }
}
