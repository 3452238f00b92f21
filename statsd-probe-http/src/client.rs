use bytes::Bytes;
use http_body_util::{BodyExt as _, Empty};
use hyper::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::util::{has_header, host_header_value, join_url};
use super::{Error, HttpRequest, HttpResponse, ProbeResult, Result};

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        // The OS-level TCP connect timeout can be very long (tens of seconds), which can cause
        // the startup health check to appear “hung” when the target host is unreachable.
        Self::new(Some(Duration::from_secs(3)))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(connect_timeout);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        // Every probe must hit the wire exactly once.
        let inner = Client::builder(TokioExecutor::new())
            .retry_canceled_requests(false)
            .build(https_connector);

        Self { inner }
    }

    /// Sends one request and buffers the full response body.
    ///
    /// When `req.timeout` is set it bounds the whole exchange (connect, head and body);
    /// on expiry the in-flight connection is dropped.
    pub async fn request(&self, req: HttpRequest) -> Result<HttpResponse> {
        match req.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.send(req)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout(timeout)),
            },
            None => self.send(req).await,
        }
    }

    /// GET `path` relative to `base_url`, flattening the outcome into a [`ProbeResult`].
    pub async fn probe(
        &self,
        base_url: &str,
        path: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> ProbeResult {
        let req = HttpRequest::get_owned(join_url(base_url, path))
            .with_headers(headers.iter().cloned())
            .with_timeout(timeout);
        self.request(req).await.into()
    }

    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let parsed = url::Url::parse(&req.url).map_err(|_| Error::InvalidUrl(req.url.clone()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::UnsupportedScheme(req.url));
        }

        let uri: hyper::Uri = req
            .url
            .parse()
            .map_err(|_| Error::InvalidUrl(req.url.to_string()))?;

        let mut builder = Request::builder().method(req.method).uri(uri);

        if !has_header(&req.headers, "host")
            && let Some(host) = host_header_value(&parsed)
        {
            builder = builder.header(http::header::HOST, host);
        }

        for (k, v) in req.headers {
            let name = http::header::HeaderName::from_bytes(k.as_bytes())?;
            let value = http::header::HeaderValue::from_str(&v)?;
            builder = builder.header(name, value);
        }

        let req: Request<Empty<Bytes>> = builder.body(Empty::new())?;
        let res = self.inner.request(req).await?;

        let status = res.status().as_u16();
        let body = res.into_body().collect().await?.to_bytes();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::HttpTransportErrorKind;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    /// Accepts one connection, captures the request head and answers with `response`.
    async fn one_shot_server(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut head = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                head.extend_from_slice(&buf[..n]);
                if n == 0 || head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (format!("http://{addr}"), task)
    }

    #[tokio::test]
    async fn buffers_body_and_sends_headers() {
        let (base, task) = one_shot_server(
            "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nconnection: close\r\n\r\ntoken",
        )
        .await;

        let client = HttpClient::default();
        let res = client
            .probe(
                &base,
                "/login",
                &[("authorize".to_string(), "Basic a:b".to_string())],
                Duration::from_secs(2),
            )
            .await;

        assert_eq!(res.status, Some(200));
        assert_eq!(&res.body[..], b"token");
        assert!(res.error.is_none());

        let head = task.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /login http/1.1"), "head: {head}");
        assert!(head.contains("authorize: basic a:b"), "head: {head}");
    }

    #[tokio::test]
    async fn error_status_is_a_response_not_a_failure() {
        let (base, _task) = one_shot_server(
            "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let res = HttpClient::default()
            .probe(&base, "/login", &[], Duration::from_secs(2))
            .await;
        assert_eq!(res.status, Some(401));
        assert!(res.body.is_empty());
        assert!(res.error.is_none());
    }

    #[tokio::test]
    async fn silent_server_times_out_instead_of_hanging() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let started = Instant::now();
        let res = HttpClient::default()
            .probe(
                &format!("http://{addr}"),
                "/login",
                &[],
                Duration::from_millis(200),
            )
            .await;

        assert_eq!(res.error_kind(), Some(HttpTransportErrorKind::Timeout));
        assert_eq!(res.status, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn closed_port_is_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpClient::default()
            .request(HttpRequest::get_owned(format!("http://{addr}/login")))
            .await
            .unwrap_err();
        assert_eq!(
            err.transport_error_kind(),
            HttpTransportErrorKind::ConnectionRefused
        );
    }

    #[tokio::test]
    async fn unreachable_host_fails_fast_with_connect_timeout() {
        let client = HttpClient::new(Some(Duration::from_millis(200)));
        let req = HttpRequest::get_owned("http://192.0.2.1:81/".to_string());

        let started = Instant::now();
        let _err = client.request(req).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(
            elapsed < Duration::from_secs(2),
            "expected fast failure, elapsed={elapsed:?}"
        );
    }

    #[tokio::test]
    async fn rejects_non_http_scheme() {
        let err = HttpClient::default()
            .request(HttpRequest::get_owned("ftp://127.0.0.1/login".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err.transport_error_kind(),
            HttpTransportErrorKind::UnsupportedScheme
        );
    }
}
