//! reqwest-backed connections
//!
//! Each [`ReqwestConnection`] buffers the request body, performs the exchange
//! on the first call to `response_code` and keeps the whole response in
//! memory. The async reqwest client is driven through the tokio runtime
//! handle that was current when the connection was prepared, so connections
//! must be used from a blocking worker (`spawn_blocking`), never from inside
//! an async task.

use crate::connection::{Connection, ConnectionPreparer};
use crate::error::Result;
use bytes::Bytes;
use http::Method;
use reqwest::Client as ReqwestClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::{self, Cursor, Read, Write};
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

/// HTTP connection configuration
#[derive(Clone, Debug, Default)]
pub struct HttpConnectionConfig {
    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,

    /// Connection timeout; `None` uses the client default
    pub connect_timeout: Option<Duration>,

    /// Headers sent with every request
    pub default_headers: Vec<(String, String)>,
}

/// Connection preparer for one resource URL
///
/// Collection requests go to the resource URL itself; entity requests append
/// the id as a percent-encoded path segment.
///
/// # Panics
///
/// Connections drive the async client with `Handle::block_on`, so a
/// transport call made directly on an async task panics ("Cannot start a
/// runtime from within a runtime"). Run calls on a blocking worker:
///
/// ```ignore
/// let response = tokio::task::spawn_blocking(move || transport.get()).await??;
/// ```
///
/// Preparing a connection outside any tokio runtime returns an error.
#[derive(Clone, Debug)]
pub struct ReqwestConnectionPreparer {
    client: ReqwestClient,
    resource_url: Url,
    default_headers: HeaderMap,
}

impl ReqwestConnectionPreparer {
    /// Create a preparer with default configuration
    pub fn new(resource_url: Url) -> Result<Self> {
        Self::with_config(resource_url, HttpConnectionConfig::default())
    }

    /// Create a preparer with custom configuration
    pub fn with_config(resource_url: Url, config: HttpConnectionConfig) -> Result<Self> {
        if resource_url.cannot_be_a_base() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource URL cannot have path segments: {resource_url}"),
            )
            .into());
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build()?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        Ok(Self {
            client,
            resource_url,
            default_headers,
        })
    }

    /// The URL collection requests are sent to
    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    /// The URL for a request, with the entity id appended when present
    pub fn url_for(&self, id: Option<&str>) -> io::Result<Url> {
        let mut url = self.resource_url.clone();
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|()| {
                    io::Error::new(io::ErrorKind::InvalidInput, "resource URL cannot be a base")
                })?
                .pop_if_empty()
                .push(id);
        }
        Ok(url)
    }
}

impl ConnectionPreparer for ReqwestConnectionPreparer {
    fn prepare(&self, id: Option<&str>) -> io::Result<Box<dyn Connection>> {
        let runtime = Handle::try_current().map_err(io::Error::other)?;
        Ok(Box::new(ReqwestConnection {
            client: self.client.clone(),
            runtime,
            url: self.url_for(id)?,
            method: Method::GET,
            headers: self.default_headers.clone(),
            body: None,
            response: None,
        }))
    }
}

/// One buffered HTTP exchange over reqwest
#[derive(Debug)]
pub struct ReqwestConnection {
    client: ReqwestClient,
    runtime: Handle,
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    response: Option<BufferedResponse>,
}

#[derive(Debug)]
struct BufferedResponse {
    status: u16,
    headers: Vec<(String, Vec<String>)>,
    body: Bytes,
}

impl ReqwestConnection {
    /// The URL this connection sends to
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn response(&mut self) -> io::Result<&BufferedResponse> {
        if self.response.is_none() {
            let response = self.send()?;
            self.response = Some(response);
        }
        self.response
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no response received"))
    }

    fn send(&mut self) -> io::Result<BufferedResponse> {
        let mut request = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = self.body.take() {
            request = request.body(body);
        }

        self.runtime
            .block_on(async move {
                let response = request.send().await?;
                let status = response.status().as_u16();
                let headers = header_fields(response.headers());
                let body = response.bytes().await?;
                Ok::<_, reqwest::Error>(BufferedResponse {
                    status,
                    headers,
                    body,
                })
            })
            .map_err(io::Error::other)
    }
}

impl Connection for ReqwestConnection {
    fn set_request_method(&mut self, method: Method) {
        self.method = method;
    }

    fn request_method(&self) -> &Method {
        &self.method
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    fn output_stream(&mut self) -> io::Result<&mut dyn Write> {
        if self.response.is_some() {
            return Err(io::Error::other("request already sent"));
        }
        Ok(self.body.get_or_insert_with(Vec::new) as &mut dyn Write)
    }

    fn response_code(&mut self) -> io::Result<u16> {
        self.response().map(|response| response.status)
    }

    fn input_stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        let response = self.response()?;
        Ok(Box::new(Cursor::new(&response.body[..])))
    }

    fn error_stream(&mut self) -> Option<Box<dyn Read + '_>> {
        match &self.response {
            Some(response) if response.status >= 400 && !response.body.is_empty() => {
                Some(Box::new(Cursor::new(&response.body[..])))
            }
            _ => None,
        }
    }

    fn header_fields(&self) -> Vec<(String, Vec<String>)> {
        self.response
            .as_ref()
            .map(|response| response.headers.clone())
            .unwrap_or_default()
    }
}

fn parse_header(name: &str, value: &str) -> io::Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid header name '{name}': {e}"),
        )
    })?;
    let value = HeaderValue::from_str(value).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid header value for '{name}': {e}"),
        )
    })?;
    Ok((name, value))
}

fn header_fields(headers: &HeaderMap) -> Vec<(String, Vec<String>)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_owned(), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RestTransport, TransportError};
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn preparer(url: &str) -> ReqwestConnectionPreparer {
        ReqwestConnectionPreparer::new(url.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_url_for_collection_and_entity() {
        let preparer = preparer("http://localhost/api/tasks");
        assert_eq!(
            preparer.url_for(None).unwrap().as_str(),
            "http://localhost/api/tasks"
        );
        assert_eq!(
            preparer.url_for(Some("1")).unwrap().as_str(),
            "http://localhost/api/tasks/1"
        );
    }

    #[test]
    fn test_url_for_trailing_slash_and_encoding() {
        let preparer = preparer("http://localhost/tasks/");
        assert_eq!(
            preparer.url_for(Some("a b")).unwrap().as_str(),
            "http://localhost/tasks/a%20b"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = ReqwestConnectionPreparer::new("mailto:someone@example.com".parse().unwrap());
        assert!(matches!(result, Err(TransportError::Io(_))));
    }

    #[test]
    fn test_rejects_invalid_default_header() {
        let config = HttpConnectionConfig {
            default_headers: vec![("bad header".to_string(), "x".to_string())],
            ..Default::default()
        };
        let result = ReqwestConnectionPreparer::with_config(
            "http://localhost/tasks".parse().unwrap(),
            config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_header_fields_keep_non_ascii_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-name", HeaderValue::from_bytes(b"caf\xe9").unwrap());
        headers.append("x-name", HeaderValue::from_static("second"));
        headers.insert("key2", HeaderValue::from_static("VALUE"));

        let mut fields = header_fields(&headers);
        fields.sort();

        assert_eq!(
            fields,
            vec![
                ("key2".to_string(), vec!["VALUE".to_string()]),
                (
                    "x-name".to_string(),
                    vec!["caf\u{fffd}".to_string(), "second".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn test_prepare_requires_runtime() {
        let preparer = preparer("http://localhost/tasks");
        let err = preparer.prepare(None).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[should_panic(expected = "Cannot start a runtime from within a runtime")]
    async fn test_direct_call_on_async_task_panics() {
        let transport = RestTransport::new(preparer("http://127.0.0.1:1/tasks"));
        let _ = transport.get();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/1"))
            .and(header("content-type", "application/json"))
            .and(body_bytes(b"12345".to_vec()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("KEY1", "VALUE")
                    .set_body_string("12345"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = HttpConnectionConfig {
            default_headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            ..Default::default()
        };
        let url = format!("{}/tasks", server.uri()).parse().unwrap();
        let transport = RestTransport::new(ReqwestConnectionPreparer::with_config(url, config).unwrap());

        let response = tokio::task::spawn_blocking(move || transport.put("1", "12345"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.body(), b"12345");
        assert_eq!(response.header("KEY1"), Some("VALUE"));
        server.verify().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_live_headers_by_sent_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("KEY2", "VALUE")
                    .insert_header("X-Name", HeaderValue::from_bytes(b"caf\xe9").unwrap())
                    .set_body_string("12345"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/tasks", server.uri()).parse().unwrap();
        let transport = RestTransport::new(ReqwestConnectionPreparer::new(url).unwrap());

        let response = tokio::task::spawn_blocking(move || transport.get())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.header("KEY2"), Some("VALUE"));
        assert_eq!(response.header("X-Name"), Some("caf\u{fffd}"));
        assert!(response.header("Content-Length").is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_carries_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(404).set_body_string("12345"))
            .mount(&server)
            .await;

        let url = format!("{}/tasks", server.uri()).parse().unwrap();
        let transport = RestTransport::new(ReqwestConnectionPreparer::new(url).unwrap());

        let err = tokio::task::spawn_blocking(move || transport.get())
            .await
            .unwrap()
            .unwrap_err();

        let http = err.as_http().expect("expected an HTTP error");
        assert_eq!(http.status_code(), 404);
        assert_eq!(http.data(), b"12345");
    }
}
