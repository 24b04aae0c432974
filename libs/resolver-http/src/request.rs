use crate::client::{BufferedService, map_buffer_error};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Request, Response};
use http_body_util::Full;
use tower::{Service, ServiceExt};

/// GET request builder with fluent API
///
/// Created by [`HttpClient::get`](crate::HttpClient::get). Header errors are
/// deferred and surface from [`send()`](RequestBuilder::send).
///
/// # Example
///
/// ```ignore
/// let resp = client
///     .get("https://sso.example.org/admin/realms/main/groups")
///     .bearer_auth(token)
///     .header("accept", "application/json")
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
    transport_security: TransportSecurity,
    user_agent: HeaderValue,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        url: String,
        transport_security: TransportSecurity,
        user_agent: HeaderValue,
    ) -> Self {
        Self {
            service,
            max_body_size,
            url,
            headers: Vec::new(),
            error: None,
            transport_security,
            user_agent,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.push((name, value));
            }
            (Err(e), _) => {
                self.error = Some(HttpError::InvalidHeaderName(e));
            }
            (_, Err(e)) => {
                self.error = Some(HttpError::InvalidHeaderValue(e));
            }
        }
        self
    }

    /// Add an `Authorization: Bearer <token>` header
    ///
    /// The header value is marked sensitive so it is not printed by `Debug`.
    pub fn bearer_auth(mut self, token: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match HeaderValue::try_from(format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.push((http::header::AUTHORIZATION, value));
            }
            Err(e) => {
                self.error = Some(HttpError::InvalidHeaderValue(e));
            }
        }
        self
    }

    /// Parse the URL and check its scheme against the transport security mode.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request and return the response
    ///
    /// Any status code is returned as a response; callers decide what a
    /// successful status is.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - a header given to the builder was invalid
    /// - the URL is malformed or its scheme is not allowed
    /// - the connection, TLS handshake or transfer failed
    /// - the request timed out
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;

        let mut builder = Request::builder().method(http::Method::GET).uri(uri);

        let has_user_agent = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::USER_AGENT);
        if !has_user_agent {
            builder = builder.header(http::header::USER_AGENT, self.user_agent);
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let request = builder.body(Full::new(Bytes::new()))?;

        let service = self.service.ready().await.map_err(map_buffer_error)?;
        let inner: Response<ResponseBody> = service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}
