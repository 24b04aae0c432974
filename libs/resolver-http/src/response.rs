use crate::error::HttpError;
use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

/// Boxed response body, possibly decompressed (gzip/br/deflate).
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// HTTP response wrapper
///
/// Body reads enforce the configured `max_body_size` limit on decompressed
/// bytes. None of the readers check the status code.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Read the response body as bytes
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if the body exceeds the limit, or
    /// `HttpError::Transport` if reading fails midway.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        read_body_limited(self.inner, self.max_body_size).await
    }

    /// Parse the response body as JSON
    ///
    /// # Errors
    /// Returns `HttpError::Json` if the body is not valid JSON for `T`, plus
    /// the errors of [`bytes()`](Self::bytes).
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body_bytes = self.bytes().await?;
        let value = serde_json::from_slice(&body_bytes)?;
        Ok(value)
    }
}

async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let (_parts, body) = response.into_parts();

    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response_with_body(body: &'static str, limit: usize) -> HttpResponse {
        let boxed: ResponseBody = Full::new(Bytes::from_static(body.as_bytes()))
            .map_err(|never| match never {})
            .boxed();
        HttpResponse {
            inner: Response::builder().status(200).body(boxed).unwrap(),
            max_body_size: limit,
        }
    }

    #[tokio::test]
    async fn test_body_within_limit() {
        let resp = response_with_body("hello", 5);
        assert_eq!(resp.bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let resp = response_with_body("hello!", 5);
        match resp.bytes().await {
            Err(HttpError::BodyTooLarge { limit, actual }) => {
                assert_eq!(limit, 5);
                assert_eq!(actual, 6);
            }
            other => panic!("expected BodyTooLarge, got {other:?}"),
        }
    }
}
