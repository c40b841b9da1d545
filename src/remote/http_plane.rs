//! JSON-over-HTTP control plane adapter.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::plan::Chunk;
use crate::setting::{ParameterSet, Setting};

use super::{ControlPlane, HttpClient, HttpRequest, HttpResponse, RemoteError};

/// Path segment under the endpoint that holds parameter sets.
const COLLECTION: &str = "parameter-sets";

/// [`ControlPlane`] speaking JSON to `{endpoint}/parameter-sets`.
///
/// | Operation | Request |
/// |-----------|---------|
/// | describe  | `GET {endpoint}/parameter-sets/{id}` |
/// | create    | `POST {endpoint}/parameter-sets` |
/// | apply     | `PUT {endpoint}/parameter-sets/{id}/settings` |
/// | reset     | `POST {endpoint}/parameter-sets/{id}/settings/reset` |
/// | delete    | `DELETE {endpoint}/parameter-sets/{id}` |
///
/// Status codes are normalized: 404 is [`RemoteError::NotFound`];
/// 408, 409, 423, 429 and 5xx are [`RemoteError::Transient`]; any other
/// non-2xx status is [`RemoteError::Validation`] carrying the server's
/// message.
///
/// # Example
///
/// ```
/// use paramsync::remote::{HttpControlPlane, ReqwestClient};
/// use url::Url;
///
/// let plane = HttpControlPlane::new(
///     ReqwestClient::new(),
///     Url::parse("https://control.example.com/v1").unwrap(),
/// );
/// assert_eq!(plane.endpoint().as_str(), "https://control.example.com/v1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpControlPlane<H> {
    client: H,
    endpoint: url::Url,
    headers: http::HeaderMap,
}

impl<H> HttpControlPlane<H> {
    /// Creates an adapter with no extra headers.
    #[must_use]
    pub fn new(client: H, endpoint: url::Url) -> Self {
        Self {
            client,
            endpoint,
            headers: http::HeaderMap::new(),
        }
    }

    /// Sets headers sent with every request (authorization, tenancy).
    #[must_use]
    pub fn with_headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the base endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Returns the extra headers.
    #[must_use]
    pub const fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Builds `{endpoint}/parameter-sets/{segments...}` with each segment
    /// percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<url::Url, RemoteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RemoteError::validation(format!(
                    "Endpoint '{}' cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .push(COLLECTION)
            .extend(segments);
        Ok(url)
    }
}

#[derive(Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    name: Option<String>,
    family: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    settings: Vec<Setting>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    family: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct SettingsRequest<'a> {
    settings: &'a [Setting],
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

fn encode_error(error: &serde_json::Error) -> RemoteError {
    RemoteError::validation(format!("Cannot encode request body: {error}"))
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT
                | StatusCode::CONFLICT
                | StatusCode::LOCKED
                | StatusCode::TOO_MANY_REQUESTS
        )
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = response.json::<ErrorBody>() {
        return body.message;
    }
    match response.body_text().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => response.status.to_string(),
    }
}

/// Maps a response onto the normalized error taxonomy.
fn classify(response: HttpResponse, resource: &str) -> Result<HttpResponse, RemoteError> {
    let status = response.status;
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::not_found(resource));
    }

    let message = error_message(&response);
    if is_transient_status(status) {
        Err(RemoteError::transient(format!("HTTP {status}: {message}")))
    } else {
        Err(RemoteError::validation(message))
    }
}

impl<H: HttpClient> HttpControlPlane<H> {
    async fn send(&self, request: HttpRequest, resource: &str) -> Result<HttpResponse, RemoteError> {
        let request = request
            .with_header(
                http::header::ACCEPT,
                http::HeaderValue::from_static("application/json"),
            )
            .with_headers(&self.headers);

        tracing::debug!("{} {}", request.method, request.url);
        let response = self.client.request(request).await?;
        classify(response, resource)
    }

    async fn send_settings(
        &self,
        resource: &str,
        request: HttpRequest,
        chunk: &Chunk,
    ) -> Result<(), RemoteError> {
        let body = SettingsRequest {
            settings: chunk.settings(),
        };
        let request = request.with_json(&body).map_err(|e| encode_error(&e))?;
        self.send(request, resource).await?;
        Ok(())
    }
}

impl<H: HttpClient> ControlPlane for HttpControlPlane<H> {
    async fn describe_settings(&self, resource: &str) -> Result<ParameterSet, RemoteError> {
        let url = self.url(&[resource])?;
        let response = self.send(HttpRequest::get(url), resource).await?;
        let body: DescribeResponse = response.json().map_err(|e| {
            RemoteError::validation(format!("Malformed description of '{resource}': {e}"))
        })?;

        let mut set = ParameterSet::new(body.name.unwrap_or_else(|| resource.to_string()), body.family)
            .with_settings(body.settings);
        if let Some(description) = body.description {
            set = set.with_description(description);
        }
        Ok(set)
    }

    async fn create_parameter_set(
        &self,
        resource: &str,
        family: &str,
        description: &str,
    ) -> Result<(), RemoteError> {
        let url = self.url(&[])?;
        let body = CreateRequest {
            name: resource,
            family,
            description,
        };
        let request = HttpRequest::post(url)
            .with_json(&body)
            .map_err(|e| encode_error(&e))?;
        self.send(request, resource).await?;
        Ok(())
    }

    async fn apply_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        let url = self.url(&[resource, "settings"])?;
        self.send_settings(resource, HttpRequest::put(url), chunk)
            .await
    }

    async fn reset_settings(&self, resource: &str, chunk: &Chunk) -> Result<(), RemoteError> {
        let url = self.url(&[resource, "settings", "reset"])?;
        self.send_settings(resource, HttpRequest::post(url), chunk)
            .await
    }

    async fn delete_parameter_set(&self, resource: &str) -> Result<(), RemoteError> {
        let url = self.url(&[resource])?;
        self.send(HttpRequest::delete(url), resource).await?;
        Ok(())
    }
}
