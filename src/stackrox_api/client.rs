use crate::config::{ConnectionConfig, Credentials};
use crate::stackrox_api::types::{ApiError, StackroxError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Authenticated HTTP client for one StackRox API resource
///
/// Every request targets `<central>/v1/<api_base>[/<suffix>][?<query>]`,
/// carries JSON `Accept`/`Content-Type` headers and either a bearer token
/// or preemptive basic auth. One request is in flight per call; there are
/// no retries and no timeout beyond reqwest's defaults.
#[derive(Debug, Clone)]
pub struct StackroxClient {
    /// `<central>/v1/<api_base>`
    api_url: String,
    credentials: Credentials,
    /// HTTP client for making requests
    client: reqwest::Client,
}

/// A single call against a [`StackroxClient`]
///
/// Defaults to `GET` on the resource root, expecting `200 OK`.
#[derive(Debug)]
pub struct ApiRequest<'a, B: Serialize + ?Sized = ()> {
    method: Method,
    suffix: Option<&'a str>,
    query: Vec<(&'a str, String)>,
    body: Option<&'a B>,
    expect_status: StatusCode,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            suffix: None,
            query: Vec::new(),
            body: None,
            expect_status: StatusCode::OK,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }
}

impl<'a, B: Serialize + ?Sized> ApiRequest<'a, B> {
    /// Path appended to the resource root, without a leading slash
    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }

    pub fn query(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect_status = status;
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(self, body: &'a T) -> ApiRequest<'a, T> {
        ApiRequest {
            method: self.method,
            suffix: self.suffix,
            query: self.query,
            body: Some(body),
            expect_status: self.expect_status,
        }
    }
}

impl StackroxClient {
    /// Create a client for the resource at `<central>/v1/<api_base>`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stackrox_sdk::config::{ConnectionConfig, Credentials};
    /// use stackrox_sdk::StackroxClient;
    ///
    /// let config = ConnectionConfig::new(
    ///     "https://central.example.com",
    ///     Credentials::Bearer("eyJhbGci...".to_string()),
    /// );
    /// let client = StackroxClient::new(&config, "apitokens").unwrap();
    /// assert_eq!(client.api_url(), "https://central.example.com/v1/apitokens");
    /// ```
    pub fn new(config: &ConnectionConfig, api_base: &str) -> Result<Self, StackroxError> {
        let api_url = format!("{}/v1/{}", config.central, api_base.trim_matches('/'));
        tracing::debug!(
            "Creating StackroxClient for {} (validate_certs={})",
            api_url,
            config.validate_certs
        );

        if !config.validate_certs {
            tracing::warn!("TLS certificate validation is disabled for {}", config.central);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.validate_certs)
            .build()
            .map_err(|e| StackroxError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            credentials: config.credentials.clone(),
            client,
        })
    }

    /// Get the resource root URL for this client
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url_for(&self, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) if !suffix.is_empty() => format!("{}/{}", self.api_url, suffix),
            _ => self.api_url.clone(),
        }
    }

    fn authenticate(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    /// Execute one request and decode the JSON response
    ///
    /// A `401` is always reported as [`ApiError::Unauthorized`]; any other
    /// status that differs from the expected one is
    /// [`ApiError::StatusMismatch`]. A body that does not decode as `T` is
    /// [`ApiError::MalformedResponse`]. An empty body decodes as JSON `null`.
    pub async fn request<T, B>(&self, request: ApiRequest<'_, B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url_for(request.suffix);
        let method = request.method.clone();

        let mut builder = self.client.request(method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }
        builder = self.authenticate(builder);

        tracing::debug!("Sending {} request to: {}", method, url);

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} request to {}: {}", method, url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        tracing::debug!("Received response with status: {}", status);

        if status == StatusCode::UNAUTHORIZED {
            tracing::error!("Unauthorized: {} {}", method, final_url);
            return Err(ApiError::Unauthorized {
                method: method.to_string(),
                url: final_url,
            });
        }

        if status != request.expect_status {
            tracing::error!(
                "Unexpected status from {} {}: expected {}, received {}",
                method,
                final_url,
                request.expect_status.as_u16(),
                status.as_u16()
            );
            return Err(ApiError::StatusMismatch {
                expected: request.expect_status.as_u16(),
                actual: status.as_u16(),
                url: final_url,
            });
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            ApiError::Network(format!("Failed to read response: {}", e))
        })?;

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| {
            // Bodies may hold one-time secrets, so only their size is logged.
            tracing::error!(
                "Failed to parse response from {} ({} bytes): {}",
                final_url,
                body.len(),
                e
            );
            ApiError::MalformedResponse(format!("Failed to parse response JSON: {}", e))
        })
    }
}
