//! Authenticated HTTP client for the CI gateway.
//!
//! Every request is stamped with the identity headers of the loaded
//! [`RuntimeEnvironment`]. Transport failures and non-2xx responses collapse
//! into [`SdkError::Request`] carrying only the caller's message; the cause is
//! logged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::core::RuntimeEnvironment;
use crate::error::{SdkError, SdkResult};

use super::variables::BuildScope;

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity header names.
pub mod headers {
    pub const BUILD_ID: &str = "X-SODA-BID";
    pub const PROJECT_ID: &str = "X-SODA-PID";
    pub const DEVOPS_BUILD_TYPE: &str = "X-DEVOPS-BUILD-TYPE";
    pub const DEVOPS_PROJECT_ID: &str = "X-DEVOPS-PROJECT-ID";
    pub const DEVOPS_BUILD_ID: &str = "X-DEVOPS-BUILD-ID";
    pub const DEVOPS_PIPELINE_ID: &str = "X-DEVOPS-PIPELINE-ID";
    pub const DEVOPS_VM_SEQ_ID: &str = "X-DEVOPS-VM-SID";
    pub const DEVOPS_AGENT_ID: &str = "X-DEVOPS-AGENT-ID";
    pub const DEVOPS_AGENT_SECRET_KEY: &str = "X-DEVOPS-AGENT-SECRET-KEY";
    pub const DEVOPS_CI_TASK_ID: &str = "X-DEVOPS-CI-TASK-ID";
    pub const CONTENT_TYPE: &str = "Content-Type";
}

/// Header map sent with a request. Later inserts replace earlier ones.
pub type Headers = BTreeMap<String, String>;

/// HTTP verbs the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join the gateway host and a request path into a URL.
///
/// Trailing slashes on the gateway and leading slashes on the path are
/// dropped, so any combination of them yields the same URL. `http://` is
/// assumed when the gateway carries no scheme.
pub fn build_url(gateway: &str, path: &str) -> String {
    let gateway = gateway.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');

    if gateway.contains("://") {
        format!("{gateway}/{path}")
    } else {
        format!("http://{gateway}/{path}")
    }
}

/// A request before it is bound to the gateway and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl BuildRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: Headers::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add an endpoint-specific header on top of the identity set.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Mark the request as carrying JSON.
    pub fn json_content(self) -> Self {
        self.header(headers::CONTENT_TYPE, "application/json")
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: serde::Serialize>(self, value: &T) -> SdkResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self.json_content().body(body))
    }
}

/// A fully addressed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Raw response from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer (connect, timeout, body read).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Executes requests. Swapped for a fake in tests.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking reqwest transport with a fixed timeout.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("atom-sdk/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Client bound to one runtime identity.
#[derive(Clone)]
pub struct ApiClient {
    env: RuntimeEnvironment,
    scope: BuildScope,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").field("env", &self.env).field("scope", &self.scope).finish()
    }
}

impl ApiClient {
    pub fn new(env: RuntimeEnvironment, transport: Arc<dyn Transport>) -> Self {
        Self { env, scope: BuildScope::default(), transport }
    }

    /// Bind the pipeline/project/build the build-variable calls address.
    pub fn with_scope(mut self, scope: BuildScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn env(&self) -> &RuntimeEnvironment {
        &self.env
    }

    pub fn scope(&self) -> &BuildScope {
        &self.scope
    }

    /// The identity headers every request carries.
    pub fn base_headers(&self) -> Headers {
        let env = &self.env;
        [
            (headers::DEVOPS_BUILD_TYPE, &env.build_type),
            (headers::PROJECT_ID, &env.project_id),
            (headers::DEVOPS_PROJECT_ID, &env.project_id),
            (headers::DEVOPS_BUILD_ID, &env.build_id),
            (headers::DEVOPS_AGENT_SECRET_KEY, &env.secret_key),
            (headers::DEVOPS_AGENT_ID, &env.agent_id),
            (headers::DEVOPS_VM_SEQ_ID, &env.vm_seq_id),
            (headers::BUILD_ID, &env.build_id),
            (headers::DEVOPS_CI_TASK_ID, &env.task_id),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
    }

    /// Address the request and stamp the identity headers.
    pub fn prepare(&self, build: BuildRequest) -> SdkResult<HttpRequest> {
        if build.path.trim().is_empty() {
            return Err(SdkError::MissingPath);
        }
        if !self.env.has_gateway() {
            return Err(SdkError::MissingGateway);
        }

        let mut headers = self.base_headers();
        headers.extend(build.headers);

        Ok(HttpRequest {
            method: build.method,
            url: build_url(&self.env.gateway, &build.path),
            headers,
            body: build.body,
        })
    }

    /// Execute a prepared request and return the body of a 2xx response.
    pub fn execute(&self, request: &HttpRequest, err_message: &str) -> SdkResult<Vec<u8>> {
        tracing::debug!("{} {}", request.method, request.url);

        let response = self.transport.execute(request).map_err(|e| {
            tracing::error!("do http request failed: {}", e);
            SdkError::request(err_message)
        })?;

        if !response.is_success() {
            tracing::error!("http request failed, status: {}", response.status);
            return Err(SdkError::request(err_message));
        }

        Ok(response.body)
    }

    /// Prepare and execute in one step.
    pub fn call(&self, build: BuildRequest, err_message: &str) -> SdkResult<Vec<u8>> {
        let request = self.prepare(build).map_err(|e| {
            tracing::error!("fail to generate request: {}", e);
            e
        })?;
        self.execute(&request, err_message)
    }
}
