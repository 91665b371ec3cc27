//! Market commentary from an external chat-completion service.
//!
//! Builds the stage prompt, sends one OpenAI-style chat completion request
//! through a [`CompletionTransport`] and folds every outcome into a
//! [`CommentaryResult`]:
//!
//! - `Success`: the completion text, untouched.
//! - `Degraded`: the stage's offline table plus the classified failure.
//!
//! Only local input problems (a blank prompt) are returned as `Err`, so a
//! caller can always tell "never sent" from "sent and failed".

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{Credential, RequesterConfig};
use crate::error::{ImmoError, Result};
use crate::models::{DerivedMetrics, InvestmentRequest};
use crate::prompts::{self, Stage, SYSTEM_INSTRUCTION};

/// Longest slice of an error body kept in a failure message.
const ERROR_BODY_PREVIEW: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token accounting. Absent or `null` counters read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub prompt_tokens: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub completion_tokens: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_tokens: u32,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    #[serde(default, deserialize_with = "lenient_usage")]
    usage: Option<Usage>,
}

// Usage is informational; an odd shape drops it instead of the completion.
fn lenient_usage<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Usage>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Raw HTTP reply from the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Seam to the external text-generation service.
///
/// Returns the raw reply for any HTTP status; `Err` only for transport-level
/// failures (connection refused, timeout, TLS), carrying a description.
pub trait CompletionTransport: Send + Sync {
    fn post(&self, request: &ChatRequest) -> std::result::Result<HttpReply, String>;
}

/// Blocking `reqwest` transport with bearer authentication and a request timeout.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            ImmoError::InvalidArgument("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl CompletionTransport for HttpTransport {
    fn post(&self, request: &ChatRequest) -> std::result::Result<HttpReply, String> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    format!("request timed out: {e}")
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                }
            })?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| format!("failed to read response body: {e}"))?;
        Ok(HttpReply { status, body })
    }
}

// ---------------------------------------------------------------------------
// Failures and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 401: the credential was rejected.
    Auth,
    /// HTTP 429: too many requests. Not retried.
    RateLimit,
    /// Network error, other non-2xx status, malformed or empty completion.
    Service,
    /// No API key configured; nothing was sent.
    MissingCredential,
}

/// Why a commentary call degraded. Kept for diagnostics, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ServiceFailure {
    pub fn auth(status: u16) -> Self {
        Self {
            kind: FailureKind::Auth,
            message: "API credential rejected".to_string(),
            status: Some(status),
        }
    }

    pub fn rate_limit(status: u16) -> Self {
        Self {
            kind: FailureKind::RateLimit,
            message: "rate limit reached".to_string(),
            status: Some(status),
        }
    }

    pub fn service(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind: FailureKind::Service,
            message: message.into(),
            status,
        }
    }

    pub fn missing_credential() -> Self {
        Self {
            kind: FailureKind::MissingCredential,
            message: "no API credential configured".to_string(),
            status: None,
        }
    }
}

/// Normalized outcome of one commentary call. Always renderable.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentaryResult {
    Success {
        stage: Stage,
        content: String,
        usage: Option<Usage>,
    },
    Degraded {
        stage: Stage,
        content: String,
        failure: ServiceFailure,
    },
}

impl CommentaryResult {
    fn degraded(stage: Stage, failure: ServiceFailure) -> Self {
        log::warn!(
            "Commentary stage {} degraded to offline content ({:?}): {}",
            stage,
            failure.kind,
            failure.message
        );
        CommentaryResult::Degraded {
            stage,
            content: prompts::fallback_content(stage).to_string(),
            failure,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CommentaryResult::Success { .. })
    }

    pub fn stage(&self) -> Stage {
        match self {
            CommentaryResult::Success { stage, .. } | CommentaryResult::Degraded { stage, .. } => {
                *stage
            }
        }
    }

    pub fn content(&self) -> &str {
        match self {
            CommentaryResult::Success { content, .. }
            | CommentaryResult::Degraded { content, .. } => content,
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            CommentaryResult::Success { .. } => None,
            CommentaryResult::Degraded { failure, .. } => Some(failure),
        }
    }

    pub fn usage(&self) -> Option<&Usage> {
        match self {
            CommentaryResult::Success { usage, .. } => usage.as_ref(),
            CommentaryResult::Degraded { .. } => None,
        }
    }
}

/// Wire shape: `{"ok": bool, "stage": ..., "content": ..., "usage"?: ..., "error"?: ...}`.
#[derive(Serialize)]
struct ResultView<'a> {
    ok: bool,
    stage: Stage,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<&'a Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ServiceFailure>,
}

impl Serialize for CommentaryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ResultView {
            ok: self.is_ok(),
            stage: self.stage(),
            content: self.content(),
            usage: self.usage(),
            error: self.failure(),
        }
        .serialize(serializer)
    }
}

/// Map a raw reply to completion text, or the failure it represents.
pub fn classify_reply(reply: &HttpReply) -> std::result::Result<(String, Option<Usage>), ServiceFailure> {
    match reply.status {
        200..=299 => {}
        401 => return Err(ServiceFailure::auth(reply.status)),
        429 => return Err(ServiceFailure::rate_limit(reply.status)),
        status => {
            let preview: String = reply.body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(ServiceFailure::service(
                format!("HTTP {status}: {preview}"),
                Some(status),
            ));
        }
    }

    let completion: ChatCompletion = serde_json::from_str(&reply.body).map_err(|e| {
        ServiceFailure::service(format!("malformed completion body: {e}"), Some(reply.status))
    })?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ServiceFailure::service("completion has no content", Some(reply.status)))?;

    Ok((content, completion.usage))
}

// ---------------------------------------------------------------------------
// CommentaryRequesterBuilder
// ---------------------------------------------------------------------------

/// Builder for [`CommentaryRequester`].
///
/// Starts from [`RequesterConfig::default()`], i.e. without a credential.
#[derive(Default)]
pub struct CommentaryRequesterBuilder {
    config: RequesterConfig,
    transport: Option<Box<dyn CompletionTransport>>,
}

impl CommentaryRequesterBuilder {
    /// Replace every setting at once (e.g. with [`RequesterConfig::from_env`]).
    pub fn config(mut self, config: RequesterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = credential;
        self
    }

    /// Shorthand for `credential(Credential::from_raw(Some(key)))`.
    pub fn api_key(mut self, key: &str) -> Self {
        self.config.credential = Credential::from_raw(Some(key));
        self
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.config.api_url = url.to_string();
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Time budget for one completion call. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Use a custom transport instead of the HTTP one (stubs, proxies).
    pub fn transport<T: CompletionTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Build the requester.
    ///
    /// Without a custom transport, an [`HttpTransport`] is created when a
    /// credential is configured. With no credential, no client is built and
    /// every call degrades with [`FailureKind::MissingCredential`].
    pub fn build(self) -> Result<CommentaryRequester> {
        let config = self.config;
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(ImmoError::InvalidArgument(format!(
                "temperature must be within 0.0..=2.0, got {}",
                config.temperature
            )));
        }
        if config.max_tokens == 0 {
            return Err(ImmoError::InvalidArgument("max_tokens must be positive".into()));
        }
        if config.timeout.is_zero() {
            return Err(ImmoError::InvalidArgument("timeout must be positive".into()));
        }

        let transport = match (self.transport, &config.credential) {
            (Some(custom), _) => Some(custom),
            (None, Credential::ApiKey(key)) => {
                let http = HttpTransport::new(&config.api_url, key, config.timeout)?;
                Some(Box::new(http) as Box<dyn CompletionTransport>)
            }
            (None, Credential::Missing) => None,
        };

        Ok(CommentaryRequester { config, transport })
    }
}

// ---------------------------------------------------------------------------
// CommentaryRequester
// ---------------------------------------------------------------------------

/// Sends stage prompts to the completion service and normalizes the outcome.
///
/// Holds no mutable state; one instance can serve any number of calls.
pub struct CommentaryRequester {
    config: RequesterConfig,
    transport: Option<Box<dyn CompletionTransport>>,
}

impl CommentaryRequester {
    pub fn builder() -> CommentaryRequesterBuilder {
        CommentaryRequesterBuilder::default()
    }

    /// Requester configured from `PERPLEXITY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::builder().config(RequesterConfig::from_env()).build()
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// Build the `stage` prompt from the request and metrics and complete it.
    pub fn request_commentary(
        &self,
        request: &InvestmentRequest,
        metrics: &DerivedMetrics,
        stage: Stage,
    ) -> Result<CommentaryResult> {
        let prompt = prompts::build_prompt(stage, request, metrics);
        self.complete(stage, &prompt)
    }

    /// Complete a caller-supplied prompt; `stage` selects the fallback table.
    ///
    /// Returns `Err(ImmoError::EmptyPrompt)` for a blank prompt without
    /// contacting the service. Every service-side failure comes back as
    /// `Ok(CommentaryResult::Degraded { .. })`.
    pub fn complete(&self, stage: Stage, prompt: &str) -> Result<CommentaryResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ImmoError::EmptyPrompt(stage.key().to_string()));
        }

        let transport = match (&self.config.credential, &self.transport) {
            (Credential::ApiKey(_), Some(transport)) => transport,
            _ => {
                return Ok(CommentaryResult::degraded(
                    stage,
                    ServiceFailure::missing_credential(),
                ))
            }
        };

        let payload = self.payload(prompt);
        log::debug!(
            "Sending {} prompt ({} chars) to model {}",
            stage,
            prompt.len(),
            payload.model
        );

        let reply = match transport.post(&payload) {
            Ok(reply) => reply,
            Err(reason) => {
                return Ok(CommentaryResult::degraded(
                    stage,
                    ServiceFailure::service(format!("network error: {reason}"), None),
                ))
            }
        };

        match classify_reply(&reply) {
            Ok((content, usage)) => {
                log::info!(
                    "Commentary stage {} completed ({} chars, {} tokens)",
                    stage,
                    content.len(),
                    usage.map(|u| u.total_tokens).unwrap_or(0)
                );
                Ok(CommentaryResult::Success {
                    stage,
                    content,
                    usage,
                })
            }
            Err(failure) => Ok(CommentaryResult::degraded(stage, failure)),
        }
    }

    /// The exact payload [`complete`](Self::complete) would send for `prompt`.
    pub fn payload(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(prompt),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}
