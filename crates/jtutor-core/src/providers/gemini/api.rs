//! Gemini API key provider (Generative Language API).

use anyhow::Result;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};

use super::shared::{build_gemini_request, classify_reqwest_error, parse_generate_response};
use super::sse::GeminiSseParser;
use crate::providers::shared::{USER_AGENT, resolve_api_key, resolve_base_url};
use crate::providers::{
    FragmentStream, GenerateRequest, GenerativeModel, ProviderError, ProviderResult, Transcript,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
}

impl GeminiConfig {
    /// Creates a new config from config-file values and the environment.
    ///
    /// Authentication resolution order:
    /// 1. `config_api_key` parameter (from config file)
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// Base URL: `GEMINI_BASE_URL`, then config, then the public endpoint.
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_env(
        model: String,
        max_output_tokens: Option<u32>,
        config_base_url: Option<&str>,
        config_api_key: Option<&str>,
    ) -> Result<Self> {
        let api_key = resolve_api_key(config_api_key, "GEMINI_API_KEY", "gemini")?;
        let base_url = resolve_base_url(
            config_base_url,
            "GEMINI_BASE_URL",
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model,
            max_output_tokens,
        })
    }
}

/// Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &serde_json::Value,
    ) -> ProviderResult<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body));
        }
        Ok(response)
    }

    /// Sends a one-shot `generateContent` request and returns the text.
    ///
    /// # Errors
    /// Returns a `ProviderError` on transport, HTTP status, or parse failures.
    pub async fn generate_content(&self, request: &GenerateRequest) -> ProviderResult<String> {
        let body = build_gemini_request(request, self.config.max_output_tokens);
        let mut transcript = Transcript::from_env("generate");
        if let Some(transcript) = &mut transcript {
            transcript.request(&self.config.model, &body);
        }
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        tracing::debug!(model = %self.config.model, turns = request.turns.len(), "generateContent");
        let result = self.fetch_text(&url, &body).await;
        if let Some(transcript) = &mut transcript {
            transcript.outcome(&result);
        }
        result
    }

    async fn fetch_text(&self, url: &str, body: &serde_json::Value) -> ProviderResult<String> {
        let response = self
            .post(url, build_json_headers(&self.config.api_key), body)
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        parse_generate_response(&text)
    }

    /// Opens a `streamGenerateContent` SSE request.
    ///
    /// # Errors
    /// Returns a `ProviderError` if the request cannot be started. Errors after
    /// the first byte arrive through the stream.
    pub async fn stream_content(&self, request: &GenerateRequest) -> ProviderResult<FragmentStream> {
        let body = build_gemini_request(request, self.config.max_output_tokens);
        let mut transcript = Transcript::from_env("stream");
        if let Some(transcript) = &mut transcript {
            transcript.request(&self.config.model, &body);
        }
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        );

        tracing::debug!(model = %self.config.model, turns = request.turns.len(), "streamGenerateContent");
        let response = self
            .post(&url, build_headers(&self.config.api_key), &body)
            .await
            .inspect_err(|error| {
                if let Some(transcript) = &mut transcript {
                    transcript.error(error);
                }
            })?;

        let parser = GeminiSseParser::new(response.bytes_stream()).with_transcript(transcript);
        Ok(parser.boxed())
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> ProviderResult<String> {
        self.generate_content(&request).await
    }

    async fn stream(&self, request: GenerateRequest) -> ProviderResult<FragmentStream> {
        self.stream_content(&request).await
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("text/event-stream"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}

fn build_json_headers(api_key: &str) -> HeaderMap {
    let mut headers = build_headers(api_key);
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers
}
