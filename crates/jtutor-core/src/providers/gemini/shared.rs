//! Gemini wire-format helpers: request bodies, response text, error mapping.

use serde_json::{Map, Value, json};

use crate::providers::{GenerateRequest, ProviderError, ProviderErrorKind, ProviderResult, Role};

/// Classifies a reqwest error into a `ProviderError`.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

/// Builds a `generateContent` / `streamGenerateContent` request body.
pub fn build_gemini_request(request: &GenerateRequest, max_output_tokens: Option<u32>) -> Value {
    let contents: Vec<Value> = request
        .turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
            };
            json!({
                "role": role,
                "parts": [{ "text": turn.text }],
            })
        })
        .collect();

    let mut body = json!({ "contents": contents });

    if let Some(system) = request.system.as_deref()
        && !system.trim().is_empty()
    {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }

    let mut generation_config = Map::new();
    if let Some(max) = max_output_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max));
    }
    if let Some(schema) = &request.response_schema {
        generation_config.insert("responseMimeType".to_string(), json!("application/json"));
        generation_config.insert("responseSchema".to_string(), schema.clone());
    }
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }

    body
}

/// Error frame embedded in a response payload, if any.
pub fn extract_error(value: &Value) -> Option<ProviderError> {
    let payload = value.get("response").unwrap_or(value);
    let error = value.get("error").or_else(|| payload.get("error"))?;

    let error_type = error
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.get("code").map(Value::to_string))
        .unwrap_or_else(|| "error".to_string());
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    Some(ProviderError::api_error(&error_type, message))
}

/// Concatenates the text parts of the first candidate.
///
/// Thought parts are skipped; they are never shown to the learner.
pub fn candidate_text(value: &Value) -> String {
    let payload = value.get("response").unwrap_or(value);
    let Some(parts) = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    parts
        .iter()
        .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

/// Parses a one-shot `generateContent` body into its text.
pub fn parse_generate_response(body: &str) -> ProviderResult<String> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        let mut error = ProviderError::parse(format!("Failed to parse Gemini response JSON: {err}"));
        error.details = Some(body.to_string());
        error
    })?;

    if let Some(error) = extract_error(&value) {
        return Err(error);
    }

    Ok(candidate_text(&value))
}
