//! Gemini SSE stream parser.
//!
//! Turns `streamGenerateContent?alt=sse` frames into plain text fragments.

use std::collections::VecDeque;
use std::pin::Pin;

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde_json::Value;

use super::shared::{candidate_text, extract_error};
use crate::providers::{ProviderError, ProviderResult, Transcript};

/// Gemini SSE stream parser.
///
/// Each SSE frame carries one `GenerateContentResponse` chunk; its candidate
/// text is emitted as one fragment. An error frame ends the stream.
pub struct GeminiSseParser<S> {
    inner: EventStream<S>,
    pending: VecDeque<ProviderResult<String>>,
    finish_reason: Option<String>,
    transcript: Option<Transcript>,
    failed: bool,
}

impl<S> GeminiSseParser<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
            pending: VecDeque::new(),
            finish_reason: None,
            transcript: None,
            failed: false,
        }
    }

    /// Records every fragment, the finish reason and any error.
    #[must_use]
    pub fn with_transcript(mut self, transcript: Option<Transcript>) -> Self {
        self.transcript = transcript;
        self
    }

    fn record(&mut self, item: &ProviderResult<String>) {
        let Some(transcript) = &mut self.transcript else {
            return;
        };
        match item {
            Ok(text) => transcript.fragment(text),
            Err(error) => transcript.error(error),
        }
    }

    /// Natural end of the stream. Anything but `STOP` means the reply was cut
    /// short (token limit, safety block, recitation).
    fn finish(&mut self) {
        match self.finish_reason.as_deref() {
            None | Some("STOP") => {
                tracing::debug!(finish_reason = ?self.finish_reason, "gemini stream finished");
            }
            Some(reason) => {
                tracing::warn!(finish_reason = reason, "gemini stream ended early");
            }
        }
        if let Some(transcript) = &mut self.transcript {
            transcript.finish(self.finish_reason.as_deref());
        }
    }

    fn handle_event_data(&mut self, data: &str) -> ProviderResult<()> {
        let trimmed = data.trim();
        if trimmed.is_empty() || trimmed == "[DONE]" {
            return Ok(());
        }

        let value = serde_json::from_str::<Value>(trimmed)
            .map_err(|err| ProviderError::parse(format!("Failed to parse SSE JSON: {err}")))?;
        self.handle_chunk(&value);
        Ok(())
    }

    fn handle_chunk(&mut self, value: &Value) {
        if let Some(error) = extract_error(value) {
            self.pending.push_back(Err(error));
            return;
        }

        let payload = value.get("response").unwrap_or(value);
        if let Some(reason) = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("finishReason"))
            .and_then(Value::as_str)
        {
            self.finish_reason = Some(reason.to_string());
        }

        let text = candidate_text(value);
        if !text.is_empty() {
            self.pending.push_back(Ok(text));
        }
    }
}

impl<S, E> Stream for GeminiSseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ProviderResult<String>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if self.failed {
                return Poll::Ready(None);
            }

            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    self.failed = true;
                    self.pending.clear();
                }
                self.record(&item);
                return Poll::Ready(Some(item));
            }

            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Err(err) = self.handle_event_data(&event.data) {
                        self.pending.push_back(Err(err));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.pending
                        .push_back(Err(ProviderError::parse(format!("SSE stream error: {e}"))));
                }
                Poll::Ready(None) => {
                    self.failed = true;
                    self.finish();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
