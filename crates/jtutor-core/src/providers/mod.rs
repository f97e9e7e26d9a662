//! Generative model providers.
//!
//! `GenerativeModel` is the seam between the tutor and the remote model.
//! The Gemini client is the production implementation; tests script their own.

use std::future::Future;

pub mod gemini;
pub mod shared;
mod transcript;

pub use gemini::{GeminiClient, GeminiConfig};
pub use shared::{
    FragmentStream, GenerateRequest, ProviderError, ProviderErrorKind, ProviderResult, Role, Turn,
    resolve_api_key, resolve_base_url,
};
pub use transcript::Transcript;

/// A remote text generator.
///
/// Returned futures are `Send` so callers may drive them on spawned tasks.
pub trait GenerativeModel: Send + Sync + 'static {
    /// Produces the full response as one payload.
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = ProviderResult<String>> + Send;

    /// Opens an incremental response; the stream ends at natural completion.
    fn stream(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = ProviderResult<FragmentStream>> + Send;
}
