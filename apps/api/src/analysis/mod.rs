// Analysis stages: job, resume, match and cover letter.
// Each stage renders one prompt, makes one call through `LlmHandle` and parses the reply.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod cover_letter;
pub mod job;
pub mod lenient;
pub mod matching;
pub mod prompts;
pub mod resume;
pub mod tone;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::llm_client::response::{parse_json_response, MalformedResponse};
use crate::llm_client::LlmHandle;

/// A structured stage result. `malformed` is set when the model's reply could not be
/// decoded, in which case `profile` is the empty default.
#[derive(Debug, Clone)]
pub struct Analyzed<T> {
    pub profile: T,
    pub malformed: Option<MalformedResponse>,
}

/// Sends one structured-output request and decodes the reply leniently into `T`.
pub(crate) async fn request_profile<T>(
    llm: &LlmHandle<'_>,
    stage: &str,
    prompt: String,
    temperature: f32,
) -> Result<Analyzed<T>, AppError>
where
    T: DeserializeOwned + Default,
{
    let raw = llm
        .complete(prompt, temperature)
        .await
        .map_err(|e| AppError::Llm(format!("{stage} failed: {e}")))?;

    let parsed = parse_json_response(raw.as_deref());
    Ok(Analyzed {
        profile: lenient::decode_profile(&parsed.value),
        malformed: parsed.malformed,
    })
}

/// Pretty JSON for embedding a profile in a prompt.
pub(crate) fn prompt_json<T: Serialize>(profile: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serializing profile for prompt: {e}")))
}
