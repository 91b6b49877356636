//! Cover letter generator: free-text output, no JSON parsing.

use crate::analysis::job::JobProfile;
use crate::analysis::prompts::{render, COVER_LETTER_PROMPT};
use crate::analysis::resume::ResumeProfile;
use crate::analysis::prompt_json;
use crate::analysis::tone::Tone;
use crate::errors::AppError;
use crate::llm_client::LlmHandle;

/// Prose benefits from more variety than extraction.
pub const COVER_LETTER_TEMPERATURE: f32 = 0.7;

/// Generates a cover letter in the requested tone. Safe to call any number of times.
///
/// Returns the trimmed reply; an empty reply is `AppError::EmptyGeneration`.
pub async fn generate_cover_letter(
    job: &JobProfile,
    resume: &ResumeProfile,
    tone: Tone,
    llm: &LlmHandle<'_>,
) -> Result<String, AppError> {
    let job_json = prompt_json(job)?;
    let resume_json = prompt_json(resume)?;
    let prompt = render(
        COVER_LETTER_PROMPT,
        &[
            ("tone", tone.as_str()),
            ("job_json", job_json.as_str()),
            ("resume_json", resume_json.as_str()),
        ],
    );

    let reply = llm
        .complete(prompt, COVER_LETTER_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Cover letter generation failed: {e}")))?;

    match reply.as_deref().map(str::trim) {
        Some(letter) if !letter.is_empty() => Ok(letter.to_string()),
        _ => Err(AppError::EmptyGeneration),
    }
}
