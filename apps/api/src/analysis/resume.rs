//! Resume analyzer: structures extracted resume text.

use serde::{Deserialize, Serialize};

use crate::analysis::lenient::{string_list, text};
use crate::analysis::prompts::{render, RESUME_ANALYSIS_PROMPT};
use crate::analysis::{request_profile, Analyzed};
use crate::errors::AppError;
use crate::llm_client::LlmHandle;

pub const RESUME_ANALYSIS_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    #[serde(default, deserialize_with = "string_list")]
    pub technical_skills: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "text")]
    pub experience: String,
    #[serde(default, deserialize_with = "text")]
    pub education: String,
    #[serde(default, deserialize_with = "string_list")]
    pub projects: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub achievements: Vec<String>,
}

/// Analyzes resume text with one LLM call at temperature 0.
/// Empty text is still sent: an unreadable upload degrades the analysis, it does not stop it.
pub async fn analyze_resume(
    resume_text: &str,
    llm: &LlmHandle<'_>,
) -> Result<Analyzed<ResumeProfile>, AppError> {
    let prompt = render(RESUME_ANALYSIS_PROMPT, &[("resume_text", resume_text)]);
    request_profile(llm, "Resume analysis", prompt, RESUME_ANALYSIS_TEMPERATURE).await
}
