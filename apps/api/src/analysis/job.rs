//! Job analyzer: extracts skills, requirements and role signals from a raw job description.

use serde::{Deserialize, Serialize};

use crate::analysis::lenient::{string_list, text};
use crate::analysis::prompts::{render, JOB_ANALYSIS_PROMPT};
use crate::analysis::{request_profile, Analyzed};
use crate::errors::AppError;
use crate::llm_client::LlmHandle;

/// Structured extraction wants the most repeatable output the model can give.
pub const JOB_ANALYSIS_TEMPERATURE: f32 = 0.0;

/// Structured view of a job description. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(default, deserialize_with = "string_list")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "text")]
    pub experience_required: String,
    #[serde(default, deserialize_with = "text")]
    pub education: String,
    #[serde(default, deserialize_with = "string_list")]
    pub key_responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "text")]
    pub industry: String,
    #[serde(default, deserialize_with = "text")]
    pub job_level: String,
    #[serde(default, deserialize_with = "string_list")]
    pub technologies: Vec<String>,
}

/// Analyzes a job description with one LLM call at temperature 0.
pub async fn analyze_job(
    description: &str,
    llm: &LlmHandle<'_>,
) -> Result<Analyzed<JobProfile>, AppError> {
    let prompt = render(JOB_ANALYSIS_PROMPT, &[("job_description", description)]);
    request_profile(llm, "Job analysis", prompt, JOB_ANALYSIS_TEMPERATURE).await
}
