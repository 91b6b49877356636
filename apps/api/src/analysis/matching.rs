//! Match analyzer: compares a job profile against a resume profile and scores ATS fit.

use serde::{Deserialize, Serialize};

use crate::analysis::job::JobProfile;
use crate::analysis::lenient::{records, string_list, text};
use crate::analysis::prompts::{render, MATCH_ANALYSIS_PROMPT};
use crate::analysis::resume::ResumeProfile;
use crate::analysis::{prompt_json, request_profile, Analyzed};
use crate::errors::AppError;
use crate::llm_client::LlmHandle;

/// Slightly above zero: the recommendations are qualitative.
pub const MATCH_ANALYSIS_TEMPERATURE: f32 = 0.2;

/// One concrete edit to make the resume read better to an ATS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsSuggestion {
    #[serde(default, deserialize_with = "text")]
    pub section: String,
    #[serde(default, deserialize_with = "text")]
    pub suggested_change: String,
    #[serde(default, deserialize_with = "text")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Kept as the model's text, e.g. "85%".
    #[serde(default, deserialize_with = "text")]
    pub overall_match_percentage: String,
    #[serde(default, deserialize_with = "text")]
    pub ats_score: String,
    #[serde(default, deserialize_with = "string_list")]
    pub matching_skills: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub missing_skills: Vec<String>,
    #[serde(default, deserialize_with = "records")]
    pub ats_optimization_suggestions: Vec<AtsSuggestion>,
    #[serde(default, deserialize_with = "string_list")]
    pub recommendations: Vec<String>,
}

impl MatchReport {
    /// True when the model gave us nothing usable at all.
    pub fn is_empty(&self) -> bool {
        *self == MatchReport::default()
    }
}

/// Compares both profiles with one LLM call at temperature 0.2.
/// The profiles are only read; they are embedded as pretty JSON.
pub async fn analyze_match(
    job: &JobProfile,
    resume: &ResumeProfile,
    llm: &LlmHandle<'_>,
) -> Result<Analyzed<MatchReport>, AppError> {
    let job_json = prompt_json(job)?;
    let resume_json = prompt_json(resume)?;
    let prompt = render(
        MATCH_ANALYSIS_PROMPT,
        &[("job_json", job_json.as_str()), ("resume_json", resume_json.as_str())],
    );
    request_profile(llm, "Match analysis", prompt, MATCH_ANALYSIS_TEMPERATURE).await
}
