// All LLM prompt templates for the analysis stages.
// Templates are filled with `render`, never `format!`: the JSON examples are full of braces.

/// Job description analysis. Replace `{job_description}` before sending.
pub const JOB_ANALYSIS_PROMPT: &str = r#"
Analyze this job description and return ONLY valid JSON:
{
"required_skills": ["..."],
"soft_skills": ["..."],
"experience_required": "...",
"education": "...",
"key_responsibilities": ["..."],
"industry": "...",
"job_level": "...",
"technologies": ["..."]
}

Job Description:
{job_description}
"#;

/// Resume analysis. Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT: &str = r#"
Analyze this resume and return ONLY valid JSON:
{
"technical_skills": ["..."],
"soft_skills": ["..."],
"experience": "...",
"education": "...",
"projects": ["..."],
"certifications": ["..."],
"achievements": ["..."]
}

Resume:
{resume_text}
"#;

/// Match + ATS comparison. Replace `{job_json}` and `{resume_json}` with pretty JSON.
pub const MATCH_ANALYSIS_PROMPT: &str = r#"
Compare the following Job Description and Resume.
Return ONLY valid JSON with this format:
{
"overall_match_percentage": "85%",
"ats_score": "88%",
"matching_skills": ["..."],
"missing_skills": ["..."],
"ats_optimization_suggestions": [
    {
        "section": "Skills",
        "suggested_change": "Add more cloud technologies like AWS, GCP",
        "reason": "These are mentioned in the JD but missing from the resume"
    }
],
"recommendations": [
    "Quantify achievements using metrics.",
    "Add certifications like AWS Certified Developer for stronger alignment."
]
}

Job Description:
{job_json}

Resume:
{resume_json}
"#;

/// Cover letter generation. Replace `{tone}`, `{job_json}` and `{resume_json}`.
pub const COVER_LETTER_PROMPT: &str = r#"
Write a {tone} cover letter based on:
Job Details:
{job_json}

Candidate Resume:
{resume_json}

Make it concise, ATS-friendly, and highlight relevant skills.
Return ONLY plain text (no JSON).
"#;

/// Fills `{name}` markers in a single pass, so substituted text is never re-scanned.
/// Unknown markers and stray braces are copied through untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = vars.iter().find_map(|(name, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(*name))
                .and_then(|t| t.strip_prefix('}'))
                .map(|after| (*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
