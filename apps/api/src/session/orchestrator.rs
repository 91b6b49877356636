//! Session orchestrator: runs extraction and the analysis stages in order, and
//! generates cover letters from the profiles the last run produced.
//!
//! Failure policy: an error ends the current action and drops the session back to
//! `Idle` (or, for cover letters, to the phase it was in). Profiles computed before the
//! failing stage stay on the session, so a match-stage failure still leaves the job and
//! resume profiles available.

use bytes::Bytes;
use chrono::Utc;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::analysis::cover_letter;
use crate::analysis::job::analyze_job;
use crate::analysis::matching::analyze_match;
use crate::analysis::resume::analyze_resume;
use crate::analysis::tone::Tone;
use crate::errors::AppError;
use crate::extraction::{extract_text, ExtractionError};
use crate::llm_client::{ChatModel, LlmHandle};
use crate::session::view::AnalysisView;
use crate::session::{CoverLetter, Session, SessionPhase, Stage};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// The "Analyze Match" form as submitted.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub job_description: String,
    pub resume: Option<UploadedFile>,
}

/// Runs a full analysis: extract → job → resume → match → display.
///
/// Missing input is rejected before anything on the session changes and before any
/// LLM call. Otherwise the previous run's results are discarded up front.
pub async fn run_analysis(
    session: &mut Session,
    llm: &dyn ChatModel,
    input: AnalysisInput,
) -> Result<AnalysisView, AppError> {
    let job_description = input.job_description.trim().to_string();
    let resume = match input.resume {
        Some(file) if !job_description.is_empty() => file,
        _ => return Err(AppError::MissingInput),
    };

    session.begin_run();
    session.transition(SessionPhase::Ready);

    match run_stages(session, llm, &job_description, resume).await {
        Ok(view) => Ok(view),
        Err(e) => {
            warn!(session_id = %session.id, phase = ?session.phase, "Analysis aborted: {e}");
            session.transition(SessionPhase::Idle);
            Err(e)
        }
    }
}

async fn run_stages(
    session: &mut Session,
    llm: &dyn ChatModel,
    job_description: &str,
    resume: UploadedFile,
) -> Result<AnalysisView, AppError> {
    let credential = session.credential().clone();
    let llm = LlmHandle::new(llm, &credential);

    session.transition(SessionPhase::Extracting);
    let resume_text = match extract_upload(resume).await {
        Ok(text) => text,
        Err(e @ ExtractionError::UnsupportedFormat { .. }) => {
            session.record_unsupported_format(e.to_string());
            String::new()
        }
        Err(e) => return Err(e.into()),
    };
    info!(session_id = %session.id, chars = resume_text.len(), "Resume text extracted");

    session.transition(SessionPhase::AnalyzingJob);
    let job = analyze_job(job_description, &llm).await?;
    session.record_malformed(Stage::JobAnalysis, job.malformed);
    session.job = Some(job.profile.clone());

    session.transition(SessionPhase::AnalyzingResume);
    let resume = analyze_resume(&resume_text, &llm).await?;
    session.record_malformed(Stage::ResumeAnalysis, resume.malformed);
    session.resume = Some(resume.profile.clone());

    session.transition(SessionPhase::AnalyzingMatch);
    let report = analyze_match(&job.profile, &resume.profile, &llm).await?;
    session.record_malformed(Stage::MatchAnalysis, report.malformed);
    if report.profile.is_empty() {
        return Err(AppError::NoAnalysisData);
    }

    let view = AnalysisView::new(SessionPhase::Displayed, &report.profile, &session.notices);
    session.report = Some(report.profile);
    session.analyzed_at = Some(Utc::now());
    session.transition(SessionPhase::Displayed);
    Ok(view)
}

/// PDF/DOCX parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_upload(file: UploadedFile) -> Result<String, ExtractionError> {
    let file_name = file.file_name.clone();
    tokio::task::spawn_blocking(move || extract_text(&file.file_name, &file.bytes))
        .await
        .unwrap_or_else(|e| Err(interrupted(file_name, e)))
}

fn interrupted(file_name: String, err: JoinError) -> ExtractionError {
    ExtractionError::Interrupted {
        file_name,
        reason: err.to_string(),
    }
}

/// Writes a cover letter from the held profiles. Re-entrant: each call is one more
/// LLM request and a failure leaves the session as it was.
pub async fn generate_cover_letter(
    session: &mut Session,
    llm: &dyn ChatModel,
    tone: Tone,
) -> Result<CoverLetter, AppError> {
    let (Some(job), Some(resume)) = (session.job.clone(), session.resume.clone()) else {
        return Err(AppError::Conflict(
            "Run an analysis before generating a cover letter.".to_string(),
        ));
    };

    let credential = session.credential().clone();
    let llm = LlmHandle::new(llm, &credential);
    let previous = session.phase;
    session.transition(SessionPhase::GeneratingCoverLetter);

    match cover_letter::generate_cover_letter(&job, &resume, tone, &llm).await {
        Ok(text) => {
            let letter = CoverLetter {
                tone,
                text,
                generated_at: Utc::now(),
            };
            session.cover_letter = Some(letter.clone());
            session.transition(SessionPhase::CoverLetterReady);
            Ok(letter)
        }
        Err(e) => {
            warn!(session_id = %session.id, %tone, "Cover letter generation failed: {e}");
            session.transition(previous);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::fixtures::docx_from_paragraphs;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::ApiKey;
    use crate::analysis::job::JobProfile;
    use crate::session::NoticeKind;

    const PYTHON_JD: &str =
        "Looking for a Python backend engineer with 3+ years experience, AWS knowledge required";

    const JOB_REPLY: &str = r#"{
        "required_skills": ["Python"],
        "soft_skills": ["Communication"],
        "experience_required": "3+ years",
        "education": "",
        "key_responsibilities": ["Build backend services"],
        "industry": "Software",
        "job_level": "Mid",
        "technologies": ["AWS"]
    }"#;

    const RESUME_REPLY: &str = "```json\n{\"technical_skills\": [\"Python\", \"GCP\"], \
        \"experience\": \"Senior Python Developer, 5 years\"}\n```";

    const MATCH_REPLY: &str = r#"{
        "overall_match_percentage": "72%",
        "ats_score": "80%",
        "matching_skills": ["Python"],
        "missing_skills": ["AWS"],
        "ats_optimization_suggestions": [
            {"section": "Skills", "suggested_change": "Mention AWS exposure", "reason": "Required by the JD"}
        ],
        "recommendations": ["Add an AWS certification."]
    }"#;

    fn session() -> Session {
        Session::new(ApiKey::new("sk-test").unwrap())
    }

    fn docx_input() -> AnalysisInput {
        AnalysisInput {
            job_description: PYTHON_JD.to_string(),
            resume: Some(UploadedFile {
                file_name: "resume.docx".to_string(),
                bytes: Bytes::from(docx_from_paragraphs(&["Senior Python Developer, 5 years, GCP"])),
            }),
        }
    }

    fn happy_model() -> ScriptedModel {
        ScriptedModel::new()
            .reply(JOB_REPLY)
            .reply(RESUME_REPLY)
            .reply(MATCH_REPLY)
    }

    #[tokio::test]
    async fn test_interrupted_extraction_names_the_upload_not_a_format() {
        let join_err = tokio::task::spawn_blocking(|| panic!("parser blew up"))
            .await
            .unwrap_err();

        let err = interrupted("resume.docx".to_string(), join_err);

        assert!(matches!(err, ExtractionError::Interrupted { ref file_name, .. } if file_name == "resume.docx"));
        assert!(!err.to_string().contains("PDF"));
        assert!(matches!(AppError::from(err), AppError::UnreadableDocument(_)));
    }

    #[tokio::test]
    async fn test_python_aws_scenario_reaches_displayed() {
        let model = happy_model();
        let mut session = session();

        let view = run_analysis(&mut session, &model, docx_input()).await.unwrap();

        assert_eq!(session.phase, SessionPhase::Displayed);
        let job = session.job.as_ref().unwrap();
        let resume = session.resume.as_ref().unwrap();
        let report = session.report.as_ref().unwrap();
        assert!(job.required_skills.contains(&"Python".to_string()));
        assert!(job.technologies.contains(&"AWS".to_string()));
        assert!(resume.technical_skills.contains(&"Python".to_string()));
        assert!(report.missing_skills.contains(&"AWS".to_string()));
        assert!(!report.missing_skills.contains(&"Python".to_string()));

        assert_eq!(view.metrics.missing_skills, 1);
        assert!(session.analyzed_at.is_some());

        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].prompt.contains(PYTHON_JD));
        assert!(requests[1].prompt.contains("Senior Python Developer, 5 years, GCP"));
        assert!(requests[2].prompt.contains("\"technical_skills\""));
        assert!(requests[2].prompt.contains("\"required_skills\""));
    }

    #[tokio::test]
    async fn test_missing_inputs_issue_no_calls() {
        let cases = [
            AnalysisInput {
                job_description: "   ".to_string(),
                ..docx_input()
            },
            AnalysisInput {
                resume: None,
                ..docx_input()
            },
            AnalysisInput::default(),
        ];

        for input in cases {
            let model = happy_model();
            let mut session = session();
            let err = run_analysis(&mut session, &model, input).await.unwrap_err();
            assert!(matches!(err, AppError::MissingInput));
            assert!(model.requests().is_empty());
            assert_eq!(session.phase, SessionPhase::Idle);
        }
    }

    #[tokio::test]
    async fn test_missing_input_keeps_previous_results() {
        let mut session = session();
        run_analysis(&mut session, &happy_model(), docx_input())
            .await
            .unwrap();

        let err = run_analysis(&mut session, &happy_model(), AnalysisInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingInput));
        assert_eq!(session.phase, SessionPhase::Displayed);
        assert!(session.report.is_some());
    }

    #[tokio::test]
    async fn test_unsupported_format_degrades_to_empty_resume_text() {
        let model = happy_model();
        let mut session = session();
        let input = AnalysisInput {
            resume: Some(UploadedFile {
                file_name: "resume.txt".to_string(),
                bytes: Bytes::from_static(b"Senior Python Developer"),
            }),
            ..docx_input()
        };

        let view = run_analysis(&mut session, &model, input).await.unwrap();

        assert_eq!(session.phase, SessionPhase::Displayed);
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, NoticeKind::UnsupportedFormat);
        let resume_prompt = &model.requests()[1].prompt;
        assert!(!resume_prompt.contains("Senior Python Developer"));
        assert!(resume_prompt.trim_end().ends_with("Resume:"));
    }

    #[tokio::test]
    async fn test_unreadable_docx_is_fatal_before_any_call() {
        let model = happy_model();
        let mut session = session();
        let input = AnalysisInput {
            resume: Some(UploadedFile {
                file_name: "resume.docx".to_string(),
                bytes: Bytes::from_static(b"not a zip archive"),
            }),
            ..docx_input()
        };

        let err = run_analysis(&mut session, &model, input).await.unwrap_err();

        assert!(matches!(err, AppError::UnreadableDocument(_)));
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_job_reply_degrades_but_continues() {
        let model = ScriptedModel::new()
            .reply("Sure! Here's the JSON: {not valid}")
            .reply(RESUME_REPLY)
            .reply(MATCH_REPLY);
        let mut session = session();

        let view = run_analysis(&mut session, &model, docx_input()).await.unwrap();

        assert_eq!(session.phase, SessionPhase::Displayed);
        assert_eq!(session.job.as_ref().unwrap(), &JobProfile::default());
        let notice = &view.notices[0];
        assert_eq!(notice.kind, NoticeKind::MalformedResponse);
        assert_eq!(notice.stage, Stage::JobAnalysis);
        assert_eq!(notice.raw.as_deref(), Some("Sure! Here's the JSON: {not valid}"));
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_at_job_stage_returns_to_idle() {
        let model = ScriptedModel::new().fail(401, "Incorrect API key provided");
        let mut session = session();

        let err = run_analysis(&mut session, &model, docx_input()).await.unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.job.is_none());
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_match_failure_retains_job_and_resume_profiles() {
        let model = ScriptedModel::new()
            .reply(JOB_REPLY)
            .reply(RESUME_REPLY)
            .fail(500, "server error");
        let mut session = session();

        let err = run_analysis(&mut session, &model, docx_input()).await.unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.has_profiles());
        assert!(session.report.is_none());
    }

    #[tokio::test]
    async fn test_empty_match_report_is_no_analysis_data() {
        let model = ScriptedModel::new()
            .reply(JOB_REPLY)
            .reply(RESUME_REPLY)
            .reply("I could not compare these documents.");
        let mut session = session();

        let err = run_analysis(&mut session, &model, docx_input()).await.unwrap_err();

        assert!(matches!(err, AppError::NoAnalysisData));
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.has_profiles());
        assert!(session
            .notices
            .iter()
            .any(|n| n.stage == Stage::MatchAnalysis && n.raw.is_some()));
    }

    #[tokio::test]
    async fn test_new_run_overwrites_previous_profiles_and_letter() {
        let mut session = session();
        run_analysis(&mut session, &happy_model(), docx_input())
            .await
            .unwrap();
        generate_cover_letter(
            &mut session,
            &ScriptedModel::new().reply("Dear team, ..."),
            Tone::Professional,
        )
        .await
        .unwrap();

        let second = ScriptedModel::new()
            .reply(r#"{"required_skills": ["Go"]}"#)
            .reply(RESUME_REPLY)
            .reply(MATCH_REPLY);
        run_analysis(&mut session, &second, docx_input()).await.unwrap();

        assert_eq!(session.job.as_ref().unwrap().required_skills, vec!["Go"]);
        assert!(session.cover_letter.is_none());
        assert_eq!(session.phase, SessionPhase::Displayed);
    }

    #[tokio::test]
    async fn test_cover_letter_requires_profiles() {
        let model = ScriptedModel::new().reply("Dear team");
        let mut session = session();

        let err = generate_cover_letter(&mut session, &model, Tone::Confident)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(model.requests().is_empty());
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_cover_letter_is_regenerable_without_touching_profiles() {
        let mut session = session();
        run_analysis(&mut session, &happy_model(), docx_input())
            .await
            .unwrap();
        let (job, resume, report) = (
            session.job.clone(),
            session.resume.clone(),
            session.report.clone(),
        );

        let model = ScriptedModel::new()
            .reply("First draft, confident and concise.")
            .reply("Second draft, confident and concise.");
        let first = generate_cover_letter(&mut session, &model, Tone::Confident)
            .await
            .unwrap();
        let second = generate_cover_letter(&mut session, &model, Tone::Confident)
            .await
            .unwrap();

        assert_ne!(first.text, second.text);
        assert_eq!(session.cover_letter.as_ref().unwrap().text, second.text);
        assert_eq!(session.phase, SessionPhase::CoverLetterReady);
        assert_eq!(session.job, job);
        assert_eq!(session.resume, resume);
        assert_eq!(session.report, report);
        assert!(model.requests()[0].prompt.contains("Write a confident cover letter"));
    }

    #[tokio::test]
    async fn test_empty_generation_keeps_phase_and_previous_letter() {
        let mut session = session();
        run_analysis(&mut session, &happy_model(), docx_input())
            .await
            .unwrap();
        let model = ScriptedModel::new().reply("A fine letter.").reply("  ");

        generate_cover_letter(&mut session, &model, Tone::Friendly)
            .await
            .unwrap();
        let err = generate_cover_letter(&mut session, &model, Tone::Friendly)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmptyGeneration));
        assert_eq!(session.phase, SessionPhase::CoverLetterReady);
        assert_eq!(session.cover_letter.as_ref().unwrap().text, "A fine letter.");
    }

    #[tokio::test]
    async fn test_cover_letter_after_partial_failure_uses_retained_profiles() {
        let mut session = session();
        let model = ScriptedModel::new()
            .reply(JOB_REPLY)
            .reply(RESUME_REPLY)
            .fail(502, "bad gateway");
        run_analysis(&mut session, &model, docx_input())
            .await
            .unwrap_err();

        let letter = generate_cover_letter(
            &mut session,
            &ScriptedModel::new().reply("Dear Hiring Manager"),
            Tone::Professional,
        )
        .await
        .unwrap();

        assert_eq!(letter.text, "Dear Hiring Manager");
        assert_eq!(session.phase, SessionPhase::CoverLetterReady);
    }
}
