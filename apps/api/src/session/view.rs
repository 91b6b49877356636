// Read-only projections of a session for the dashboard and the JSON API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::job::JobProfile;
use crate::analysis::matching::{AtsSuggestion, MatchReport};
use crate::analysis::resume::ResumeProfile;
use crate::session::{CoverLetter, Notice, Session, SessionPhase};

pub const MATCHING_SKILLS_COLOR: &str = "#4CAF50";
pub const MISSING_SKILLS_COLOR: &str = "#E74C3C";

const NOT_AVAILABLE: &str = "N/A";

/// The three headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub overall_match: String,
    pub ats_score: String,
    pub missing_skills: usize,
}

/// One bar of the matching-vs-missing skills chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillBar {
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub phase: SessionPhase,
    pub metrics: Metrics,
    pub skills_chart: [SkillBar; 2],
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub ats_suggestions: Vec<AtsSuggestion>,
    pub notices: Vec<Notice>,
}

impl AnalysisView {
    pub fn new(phase: SessionPhase, report: &MatchReport, notices: &[Notice]) -> Self {
        Self {
            phase,
            metrics: Metrics {
                overall_match: or_not_available(&report.overall_match_percentage),
                ats_score: or_not_available(&report.ats_score),
                missing_skills: report.missing_skills.len(),
            },
            skills_chart: [
                SkillBar {
                    label: "Matching Skills",
                    count: report.matching_skills.len(),
                    color: MATCHING_SKILLS_COLOR,
                },
                SkillBar {
                    label: "Missing Skills",
                    count: report.missing_skills.len(),
                    color: MISSING_SKILLS_COLOR,
                },
            ],
            matching_skills: report.matching_skills.clone(),
            missing_skills: report.missing_skills.clone(),
            recommendations: report.recommendations.clone(),
            ats_suggestions: report.ats_optimization_suggestions.clone(),
            notices: notices.to_vec(),
        }
    }
}

fn or_not_available(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

/// Everything a reloaded dashboard needs. The credential is never part of it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub job_profile: Option<JobProfile>,
    pub resume_profile: Option<ResumeProfile>,
    pub analysis: Option<AnalysisView>,
    pub cover_letter: Option<CoverLetter>,
    pub notices: Vec<Notice>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            phase: session.phase,
            created_at: session.created_at,
            analyzed_at: session.analyzed_at,
            job_profile: session.job.clone(),
            resume_profile: session.resume.clone(),
            analysis: session
                .report
                .as_ref()
                .map(|report| AnalysisView::new(session.phase, report, &session.notices)),
            cover_letter: session.cover_letter.clone(),
            notices: session.notices.clone(),
        }
    }
}
