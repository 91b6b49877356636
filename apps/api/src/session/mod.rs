// Interactive session: in-memory state for one browser tab and the orchestration over it.
// The orchestrator is the only writer; handlers and views read.

pub mod handlers;
pub mod orchestrator;
pub mod view;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::job::JobProfile;
use crate::analysis::matching::MatchReport;
use crate::analysis::resume::ResumeProfile;
use crate::analysis::tone::Tone;
use crate::config::DEFAULT_SESSION_IDLE_TTL_SECS;
use crate::errors::AppError;
use crate::llm_client::response::MalformedResponse;
use crate::llm_client::ApiKey;

/// Where a session is in the analyze → display → cover letter flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Ready,
    Extracting,
    AnalyzingJob,
    AnalyzingResume,
    AnalyzingMatch,
    Displayed,
    GeneratingCoverLetter,
    CoverLetterReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    JobAnalysis,
    ResumeAnalysis,
    MatchAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    UnsupportedFormat,
    MalformedResponse,
}

/// A degraded-but-not-fatal event from the last analysis run, shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub stage: Stage,
    pub message: String,
    /// Model output that failed to decode, for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverLetter {
    pub tone: Tone,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

/// State of one interactive session. Nothing here outlives the process.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    credential: ApiKey,
    pub phase: SessionPhase,
    pub job: Option<JobProfile>,
    pub resume: Option<ResumeProfile>,
    pub report: Option<MatchReport>,
    pub cover_letter: Option<CoverLetter>,
    pub notices: Vec<Notice>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(credential: ApiKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential,
            phase: SessionPhase::Idle,
            job: None,
            resume: None,
            report: None,
            cover_letter: None,
            notices: Vec::new(),
            created_at: Utc::now(),
            analyzed_at: None,
        }
    }

    pub fn credential(&self) -> &ApiKey {
        &self.credential
    }

    pub(crate) fn transition(&mut self, next: SessionPhase) {
        info!(session_id = %self.id, from = ?self.phase, to = ?next, "Session phase transition");
        self.phase = next;
    }

    /// Drops everything the previous run produced.
    pub(crate) fn begin_run(&mut self) {
        self.job = None;
        self.resume = None;
        self.report = None;
        self.cover_letter = None;
        self.notices.clear();
        self.analyzed_at = None;
    }

    pub(crate) fn record_unsupported_format(&mut self, message: String) {
        warn!(session_id = %self.id, "{message}");
        self.notices.push(Notice {
            kind: NoticeKind::UnsupportedFormat,
            stage: Stage::Extraction,
            message,
            raw: None,
        });
    }

    pub(crate) fn record_malformed(&mut self, stage: Stage, malformed: Option<MalformedResponse>) {
        let Some(malformed) = malformed else {
            return;
        };
        warn!(
            session_id = %self.id,
            ?stage,
            reason = %malformed.reason,
            raw = %malformed.raw,
            "Invalid JSON response from LLM"
        );
        self.notices.push(Notice {
            kind: NoticeKind::MalformedResponse,
            stage,
            message: "Invalid JSON response from API. Please retry.".to_string(),
            raw: Some(malformed.raw),
        });
    }

    /// Both profiles are held, so a cover letter can be written.
    pub fn has_profiles(&self) -> bool {
        self.job.is_some() && self.resume.is_some()
    }
}

/// Live sessions keyed by id. Each session sits behind its own mutex, held for the
/// whole of a user action, so one session never has two LLM calls in flight.
///
/// Sessions are dropped after `idle_ttl` without a request, so an abandoned tab does
/// not keep its credential in memory for the life of the process.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    idle_ttl: Duration,
}

struct StoredSession {
    session: Arc<Mutex<Session>>,
    last_active: Instant,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS))
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn create(&self, credential: ApiKey) -> Uuid {
        let session = Session::new(credential);
        let id = session.id;
        self.sessions.write().await.insert(
            id,
            StoredSession {
                session: Arc::new(Mutex::new(session)),
                last_active: Instant::now(),
            },
        );
        info!(session_id = %id, "Session created");
        id
    }

    /// Looks a session up and marks it active.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        stored.last_active = Instant::now();
        Ok(stored.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session discarded");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than `idle_ttl`. A session a handler is
    /// still holding is kept regardless. Returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, stored| {
            let keep = now.duration_since(stored.last_active) < self.idle_ttl
                || Arc::strong_count(&stored.session) > 1;
            if !keep {
                info!(session_id = %id, "Session expired after inactivity");
            }
            keep
        });
        before - sessions.len()
    }

    /// Runs `evict_idle` in the background every `period`.
    pub fn spawn_idle_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    debug!(evicted, remaining, "Idle session sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        ApiKey::new("sk-test").unwrap()
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new(key());
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(!session.has_profiles());
        assert!(session.notices.is_empty());
    }

    #[test]
    fn test_begin_run_discards_previous_results() {
        let mut session = Session::new(key());
        session.job = Some(JobProfile::default());
        session.resume = Some(ResumeProfile::default());
        session.report = Some(MatchReport::default());
        session.record_unsupported_format("nope".to_string());

        session.begin_run();

        assert!(session.job.is_none());
        assert!(session.resume.is_none());
        assert!(session.report.is_none());
        assert!(session.notices.is_empty());
    }

    #[test]
    fn test_record_malformed_ignores_clean_replies() {
        let mut session = Session::new(key());
        session.record_malformed(Stage::JobAnalysis, None);
        assert!(session.notices.is_empty());

        session.record_malformed(
            Stage::MatchAnalysis,
            Some(MalformedResponse {
                raw: "oops".to_string(),
                reason: "expected value".to_string(),
            }),
        );
        assert_eq!(session.notices.len(), 1);
        assert_eq!(session.notices[0].stage, Stage::MatchAnalysis);
        assert_eq!(session.notices[0].raw.as_deref(), Some("oops"));
    }

    #[test]
    fn test_session_debug_never_prints_credential() {
        let session = Session::new(ApiKey::new("sk-very-secret").unwrap());
        assert!(!format!("{session:?}").contains("sk-very-secret"));
    }

    #[tokio::test]
    async fn test_store_create_get_remove() {
        let store = SessionStore::default();
        let id = store.create(key()).await;

        assert_eq!(store.len().await, 1);
        let session = store.get(id).await.unwrap();
        assert_eq!(session.lock().await.id, id);

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(matches!(store.get(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_is_evicted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create(key()).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.evict_idle().await, 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.evict_idle().await, 1);
        assert_eq!(store.len().await, 0);
        assert!(matches!(store.get(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_resets_idle_clock() {
        let store = SessionStore::new(Duration::from_secs(60));
        let active = store.create(key()).await;
        let abandoned = store.create(key()).await;

        tokio::time::advance(Duration::from_secs(45)).await;
        store.get(active).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.evict_idle().await, 1);
        assert!(store.get(active).await.is_ok());
        assert!(store.get(abandoned).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_in_use_is_not_evicted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create(key()).await;
        let held = store.get(id).await.unwrap();

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(store.evict_idle().await, 0);

        drop(held);
        assert_eq!(store.evict_idle().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_abandoned_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        for _ in 0..50 {
            store.create(key()).await;
        }
        let sweeper = store.spawn_idle_sweeper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(75)).await;

        assert_eq!(store.len().await, 0);
        sweeper.abort();
    }
}
