// Activity records supplied by the persistence layer
//
// These are plain read-only data carriers; the relational schema that
// produces them lives outside this crate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One course enrollment with its lecture count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub course_id: String,
    pub total_lectures: u32,
}

/// Lecture completion progress for one enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub course_id: String,
    pub completed_lectures: u32,
}

/// A recorded quiz score, 0-100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub quiz_id: String,
    pub score: f64,
}

/// One study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// A login event at calendar-day granularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoginEvent {
    pub date: NaiveDate,
}

/// Everything the analytics engine needs for one learner, plus the cohort
/// statistics used for the percentile estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerActivity {
    #[serde(default)]
    pub enrollments: Vec<EnrollmentRecord>,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
    #[serde(default)]
    pub logins: Vec<LoginEvent>,
    #[serde(default)]
    pub cohort_mean_score: f64,
    #[serde(default)]
    pub cohort_std_dev: f64,
}
