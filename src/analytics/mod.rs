// Deterministic metrics engine
//
// Pure functions over caller-supplied activity logs. The same outputs feed
// both the fallback payloads and the prompt context sent to the model, so
// one computation serves two consumers and never disagrees with itself.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

pub mod types;

pub use types::{
    CompletionRecord, EnrollmentRecord, LearnerActivity, LoginEvent, ScoreRecord, StudySession,
};

/// Band of the day a learner studies most, from session start hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeakStudyTime {
    Morning,
    Afternoon,
    Evening,
    Night,
    /// Sessions exist but no start hour repeats.
    Varied,
    /// No sessions recorded at all.
    #[serde(rename = "Not enough data")]
    NotEnoughData,
}

impl std::fmt::Display for PeakStudyTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PeakStudyTime::Morning => "Morning",
            PeakStudyTime::Afternoon => "Afternoon",
            PeakStudyTime::Evening => "Evening",
            PeakStudyTime::Night => "Night",
            PeakStudyTime::Varied => "Varied",
            PeakStudyTime::NotEnoughData => "Not enough data",
        };
        f.write_str(label)
    }
}

/// Mean quiz score; 0 when no scores are recorded.
pub fn quiz_average(scores: &[ScoreRecord]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
}

/// Total study time in whole hours, rounded to nearest.
pub fn total_study_hours(sessions: &[StudySession]) -> u32 {
    let minutes: u64 = sessions.iter().map(|s| s.duration_minutes as u64).sum();
    (minutes as f64 / 60.0).round() as u32
}

/// Consecutive-day login streak anchored at today or yesterday.
///
/// Logins are deduplicated to calendar days and walked backward from the
/// most recent day; the streak is the number of consecutive one-day gaps
/// plus one for the anchor day. A most recent login older than yesterday
/// means the streak is broken: 0.
pub fn study_streak(logins: &[LoginEvent], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = logins.iter().map(|l| l.date).collect();
    days.sort_unstable();
    days.dedup();
    days.reverse();

    let most_recent = match days.first() {
        Some(day) => *day,
        None => return 0,
    };

    let anchor_gap = (today - most_recent).num_days();
    if !(0..=1).contains(&anchor_gap) {
        return 0;
    }

    let mut consecutive = 0u32;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            consecutive += 1;
        } else {
            break;
        }
    }

    consecutive + 1
}

/// Modal session-start hour mapped to a day band.
pub fn peak_study_time(sessions: &[StudySession]) -> PeakStudyTime {
    if sessions.is_empty() {
        return PeakStudyTime::NotEnoughData;
    }

    let mut tallies = [0u32; 24];
    for session in sessions {
        tallies[session.start_time.hour() as usize] += 1;
    }

    let (modal_hour, count) = tallies
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .map(|(hour, count)| (hour as u32, *count))
        .unwrap_or((0, 0));

    // Every hour appearing once is no signal at all
    if count < 2 {
        return PeakStudyTime::Varied;
    }

    match modal_hour {
        5..=11 => PeakStudyTime::Morning,
        12..=16 => PeakStudyTime::Afternoon,
        17..=20 => PeakStudyTime::Evening,
        _ => PeakStudyTime::Night,
    }
}

/// Completed lectures over total enrolled lectures, as a percentage.
pub fn completion_rate(enrollments: &[EnrollmentRecord], completions: &[CompletionRecord]) -> f64 {
    let total: u64 = enrollments.iter().map(|e| e.total_lectures as u64).sum();
    if total == 0 {
        return 0.0;
    }
    let completed: u64 = completions
        .iter()
        .map(|c| c.completed_lectures as u64)
        .sum();
    completed as f64 / total as f64 * 100.0
}

/// Cohort percentile estimate from a z-score, clamped to [1, 99].
///
/// Never reports 0 or 100: the estimate is approximate and a hard extreme
/// would overstate its precision.
pub fn percentile_estimate(user_score: f64, cohort_mean: f64, cohort_std_dev: f64) -> f64 {
    let z = if cohort_std_dev > 0.0 {
        (user_score - cohort_mean) / cohort_std_dev
    } else {
        0.0
    };
    let clamped = (z / 3.0).clamp(-1.0, 1.0);
    (50.0 * (1.0 + clamped)).clamp(1.0, 99.0)
}

/// The computed metrics bundle shared by fallback payloads and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningMetrics {
    pub quiz_average: f64,
    pub total_study_hours: u32,
    pub study_streak_days: u32,
    pub peak_study_time: PeakStudyTime,
    pub completion_rate: f64,
    pub percentile: f64,
}

impl LearningMetrics {
    pub fn compute(activity: &LearnerActivity, today: NaiveDate) -> Self {
        let quiz_average = quiz_average(&activity.scores);
        Self {
            quiz_average,
            total_study_hours: total_study_hours(&activity.sessions),
            study_streak_days: study_streak(&activity.logins, today),
            peak_study_time: peak_study_time(&activity.sessions),
            completion_rate: completion_rate(&activity.enrollments, &activity.completions),
            percentile: percentile_estimate(
                quiz_average,
                activity.cohort_mean_score,
                activity.cohort_std_dev,
            ),
        }
    }
}
