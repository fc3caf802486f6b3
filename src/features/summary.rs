// Course summarization
//
// Always returns the same fixed shape whether the content came from the
// model or from the template, so rendering never has to branch on
// `aiGenerated`. AI fields are overlaid on the template; anything the model
// omits keeps its templated value.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{degrade_safe, CourseRecord};
use crate::config::{Capability, FeatureFlags};
use crate::providers::ChatOptions;
use crate::service::AiService;

const SYSTEM_PROMPT: &str = "You summarize online courses for a catalog page. Respond with \
    JSON only: {\"overview\", \"objectives\": [..], \"audience\", \"prerequisites\": [..], \
    \"outcomes\": [..], \"duration\", \"difficulty\"}.";

/// The fixed summary shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub overview: String,
    pub objectives: Vec<String>,
    pub audience: String,
    pub prerequisites: Vec<String>,
    pub outcomes: Vec<String>,
    pub duration: String,
    pub difficulty: String,
}

/// Envelope returned by every summary call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub summary: CourseSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Summarization feature module.
pub struct CourseSummarizer {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl CourseSummarizer {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Summarize one course.
    pub async fn summarize(&self, course: &CourseRecord) -> SummaryEnvelope {
        let (summary, ai_generated) = degrade_safe(
            &self.flags,
            Capability::Summary,
            || self.ai_summarize(course),
            || template_summary(course),
        )
        .await;

        SummaryEnvelope {
            success: true,
            ai_generated,
            summary,
            message: None,
        }
    }

    async fn ai_summarize(&self, course: &CourseRecord) -> Result<CourseSummary> {
        let user_message = format!(
            "Summarize this course.\nTitle: {}\nField: {}\nDescription: {}",
            course.title, course.field, course.description
        );

        let raw = self
            .service
            .chat(SYSTEM_PROMPT, &user_message, ChatOptions::default())
            .await?;

        let Some(payload) = self.service.parse_json(&raw) else {
            bail!("Response was not recoverable JSON");
        };
        if payload.get("overview").and_then(|v| v.as_str()).is_none() {
            bail!("Payload missing 'overview' key");
        }

        // Overlay on the template so the shape stays complete even when the
        // model skips fields.
        let template = template_summary(course);
        Ok(CourseSummary {
            overview: string_field(&payload, "overview").unwrap_or(template.overview),
            objectives: list_field(&payload, "objectives").unwrap_or(template.objectives),
            audience: string_field(&payload, "audience").unwrap_or(template.audience),
            prerequisites: list_field(&payload, "prerequisites").unwrap_or(template.prerequisites),
            outcomes: list_field(&payload, "outcomes").unwrap_or(template.outcomes),
            duration: string_field(&payload, "duration").unwrap_or(template.duration),
            difficulty: string_field(&payload, "difficulty").unwrap_or(template.difficulty),
        })
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn list_field(payload: &Value, key: &str) -> Option<Vec<String>> {
    payload.get(key).and_then(|v| v.as_array()).map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect()
    })
}

/// Deterministic template summary built from the course record alone.
fn template_summary(course: &CourseRecord) -> CourseSummary {
    CourseSummary {
        overview: format!(
            "{} is a {} course. {}",
            course.title, course.field, course.description
        ),
        objectives: vec![
            format!("Understand the main ideas covered in {}", course.title),
            "Apply the material in practical exercises".to_string(),
        ],
        audience: format!("Learners interested in {}", course.field),
        prerequisites: vec!["No formal prerequisites".to_string()],
        outcomes: vec![format!("Working knowledge of {}", course.field)],
        duration: course
            .duration
            .clone()
            .unwrap_or_else(|| "Self-paced".to_string()),
        difficulty: course
            .difficulty
            .clone()
            .unwrap_or_else(|| "All levels".to_string()),
    }
}
