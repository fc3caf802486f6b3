// Smart search
//
// AI path: extract structured intent from the free-text query, filter the
// catalog with it, then rank deterministically. Fallback (and the rescue
// path when intent filtering matches nothing): plain keyword search over
// the full catalog with the same ranker, so ordering is reproducible from
// identical inputs no matter which path produced the candidate set.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{degrade_safe, CourseRecord};
use crate::config::{Capability, FeatureFlags};
use crate::providers::ChatOptions;
use crate::service::AiService;

const SYSTEM_PROMPT: &str = "You extract search intent for an online course catalog. \
    Respond with JSON only: {\"keywords\": [..], \"topics\": [..], \
    \"difficulty\": \"..\", \"skills\": [..]}.";

/// Structured intent recovered from the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchIntent {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl SearchIntent {
    /// Every term usable as a substring filter, lowercased.
    fn terms(&self) -> Vec<String> {
        self.keywords
            .iter()
            .chain(self.topics.iter())
            .chain(self.skills.iter())
            .chain(self.difficulty.iter())
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub course_id: String,
    pub title: String,
    pub field: String,
    pub rating: f64,
    pub score: f64,
}

/// Envelope returned by every search call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnvelope {
    pub success: bool,
    pub ai_generated: bool,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Smart search feature module.
pub struct SmartSearch {
    service: Arc<AiService>,
    flags: FeatureFlags,
}

impl SmartSearch {
    pub fn new(service: Arc<AiService>, flags: FeatureFlags) -> Self {
        Self { service, flags }
    }

    /// Search the catalog for a free-text query.
    pub async fn search(&self, query: &str, catalog: &[CourseRecord]) -> SearchEnvelope {
        if query.trim().is_empty() {
            return SearchEnvelope {
                success: false,
                ai_generated: false,
                results: Vec::new(),
                message: Some("Search query must not be empty".to_string()),
            };
        }

        let (results, ai_generated) = degrade_safe(
            &self.flags,
            Capability::Search,
            || self.ai_search(query, catalog),
            || keyword_search(query, catalog),
        )
        .await;

        SearchEnvelope {
            success: true,
            ai_generated,
            results,
            message: None,
        }
    }

    async fn ai_search(&self, query: &str, catalog: &[CourseRecord]) -> Result<Vec<SearchResult>> {
        let user_message =
            format!("Extract the search intent from this catalog query: \"{query}\"");

        let raw = self
            .service
            .chat(SYSTEM_PROMPT, &user_message, ChatOptions::default())
            .await?;

        let Some(payload) = self.service.parse_json(&raw) else {
            bail!("Response was not recoverable JSON");
        };
        let intent: SearchIntent = serde_json::from_value(payload)?;
        let terms = intent.terms();
        if terms.is_empty() {
            bail!("Recovered intent carried no usable terms");
        }

        let matched: Vec<&CourseRecord> = catalog
            .iter()
            .filter(|course| {
                let haystack = course_haystack(course);
                terms.iter().any(|term| haystack.contains(term))
            })
            .collect();

        // Intent too narrow for this catalog: rescue with a keyword pass
        // over everything rather than returning an empty result set.
        if matched.is_empty() {
            return Ok(keyword_search(query, catalog));
        }

        Ok(rank(query, matched))
    }
}

/// Deterministic keyword search: substring filter + the shared ranker.
fn keyword_search(query: &str, catalog: &[CourseRecord]) -> Vec<SearchResult> {
    let words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let matched: Vec<&CourseRecord> = catalog
        .iter()
        .filter(|course| {
            let haystack = course_haystack(course);
            words.iter().any(|word| haystack.contains(word))
        })
        .collect();

    rank(query, matched)
}

fn course_haystack(course: &CourseRecord) -> String {
    format!("{} {} {}", course.title, course.description, course.field).to_lowercase()
}

/// Score and order candidates. Identical inputs always produce identical
/// ordering: float score descending with course id as the tiebreak.
fn rank(query: &str, candidates: Vec<&CourseRecord>) -> Vec<SearchResult> {
    let query_lower = query.to_lowercase();
    let words: Vec<&str> = query_lower.split_whitespace().collect();

    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .map(|course| {
            let title = course.title.to_lowercase();
            let description = course.description.to_lowercase();

            let mut score = 0.0;
            if title.contains(&query_lower) {
                score += 10.0;
            }
            for word in &words {
                if title.contains(word) {
                    score += 3.0;
                }
                if description.contains(word) {
                    score += 1.0;
                }
            }
            score += 0.5 * course.rating;
            score += (course.student_count as f64 / 100.0).min(2.0);

            SearchResult {
                course_id: course.id.clone(),
                title: course.title.clone(),
                field: course.field.clone(),
                rating: course.rating,
                score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.course_id.cmp(&b.course_id))
    });

    results
}
