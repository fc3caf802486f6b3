// eduforge-ai: generative-content integration layer and learning analytics
// engine for the EduForge platform.
//
// The crate mediates between platform feature code and the text-generating
// model backends. Every feature operation is degrade-safe: it returns a
// uniform envelope whether the model answered, failed, or was disabled, and
// deterministic fallbacks (driven by the analytics engine) stand in when
// the AI path is unavailable.
//
// Wiring at startup:
//
//     let settings = eduforge_ai::config::load_settings()?;
//     let service = Arc::new(AiService::from_settings(&settings)?);
//     let recommender = Recommender::new(service.clone(), settings.features);
//
// The provider singleton is selected exactly once, before any request is
// served, and never mutated afterward; feature modules receive it by Arc.

pub mod analytics;
pub mod config;
pub mod features;
pub mod logging;
pub mod providers;
pub mod service;

pub use analytics::{LearnerActivity, LearningMetrics, PeakStudyTime};
pub use config::{Capability, FeatureFlags, ProviderKind, Settings};
pub use features::{
    ChatbotEnvelope, CourseRecord, CourseSummarizer, InsightsEnvelope, ProgressInsights,
    QuizEnvelope, QuizGenerator, RecommendationEnvelope, Recommender, SearchEnvelope, SmartSearch,
    SummaryEnvelope, Tutor,
};
pub use providers::{ChatMessage, ChatOptions, ChatRequest, ModelProvider, Role};
pub use service::AiService;
