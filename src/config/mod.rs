// Configuration: provider selection, generation defaults, feature gates

pub mod loader;
pub mod settings;

pub use loader::load_settings;
pub use settings::{Capability, FeatureFlags, ProviderKind, ProviderSettings, Settings};
