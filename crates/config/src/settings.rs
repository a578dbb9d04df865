//! Per-run settings: profile resolution plus explicit overrides.
//!
//! Precedence, lowest to highest: profile defaults, config file, explicit
//! overrides (CLI flags). The result is a flat, immutable bundle handed to
//! the pipeline; nothing downstream consults profiles or config again.

use crate::profiles::{model_profile, resource_profile};
use crate::{AppConfig, ConfigError};
use hindsight_core::context::ContextMode;
use serde::Serialize;
use std::path::PathBuf;

/// Explicit overrides, typically from CLI flags. All optional.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_profile: Option<String>,
    pub resource_profile: Option<String>,
    pub root_model: Option<String>,
    pub sub_model: Option<String>,
    pub fallback_model: Option<String>,
    pub max_sessions: Option<usize>,
    pub max_retries: Option<u32>,
    pub context_mode: Option<ContextMode>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub sessions_dir: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
}

/// Effective settings for one run. Immutable once resolved.
#[derive(Debug, Clone, Serialize)]
pub struct RunSettings {
    pub model_profile: String,
    pub resource_profile: String,
    pub root_model: String,
    pub sub_model: String,
    pub fallback_model: String,

    pub max_sessions: usize,
    pub max_chars: usize,
    pub max_iterations: u32,
    pub compaction: bool,
    pub compaction_threshold: f32,
    pub constrained: bool,
    pub context_mode: ContextMode,

    pub max_retries: u32,
    pub backoff_secs: f64,
    pub request_timeout_secs: f64,

    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(skip)]
    pub sessions_dir: Option<PathBuf>,
    #[serde(skip)]
    pub workspace_dir: Option<PathBuf>,
}

impl RunSettings {
    /// Resolve profiles and apply overrides.
    pub fn resolve(config: &AppConfig, overrides: &Overrides) -> Result<Self, ConfigError> {
        let model_profile_name = overrides
            .model_profile
            .clone()
            .unwrap_or_else(|| config.model_profile.clone());
        let resource_profile_name = overrides
            .resource_profile
            .clone()
            .unwrap_or_else(|| config.resource_profile.clone());

        let models = model_profile(&model_profile_name)
            .ok_or_else(|| ConfigError::UnknownModelProfile(model_profile_name.clone()))?;
        let resources = resource_profile(&resource_profile_name)
            .ok_or_else(|| ConfigError::UnknownResourceProfile(resource_profile_name.clone()))?;

        Ok(Self {
            model_profile: model_profile_name,
            resource_profile: resource_profile_name,
            root_model: overrides
                .root_model
                .clone()
                .unwrap_or_else(|| models.root_model.to_string()),
            sub_model: overrides
                .sub_model
                .clone()
                .unwrap_or_else(|| models.sub_model.to_string()),
            fallback_model: overrides
                .fallback_model
                .clone()
                .unwrap_or_else(|| models.fallback_model.to_string()),

            max_sessions: overrides.max_sessions.unwrap_or(resources.max_sessions),
            max_chars: resources.max_chars,
            max_iterations: resources.max_iterations,
            compaction: resources.compaction,
            compaction_threshold: 0.8,
            constrained: resources.constrained,
            context_mode: overrides.context_mode.unwrap_or(ContextMode::Auto),

            max_retries: overrides.max_retries.unwrap_or(config.retry.max_retries),
            backoff_secs: config.retry.backoff_secs,
            request_timeout_secs: config.request_timeout_secs,

            base_url: overrides
                .base_url
                .clone()
                .unwrap_or_else(|| config.base_url.clone()),
            api_key: overrides.api_key.clone().or_else(|| config.api_key.clone()),

            sessions_dir: overrides
                .sessions_dir
                .clone()
                .or_else(|| config.sessions_dir.clone()),
            workspace_dir: overrides
                .workspace_dir
                .clone()
                .or_else(|| Some(config.workspace_dir())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_quality_and_standard() {
        let settings = RunSettings::resolve(&AppConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(settings.model_profile, "quality");
        assert_eq!(settings.resource_profile, "standard");
        assert_eq!(settings.root_model, "kimi-k2.5");
        assert_eq!(settings.sub_model, "kimi-k2-turbo-preview");
        assert_eq!(settings.max_sessions, 30);
        assert_eq!(settings.max_iterations, 20);
        assert!(!settings.compaction);
        assert_eq!(settings.context_mode, ContextMode::Auto);
    }

    #[test]
    fn speed_and_minimal_profiles_are_applied() {
        let overrides = Overrides {
            model_profile: Some("speed".into()),
            resource_profile: Some("minimal".into()),
            ..Default::default()
        };
        let settings = RunSettings::resolve(&AppConfig::default(), &overrides).unwrap();
        assert_eq!(settings.root_model, "kimi-k2-turbo-preview");
        assert_eq!(settings.sub_model, "kimi-k2-turbo-preview");
        assert_eq!(settings.fallback_model, "kimi-k2.5");
        assert_eq!(settings.max_sessions, 5);
        assert_eq!(settings.max_iterations, 4);
        assert!(settings.compaction);
        assert!(settings.constrained);
    }

    #[test]
    fn explicit_flags_beat_profile_values() {
        let overrides = Overrides {
            root_model: Some("gpt-5.3-codex".into()),
            max_sessions: Some(3),
            max_retries: Some(0),
            context_mode: Some(ContextMode::Chunks),
            ..Default::default()
        };
        let settings = RunSettings::resolve(&AppConfig::default(), &overrides).unwrap();
        assert_eq!(settings.root_model, "gpt-5.3-codex");
        // Sub model still comes from the profile.
        assert_eq!(settings.sub_model, "kimi-k2-turbo-preview");
        assert_eq!(settings.max_sessions, 3);
        assert_eq!(settings.max_retries, 0);
        assert_eq!(settings.context_mode, ContextMode::Chunks);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let overrides = Overrides {
            model_profile: Some("warp".into()),
            ..Default::default()
        };
        let err = RunSettings::resolve(&AppConfig::default(), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModelProfile(_)));
    }

    #[test]
    fn serialized_settings_omit_api_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        let settings = RunSettings::resolve(&config, &Overrides::default()).unwrap();
        let toml = toml::to_string(&settings).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(toml.contains("root_model"));
    }
}
