//! Static model and resource profile tables.
//!
//! A model profile bundles the two-tier model choice (root + cost-efficient
//! sub-model) with the fallback used when the primary raises a fatal error.
//! A resource profile bundles the limits tuned for a class of host, from a
//! workstation down to a small single-board machine.
//!
//! Both tables are immutable and resolved once at startup; components
//! receive the resolved values, never the tables themselves.

use serde::Serialize;

/// A named root/sub/fallback model bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProfile {
    pub name: &'static str,
    pub root_model: &'static str,
    pub sub_model: &'static str,
    pub fallback_model: &'static str,
}

/// A named bundle of limits for constrained execution environments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceProfile {
    pub name: &'static str,
    pub max_sessions: usize,
    pub max_chars: usize,
    pub max_iterations: u32,
    pub compaction: bool,
    /// Constrained profiles force chunked context under `auto` mode.
    pub constrained: bool,
}

const MODEL_PROFILES: &[ModelProfile] = &[
    ModelProfile {
        name: "quality",
        root_model: "kimi-k2.5",
        sub_model: "kimi-k2-turbo-preview",
        fallback_model: "kimi-k2-turbo-preview",
    },
    ModelProfile {
        name: "speed",
        root_model: "kimi-k2-turbo-preview",
        sub_model: "kimi-k2-turbo-preview",
        fallback_model: "kimi-k2.5",
    },
];

const RESOURCE_PROFILES: &[ResourceProfile] = &[
    ResourceProfile {
        name: "standard",
        max_sessions: 30,
        max_chars: 2_000_000,
        max_iterations: 20,
        compaction: false,
        constrained: false,
    },
    ResourceProfile {
        name: "constrained",
        max_sessions: 10,
        max_chars: 600_000,
        max_iterations: 8,
        compaction: true,
        constrained: true,
    },
    ResourceProfile {
        name: "minimal",
        max_sessions: 5,
        max_chars: 200_000,
        max_iterations: 4,
        compaction: true,
        constrained: true,
    },
];

/// Look up a model profile by name.
pub fn model_profile(name: &str) -> Option<&'static ModelProfile> {
    MODEL_PROFILES.iter().find(|p| p.name == name)
}

/// Look up a resource profile by name.
pub fn resource_profile(name: &str) -> Option<&'static ResourceProfile> {
    RESOURCE_PROFILES.iter().find(|p| p.name == name)
}

/// All model profile names.
pub fn model_profile_names() -> Vec<&'static str> {
    MODEL_PROFILES.iter().map(|p| p.name).collect()
}

/// All resource profile names.
pub fn resource_profile_names() -> Vec<&'static str> {
    RESOURCE_PROFILES.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_profile_pairs_root_with_cheaper_sub() {
        let p = model_profile("quality").unwrap();
        assert_eq!(p.root_model, "kimi-k2.5");
        assert_eq!(p.sub_model, "kimi-k2-turbo-preview");
        assert_ne!(p.root_model, p.sub_model);
    }

    #[test]
    fn speed_profile_runs_everything_on_turbo() {
        let p = model_profile("speed").unwrap();
        assert_eq!(p.root_model, p.sub_model);
        assert_eq!(p.fallback_model, "kimi-k2.5");
    }

    #[test]
    fn unknown_profiles_resolve_to_none() {
        assert!(model_profile("turbo-max").is_none());
        assert!(resource_profile("mainframe").is_none());
    }

    #[test]
    fn resource_profiles_shrink_monotonically() {
        let standard = resource_profile("standard").unwrap();
        let constrained = resource_profile("constrained").unwrap();
        let minimal = resource_profile("minimal").unwrap();

        assert!(standard.max_sessions > constrained.max_sessions);
        assert!(constrained.max_sessions > minimal.max_sessions);
        assert!(standard.max_chars > constrained.max_chars);
        assert!(constrained.max_chars > minimal.max_chars);
        assert!(!standard.constrained);
        assert!(constrained.constrained && minimal.constrained);
    }

    #[test]
    fn profile_names_listed() {
        assert_eq!(model_profile_names(), vec!["quality", "speed"]);
        assert_eq!(
            resource_profile_names(),
            vec!["standard", "constrained", "minimal"]
        );
    }
}
