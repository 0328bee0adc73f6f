//! Pass configuration.
//!
//! All behavior switches live in an immutable [`LowerConfig`] handed to the
//! pass at construction; there is no process-wide state.

use serde::{Deserialize, Serialize};

use crate::util::Error;

/// Target shading-model variant.
///
/// Closed set: two physically based vocabularies, one simplified legacy
/// vocabulary, and the interchange/preview vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShadingVariant {
    /// Energy-conserving "principled" material.
    Principled,
    /// GTR-microfacet PBR material.
    Gtr,
    /// Legacy/simplified material.
    Trad,
    /// Interchange preview material.
    GlPreview,
}

impl ShadingVariant {
    /// Table key used by the channel maps for this variant.
    pub fn key(self) -> &'static str {
        match self {
            Self::Principled => "principled",
            Self::Gtr => "gtr",
            Self::Trad => "trad",
            Self::GlPreview => "glPreview",
        }
    }

    /// Parse a `brdfType` channel value.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        match tag {
            "principled" => Ok(Self::Principled),
            "gtr" => Ok(Self::Gtr),
            "trad" => Ok(Self::Trad),
            "glPreview" => Ok(Self::GlPreview),
            other => Err(Error::UnknownVariant(other.to_string())),
        }
    }
}

/// Immutable configuration for one lowering run.
#[derive(Clone, Debug)]
pub struct LowerConfig {
    /// Variant assumed when a material carries no (or an unknown) `brdfType`.
    pub default_variant: ShadingVariant,
    /// Also emit an interchange preview shader next to each primary shader.
    pub preview: bool,
    /// Restrict material channels to the per-kind allow lists when creating
    /// shader inputs.
    pub prefilter_channels: bool,
    /// Scope path the tree root is defined at.
    pub root_scope: String,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            default_variant: ShadingVariant::Principled,
            preview: false,
            prefilter_channels: false,
            root_scope: "/shadertree".to_string(),
        }
    }
}

impl LowerConfig {
    /// Enable the secondary preview shader.
    pub fn with_preview(mut self) -> Self {
        self.preview = true;
        self
    }

    /// Override the root scope path.
    pub fn with_root_scope(mut self, path: impl Into<String>) -> Self {
        self.root_scope = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parse_roundtrip() {
        for v in [
            ShadingVariant::Principled,
            ShadingVariant::Gtr,
            ShadingVariant::Trad,
            ShadingVariant::GlPreview,
        ] {
            assert_eq!(ShadingVariant::parse(v.key()).unwrap(), v);
        }
        assert!(ShadingVariant::parse("phong").is_err());
    }

    #[test]
    fn test_config_default() {
        let cfg = LowerConfig::default();
        assert_eq!(cfg.default_variant, ShadingVariant::Principled);
        assert!(!cfg.preview);
        assert_eq!(cfg.root_scope, "/shadertree");
    }
}
