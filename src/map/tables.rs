//! The mapping tables.
//!
//! All tables are data, not code: [`Mappings`] deserializes from JSON so a
//! pipeline can override individual entries, and `Default` compiles in the
//! stock tables. An empty-string destination means "known but intentionally
//! dropped" and is distinct from an absent entry only for diagnostics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ShadingVariant;
use crate::graph::ValueKind;
use crate::tree::NodeKind;
use crate::util::{Error, Result};

fn owned(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The table bundle one lowering run works from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Mappings {
    /// Layer `effect` token -> destination shader input (primary vocabulary).
    pub effect_inputs: HashMap<String, String>,
    /// Layer `effect` token -> destination shader input (preview vocabulary).
    pub preview_effect_inputs: HashMap<String, String>,
    /// Destination shader input -> value kind, across both vocabularies.
    pub value_kinds: HashMap<String, ValueKind>,
    /// Variant key -> (material channel -> destination shader input).
    pub channel_maps: HashMap<String, HashMap<String, String>>,
    /// Node-kind tag -> channels worth extracting for that kind.
    pub channel_filters: HashMap<String, Vec<String>>,
}

impl Default for Mappings {
    fn default() -> Self {
        let mut channel_maps = HashMap::new();
        channel_maps.insert(
            "glPreview".to_string(),
            owned(&[
                ("specCol", "specularColor"),
                ("specTint", "metallic"),
                ("diffCol", "diffuseColor"),
                ("luminousAmt", "emissive"),
                ("luminousCol", "emissiveColor"),
                ("specAmt", "specular"),
                ("rough", "roughness"),
                ("refIndex", "ior"),
                ("coatAmt", "clearcoat"),
                ("coatRough", "clearcoatRoughness"),
                ("opacity", "opacity"),
                ("stencil", "opacityThreshold"),
                ("normal", "normal"),
                ("disp", "displacement"),
                ("occ", "occlusion"),
            ]),
        );
        channel_maps.insert(
            "principled".to_string(),
            owned(&[
                ("specRefIdx", ""),
                ("diffAmt", "base"),
                ("diffCol", "base_color"),
                ("opacity", "opacity"),
                ("metallic", "metalness"),
                ("specAmt", "specular"),
                ("specCol", "specular_color"),
                ("refIndex", "specular_IOR"),
                ("aniso", "specular_anisotropy"),
                ("rough", "specular_roughness"),
                ("coatAmt", "coat"),
                ("coatRough", "coat_roughness"),
                ("luminousAmt", "emission"),
                ("luminousCol", "emission_color"),
                ("sheen", "sheen"),
                ("sheenTint", "sheen_color"),
                ("flatness", "sheen_roughness"),
                ("tranAmt", "transmission"),
                ("scatterAmt", "transmission_scatter"),
                ("disperse", "transmission_dispersion"),
                ("tranCol", "transmission_color"),
                ("tranDist", "transmission_depth"),
                ("tranRough", "transmission_roughness"),
                ("stencil", "opacity"),
                ("subsAmt", "subsurface"),
                ("subsCol", "subsurface_color"),
                ("subsDepth", "subsurface_radius"),
                ("subsDist", "subsurface_scale"),
                ("normal", "normal"),
                ("disp", "displacement"),
            ]),
        );
        channel_maps.insert(
            "gtr".to_string(),
            owned(&[
                ("opacity", "opacity"),
                ("diffAmt", "base"),
                ("diffCol", "base_color"),
                ("specAmt", "specular"),
                ("specCol", "specular_color"),
                ("rough", "specular_roughness"),
                ("refIndex", "specular_IOR"),
                ("aniso", "specular_anisotropy"),
                ("coatAmt", "coat"),
                ("coatRough", "coat_roughness"),
                ("tranAmt", "transmission"),
                ("tranCol", "transmission_color"),
                ("tranDist", "transmission_depth"),
                ("scatterAmt", "transmission_scatter"),
                ("disperse", "transmission_dispersion"),
                ("tranRough", "transmission_extra_roughness"),
                ("stencil", "opacity"),
                ("radiance", "emission"),
                ("luminousCol", "emission_color"),
                ("subsAmt", "subsurface"),
                ("subsCol", "subsurface_color"),
                ("subsDepth", "subsurface_radius"),
                ("subsDist", "subsurface_scale"),
                ("normal", "normal"),
                ("disp", "displacement"),
            ]),
        );
        channel_maps.insert(
            "trad".to_string(),
            owned(&[
                ("diffAmt", "base"),
                ("diffCol", "base_color"),
                ("specAmt", "specular"),
                ("specCol", "specular_color"),
                ("rough", "specular_roughness"),
                ("luminousAmt", "emission"),
                ("luminousCol", "emission_color"),
                ("opacity", "opacity"),
                ("tranAmt", "transmission"),
                ("stencil", "opacity"),
                ("normal", "normal"),
                ("disp", "displacement"),
            ]),
        );

        let mut value_kinds = HashMap::new();
        for (name, kind) in [
            // primary vocabulary
            ("base", ValueKind::Scalar),
            ("base_color", ValueKind::Color3),
            ("opacity", ValueKind::Scalar),
            ("metalness", ValueKind::Scalar),
            ("diffuse_roughness", ValueKind::Scalar),
            ("specular", ValueKind::Scalar),
            ("specular_color", ValueKind::Color3),
            ("specular_IOR", ValueKind::Scalar),
            ("specular_anisotropy", ValueKind::Scalar),
            ("specular_roughness", ValueKind::Scalar),
            ("sheen", ValueKind::Scalar),
            ("sheen_color", ValueKind::Color3),
            ("sheen_roughness", ValueKind::Scalar),
            ("coat", ValueKind::Scalar),
            ("coat_roughness", ValueKind::Scalar),
            ("emission", ValueKind::Scalar),
            ("emission_color", ValueKind::Color3),
            ("transmission", ValueKind::Scalar),
            ("transmission_scatter", ValueKind::Scalar),
            ("transmission_dispersion", ValueKind::Scalar),
            ("transmission_extra_roughness", ValueKind::Scalar),
            ("transmission_color", ValueKind::Color3),
            ("transmission_depth", ValueKind::Scalar),
            ("transmission_roughness", ValueKind::Scalar),
            ("subsurface", ValueKind::Scalar),
            ("subsurface_color", ValueKind::Color3),
            ("subsurface_radius", ValueKind::Scalar),
            ("subsurface_scale", ValueKind::Scalar),
            ("subsurface_anisotropy", ValueKind::Scalar),
            ("thin_film_thickness", ValueKind::Scalar),
            ("thin_film_IOR", ValueKind::Scalar),
            ("thin_walled", ValueKind::Int),
            ("normal", ValueKind::Vector3),
            ("in", ValueKind::Vector3),
            ("displacement", ValueKind::Scalar),
            // preview vocabulary
            ("diffuseColor", ValueKind::Color3),
            ("emissive", ValueKind::Scalar),
            ("emissiveColor", ValueKind::Color3),
            ("specularColor", ValueKind::Color3),
            ("metallic", ValueKind::Scalar),
            ("roughness", ValueKind::Scalar),
            ("clearcoat", ValueKind::Scalar),
            ("clearcoatRoughness", ValueKind::Scalar),
            ("ior", ValueKind::Scalar),
            ("occlusion", ValueKind::Scalar),
            ("opacityThreshold", ValueKind::Scalar),
        ] {
            value_kinds.insert(name.to_string(), kind);
        }

        // allow lists per node kind; noise layers carry no list and accept
        // everything
        let mut channel_filters = HashMap::new();
        channel_filters.insert(
            "mask".to_string(),
            owned_list(&[
                "blend", "effect", "enable", "filter", "invert", "opacity", "ptag",
                "ptyp", "render", "submask",
            ]),
        );
        channel_filters.insert(
            "imageLayer".to_string(),
            owned_list(&[
                "aa", "aaVal", "alpha", "blend", "blueInv", "brightness", "clamp",
                "contrast", "effect", "enable", "filter", "gamma", "greenInv",
                "ignSclGrp", "invert", "max", "min", "minSpot", "opacity", "pixBlend",
                "rawTextureAlpha", "rawTextureColor", "rawTextureValue", "redInv",
                "render", "rgba", "sourceHigh", "sourceLow", "swizzling",
                "textureAlpha", "textureColor", "textureValue",
            ]),
        );
        channel_filters.insert(
            "imageSource".to_string(),
            owned_list(&[
                "enable", "blend", "opacity", "filename", "format", "udim",
                "alphaMode", "colorRange", "colorspace", "fps", "imageStack",
                "interlace", "playback",
            ]),
        );
        channel_filters.insert(
            "textureLocator".to_string(),
            owned_list(&[
                "projType", "uvMap", "useUDIM", "uvRotation", "wrapU", "wrapV",
                "tileU", "tileV", "world", "worldMatrix", "worldXfrm", "wposMatrix",
                "wrotMatrix", "wsclMatrix", "triplanarBlending",
            ]),
        );
        channel_filters.insert(
            "material".to_string(),
            owned_list(&[
                "useRefIdx", "brdfType", "specRefIdx", "diffAmt", "diffCol",
                "specAmt", "specCol", "refIndex", "aniso", "rough", "specFres",
                "specTint", "coatAmt", "coatRough", "radiance", "luminousAmt",
                "luminousCol", "metallic", "scatterAmt", "disperse", "tranRough",
                "subsAmt", "subsCol", "subsDepth", "subsDist", "sheen", "sheenTint",
                "flatness", "opacity", "tranAmt", "tranCol", "tranDist", "normal",
            ]),
        );

        Self {
            effect_inputs: owned(&[
                ("diffColor", "base_color"),
                ("diffAmount", "base"),
                ("rough", "specular_roughness"),
                ("normal", "in"),
                ("objectNormal", "in"),
                ("bump", "normal"),
                ("stencil", "in"),
                ("specAmount", "specular"),
                ("reflFresnel", "specular"),
                ("specFresnel", "specular"),
                ("tranAmount", "transmission"),
                ("lumiAmount", "emission"),
                ("lumiColor", "emission_color"),
                ("specColor", "specular_color"),
                ("metallic", "metalness"),
                ("sheen", "sheen"),
                ("sheenTint", "sheen_color"),
                ("flatness", "sheen_roughness"),
                ("displace", "displacement"),
            ]),
            preview_effect_inputs: owned(&[
                ("diffColor", "diffuseColor"),
                ("lumiColor", "emissiveColor"),
                ("specColor", "specularColor"),
                ("metallic", "metallic"),
                ("lumiAmount", "emissive"),
                ("rough", "roughness"),
                ("normal", "normal"),
                ("displace", "displacement"),
            ]),
            value_kinds,
            channel_maps,
            channel_filters,
        }
    }
}

impl Mappings {
    /// Load table overrides from JSON. Absent sections fall back to the
    /// compiled-in defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let m: Self = serde_json::from_str(text)?;
        m.validate()?;
        Ok(m)
    }

    /// Reject table bundles whose cross-references don't line up.
    pub fn validate(&self) -> Result<()> {
        for (variant, map) in &self.channel_maps {
            for (channel, input) in map {
                if !input.is_empty() && !self.value_kinds.contains_key(input) {
                    return Err(Error::InvalidTables(format!(
                        "channel map {variant}: {channel} maps to {input} which has no value kind"
                    )));
                }
            }
        }
        for (effect, input) in self
            .effect_inputs
            .iter()
            .chain(self.preview_effect_inputs.iter())
        {
            if !input.is_empty() && !self.value_kinds.contains_key(input) {
                return Err(Error::InvalidTables(format!(
                    "effect {effect} maps to {input} which has no value kind"
                )));
            }
        }
        Ok(())
    }

    /// Destination input for a layer effect, or `None` when the effect is
    /// unmapped or intentionally dropped.
    pub fn effect_input(&self, effect: &str) -> Option<&str> {
        self.effect_inputs
            .get(effect)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Destination input for a layer effect in the preview vocabulary.
    pub fn preview_effect_input(&self, effect: &str) -> Option<&str> {
        self.preview_effect_inputs
            .get(effect)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether the effect token is known at all (even if dropped).
    pub fn knows_effect(&self, effect: &str) -> bool {
        self.effect_inputs.contains_key(effect)
    }

    /// The channel map for a variant.
    pub fn channel_map(&self, variant: ShadingVariant) -> Option<&HashMap<String, String>> {
        self.channel_maps.get(variant.key())
    }

    /// Destination shader input for a material channel under a variant.
    /// Unknown and intentionally-dropped channels both come back `None`.
    pub fn mapped_channel(&self, variant: ShadingVariant, channel: &str) -> Option<&str> {
        self.channel_map(variant)?
            .get(channel)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Reverse lookup: the material channel feeding a destination input.
    pub fn source_channel(&self, variant: ShadingVariant, input: &str) -> Option<&str> {
        self.channel_map(variant)?
            .iter()
            .find(|(_, v)| v.as_str() == input)
            .map(|(k, _)| k.as_str())
    }

    /// Value kind of a destination shader input.
    pub fn value_kind(&self, input: &str) -> Option<ValueKind> {
        self.value_kinds.get(input).copied()
    }

    /// Whether the channel is on the allow list for the node kind. Kinds
    /// without a list accept everything.
    pub fn channel_allowed(&self, kind: NodeKind, channel: &str) -> bool {
        match self.channel_filters.get(&kind.to_string()) {
            Some(list) => list.iter().any(|c| c == channel),
            None => true,
        }
    }
}

/// UV tiling token -> address mode of the image sampler.
pub fn uv_wrap_mode(token: &str) -> Option<&'static str> {
    match token {
        "reset" => Some("black"),
        "repeat" => Some("periodic"),
        "edge" => Some("clamp"),
        "mirror" => Some("mirror"),
        _ => None,
    }
}
