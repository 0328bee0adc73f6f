//! Shader-tree input IR.
//!
//! The input to the pass is a read-only, ordered tree of typed nodes. Each
//! node carries a display name (not guaranteed unique or identifier-safe) and
//! a flat channel map of string-encoded values, plus the occasional structured
//! value (a 4x4 transform decomposed into position/rotation/scale). The tree
//! is produced externally (scene extraction is out of scope) and typically
//! arrives as JSON.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::util::Error;

/// Node kind. Closed set; the traversal dispatches on it exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Top-level render/tree root.
    Root,
    /// Grouping node: material boundary (non-empty `ptag`) or plain scope.
    Mask,
    /// Image texture layer.
    ImageLayer,
    /// Procedural noise layer.
    NoiseLayer,
    /// Terminal material definition.
    Material,
    /// Coordinate-projection locator attached to a layer.
    TextureLocator,
    /// Still-image source attached to an image layer.
    ImageSource,
}

impl NodeKind {
    /// Parse a kind tag.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        match tag {
            "root" => Ok(Self::Root),
            "mask" => Ok(Self::Mask),
            "imageLayer" => Ok(Self::ImageLayer),
            "noiseLayer" => Ok(Self::NoiseLayer),
            "material" => Ok(Self::Material),
            "textureLocator" => Ok(Self::TextureLocator),
            "imageSource" => Ok(Self::ImageSource),
            other => Err(Error::UnknownNodeKind(other.to_string())),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Root => "root",
            Self::Mask => "mask",
            Self::ImageLayer => "imageLayer",
            Self::NoiseLayer => "noiseLayer",
            Self::Material => "material",
            Self::TextureLocator => "textureLocator",
            Self::ImageSource => "imageSource",
        };
        f.write_str(s)
    }
}

/// A 4x4 local transform decomposed into parts.
///
/// Rotation is a euler triple in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformParts {
    pub position: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for TransformParts {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

/// One channel's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    /// String-encoded scalar, tuple, or token.
    Text(String),
    /// Decomposed 4x4 transform.
    Transform(TransformParts),
}

impl ChannelValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Transform(_) => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformParts> {
        match self {
            Self::Transform(t) => Some(t),
            Self::Text(_) => None,
        }
    }
}

/// Channel map. BTreeMap gives the deterministic alphabetical iteration the
/// original exporter imposed on extracted channels.
pub type ChannelMap = BTreeMap<String, ChannelValue>;

/// A node of the shader tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaderTreeNode {
    pub kind: NodeKind,
    pub name: String,
    #[serde(default)]
    pub channels: ChannelMap,
    #[serde(default)]
    pub children: Vec<ShaderTreeNode>,
}

impl ShaderTreeNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            channels: ChannelMap::new(),
            children: Vec::new(),
        }
    }

    /// Chainable channel setter.
    pub fn with_channel(mut self, name: impl Into<String>, value: ChannelValue) -> Self {
        self.channels.insert(name.into(), value);
        self
    }

    /// Chainable text-channel setter.
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_channel(name, ChannelValue::text(value))
    }

    /// Chainable child append.
    pub fn with_child(mut self, child: ShaderTreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Raw channel lookup.
    pub fn channel(&self, name: &str) -> Option<&ChannelValue> {
        self.channels.get(name)
    }

    /// Channel as text.
    pub fn channel_text(&self, name: &str) -> Option<&str> {
        self.channel(name).and_then(ChannelValue::as_text)
    }

    /// Channel parsed as float.
    pub fn channel_f64(&self, name: &str) -> Option<f64> {
        self.channel_text(name).and_then(|s| s.trim().parse().ok())
    }

    /// Channel parsed as boolean ("1"/"true" and "0"/"false").
    pub fn channel_bool(&self, name: &str) -> Option<bool> {
        match self.channel_text(name)?.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// Channel as a decomposed transform.
    pub fn channel_transform(&self, name: &str) -> Option<&TransformParts> {
        self.channel(name).and_then(ChannelValue::as_transform)
    }

    /// First child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&ShaderTreeNode> {
        self.children.iter().find(|c| c.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_accessors() {
        let node = ShaderTreeNode::new(NodeKind::ImageLayer, "tex")
            .with_text("enable", "1")
            .with_text("opacity", "0.75")
            .with_text("effect", "diffColor");
        assert_eq!(node.channel_bool("enable"), Some(true));
        assert_eq!(node.channel_f64("opacity"), Some(0.75));
        assert_eq!(node.channel_text("effect"), Some("diffColor"));
        assert_eq!(node.channel_f64("missing"), None);
        assert_eq!(node.channel_bool("effect"), None);
    }

    #[test]
    fn test_child_of_kind() {
        let layer = ShaderTreeNode::new(NodeKind::ImageLayer, "tex")
            .with_child(ShaderTreeNode::new(NodeKind::TextureLocator, "loc"))
            .with_child(ShaderTreeNode::new(NodeKind::ImageSource, "still"));
        assert_eq!(
            layer.child_of_kind(NodeKind::TextureLocator).unwrap().name,
            "loc"
        );
        assert!(layer.child_of_kind(NodeKind::Material).is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let json = r#"{
            "kind": "mask",
            "name": "Hull (outer)",
            "channels": {
                "enable": "1",
                "ptag": "Hull",
                "localMatrix": {
                    "position": [0.0, 1.0, 0.0],
                    "rotation": [0.0, 0.0, 0.0],
                    "scale": [2.0, 2.0, 2.0]
                }
            },
            "children": [
                { "kind": "material", "name": "Material" }
            ]
        }"#;
        let node: ShaderTreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::Mask);
        assert_eq!(node.channel_text("ptag"), Some("Hull"));
        let xf = node.channel_transform("localMatrix").unwrap();
        assert_eq!(xf.scale, DVec3::splat(2.0));
        assert_eq!(node.children.len(), 1);

        let back = serde_json::to_string(&node).unwrap();
        let again: ShaderTreeNode = serde_json::from_str(&back).unwrap();
        assert_eq!(again, node);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(NodeKind::parse("noiseLayer").unwrap(), NodeKind::NoiseLayer);
        assert!(NodeKind::parse("gradient").is_err());
    }
}
