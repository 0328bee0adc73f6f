//! Output shading-graph contract.
//!
//! The pass appends to an abstract [`GraphSink`]: hierarchically scoped nodes
//! with an identifier attribute, typed inputs/outputs, literal values and
//! directed connections. The sink is owned by the caller and outlives the
//! pass; [`MemoryGraph`] is the in-memory implementation used by tests and
//! the CLI.

mod memory;
mod sink;

pub use memory::*;
pub use sink::*;

use std::fmt;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Value kind of a graph input or output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Scalar,
    Color3,
    /// Only appears on UV readers and 2-D texture transforms.
    Vector2,
    Vector3,
    /// Only appears on the 4-component separate operator in adjustment chains.
    Color4,
    Int,
    String,
    Asset,
}

impl ValueKind {
    /// Node-family suffix selecting the operator variant for this kind.
    /// Kinds that never flow through math/blend operators have none.
    pub fn family_suffix(self) -> Option<&'static str> {
        match self {
            Self::Scalar => Some("_float"),
            Self::Color3 | Self::Vector3 => Some("_color3"),
            Self::Color4 => Some("_color4"),
            Self::Vector2 | Self::Int | Self::String | Self::Asset => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scalar => "float",
            Self::Color3 => "color3",
            Self::Vector2 => "vector2",
            Self::Vector3 => "vector3",
            Self::Color4 => "color4",
            Self::Int => "integer",
            Self::String => "string",
            Self::Asset => "asset",
        };
        f.write_str(s)
    }
}

/// A typed literal value assigned to an input.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Float(f64),
    Color3(DVec3),
    Vector2(DVec2),
    Vector3(DVec3),
    /// RGB plus alpha.
    Color4(DVec3, f64),
    Int(i64),
    Str(String),
    Asset(String),
}

impl Literal {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Scalar,
            Self::Color3(_) => ValueKind::Color3,
            Self::Vector2(_) => ValueKind::Vector2,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Color4(..) => ValueKind::Color4,
            Self::Int(_) => ValueKind::Int,
            Self::Str(_) => ValueKind::String,
            Self::Asset(_) => ValueKind::Asset,
        }
    }

    /// Scalar view, if this literal is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Color3(v) | Self::Vector3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Vector2(v) => write!(f, "({}, {})", v.x, v.y),
            Self::Color4(v, a) => write!(f, "({}, {}, {}, {})", v.x, v.y, v.z, a),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) | Self::Asset(s) => write!(f, "{s:?}"),
        }
    }
}

/// Opaque node handle into the sink. Never owns the sink's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u32);

/// Opaque typed-input handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputHandle(pub u32);

/// Opaque typed-output handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputHandle(pub u32);

/// Either side of a blend step: a string-encoded literal (parsed into the
/// destination kind at assignment time) or a prior node output.
#[derive(Clone, Debug)]
pub enum Operand {
    Literal(String),
    Output(OutputHandle),
}

impl Operand {
    pub fn output(&self) -> Option<OutputHandle> {
        match self {
            Self::Output(h) => Some(*h),
            Self::Literal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_suffix() {
        assert_eq!(ValueKind::Scalar.family_suffix(), Some("_float"));
        assert_eq!(ValueKind::Color3.family_suffix(), Some("_color3"));
        assert_eq!(ValueKind::Vector3.family_suffix(), Some("_color3"));
        assert_eq!(ValueKind::Color4.family_suffix(), Some("_color4"));
        assert_eq!(ValueKind::Asset.family_suffix(), None);
    }

    #[test]
    fn test_literal_kind() {
        assert_eq!(Literal::Float(1.0).kind(), ValueKind::Scalar);
        assert_eq!(Literal::Color3(DVec3::ONE).kind(), ValueKind::Color3);
        assert_eq!(Literal::Int(3).kind(), ValueKind::Int);
    }
}
