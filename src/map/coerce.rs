//! String-encoded channel values -> typed literals.
//!
//! Channel values arrive as strings: plain floats, integers, or bracketed
//! tuples like `"(0.8, 0.2, 0.1)"`. Parsing is strict and grammar-based;
//! anything that doesn't fit the destination kind is a [`Error::MalformedLiteral`].

use glam::{DVec2, DVec3};

use crate::graph::{Literal, ValueKind};
use crate::util::{Error, Result};

/// Parse a string-encoded channel value into a literal of the given kind.
///
/// Tuples accept `(..)`, `[..]` or bare comma-separated components. A single
/// scalar component broadcasts into color/vector kinds; a 3-component value
/// parsed as `Color4` gets an implicit alpha of 1.
pub fn parse_literal(kind: ValueKind, text: &str) -> Result<Literal> {
    let t = text.trim();
    match kind {
        ValueKind::Scalar => parse_f64(t)
            .map(Literal::Float)
            .ok_or_else(|| Error::malformed("float", text)),
        ValueKind::Int => t
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| Error::malformed("integer", text)),
        ValueKind::Color3 => parse_vec3(t)
            .map(Literal::Color3)
            .ok_or_else(|| Error::malformed("color3", text)),
        ValueKind::Vector3 => parse_vec3(t)
            .map(Literal::Vector3)
            .ok_or_else(|| Error::malformed("vector3", text)),
        ValueKind::Vector2 => match components(t).as_deref() {
            Some([v]) => Ok(Literal::Vector2(DVec2::splat(*v))),
            Some([x, y]) => Ok(Literal::Vector2(DVec2::new(*x, *y))),
            _ => Err(Error::malformed("vector2", text)),
        },
        ValueKind::Color4 => match components(t).as_deref() {
            Some([v]) => Ok(Literal::Color4(DVec3::splat(*v), *v)),
            Some([r, g, b]) => Ok(Literal::Color4(DVec3::new(*r, *g, *b), 1.0)),
            Some([r, g, b, a]) => Ok(Literal::Color4(DVec3::new(*r, *g, *b), *a)),
            _ => Err(Error::malformed("color4", text)),
        },
        ValueKind::String => Ok(Literal::Str(t.to_string())),
        ValueKind::Asset => Ok(Literal::Asset(t.to_string())),
    }
}

/// Broadcast a float into a literal of the destination kind.
///
/// Used when a blend chain ends on a scalar stage feeding a color input, and
/// for the base-value side of blend operators.
pub fn broadcast(value: f64, kind: ValueKind) -> Literal {
    match kind {
        ValueKind::Color3 => Literal::Color3(DVec3::splat(value)),
        ValueKind::Vector2 => Literal::Vector2(DVec2::splat(value)),
        ValueKind::Vector3 => Literal::Vector3(DVec3::splat(value)),
        ValueKind::Color4 => Literal::Color4(DVec3::splat(value), 1.0),
        ValueKind::Int => Literal::Int(value as i64),
        _ => Literal::Float(value),
    }
}

fn parse_f64(t: &str) -> Option<f64> {
    // single-component tuple text like "(0.5)" still counts as a scalar
    match components(t).as_deref() {
        Some([v]) => Some(*v),
        _ => None,
    }
}

fn parse_vec3(t: &str) -> Option<DVec3> {
    match components(t).as_deref() {
        Some([v]) => Some(DVec3::splat(*v)),
        Some([x, y, z]) => Some(DVec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// Split a possibly-bracketed tuple into float components. Returns `None` on
/// the first component that isn't a float.
fn components(t: &str) -> Option<Vec<f64>> {
    let inner = t
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    if inner.is_empty() {
        return None;
    }
    inner
        .split(',')
        .map(|c| c.trim().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        assert_eq!(
            parse_literal(ValueKind::Scalar, " 0.25 ").unwrap(),
            Literal::Float(0.25)
        );
        assert!(parse_literal(ValueKind::Scalar, "fast").is_err());
        assert!(parse_literal(ValueKind::Scalar, "(1, 2)").is_err());
    }

    #[test]
    fn test_tuple_forms() {
        let want = Literal::Color3(DVec3::new(0.8, 0.2, 0.1));
        assert_eq!(parse_literal(ValueKind::Color3, "(0.8, 0.2, 0.1)").unwrap(), want);
        assert_eq!(parse_literal(ValueKind::Color3, "[0.8, 0.2, 0.1]").unwrap(), want);
        assert_eq!(parse_literal(ValueKind::Color3, "0.8,0.2,0.1").unwrap(), want);
    }

    #[test]
    fn test_scalar_broadcast_into_color() {
        assert_eq!(
            parse_literal(ValueKind::Color3, "0.5").unwrap(),
            Literal::Color3(DVec3::splat(0.5))
        );
        assert_eq!(
            parse_literal(ValueKind::Vector3, "(0.5)").unwrap(),
            Literal::Vector3(DVec3::splat(0.5))
        );
    }

    #[test]
    fn test_color4_alpha_default() {
        assert_eq!(
            parse_literal(ValueKind::Color4, "(1, 0, 0)").unwrap(),
            Literal::Color4(DVec3::new(1.0, 0.0, 0.0), 1.0)
        );
        assert_eq!(
            parse_literal(ValueKind::Color4, "(1, 0, 0, 0.5)").unwrap(),
            Literal::Color4(DVec3::new(1.0, 0.0, 0.0), 0.5)
        );
    }

    #[test]
    fn test_malformed_is_error_not_panic() {
        for bad in ["", "()", "(a, b, c)", "1; 2; 3", "(1, 2, 3, 4, 5)"] {
            assert!(parse_literal(ValueKind::Color3, bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_roundtrip_through_display() {
        // Literal -> Display -> parse_literal is the identity for tuples.
        let lit = Literal::Color3(DVec3::new(0.25, 0.5, 0.75));
        let text = lit.to_string();
        assert_eq!(parse_literal(ValueKind::Color3, &text).unwrap(), lit);
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(broadcast(0.5, ValueKind::Scalar), Literal::Float(0.5));
        assert_eq!(
            broadcast(0.5, ValueKind::Color3),
            Literal::Color3(DVec3::splat(0.5))
        );
        assert_eq!(
            broadcast(0.5, ValueKind::Color4),
            Literal::Color4(DVec3::splat(0.5), 1.0)
        );
    }
}
