//! Variant-specific channel overrides.
//!
//! Some material channels don't translate one-to-one into the target shading
//! model; the source application encodes part of the response curve in the
//! renderer instead of the channel value. These overrides rewrite the raw
//! channel text before mapping, as a pure function of the material's channel
//! block. Every change is recorded as a diagnostic pairing old and new value.

use crate::config::ShadingVariant;
use crate::diag::{DiagKind, Diagnostics};
use crate::tree::ShaderTreeNode;

fn fmt_f64(v: f64) -> String {
    format!("{v}")
}

fn fmt_triple(r: f64, g: f64, b: f64) -> String {
    format!("({r}, {g}, {b})")
}

fn triple(node: &ShaderTreeNode, name: &str) -> Option<(f64, f64, f64)> {
    let text = node.channel_text(name)?;
    let inner = text
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    let mut it = inner.split(',').map(|c| c.trim().parse::<f64>().ok());
    match (it.next(), it.next(), it.next(), it.next()) {
        (Some(Some(r)), Some(Some(g)), Some(Some(b)), None) => Some((r, g, b)),
        _ => None,
    }
}

/// Rewrite one channel's value for the active variant. Returns the original
/// text when no override applies (or when a required sibling channel is
/// missing or malformed, in which case the value is left alone).
pub fn apply(
    material: &ShaderTreeNode,
    variant: ShadingVariant,
    channel: &str,
    value: &str,
    shader_path: &str,
    diags: &mut Diagnostics,
) -> String {
    let use_ref_idx = material.channel_bool("useRefIdx").unwrap_or(false);
    let spec_ref_idx = material.channel_bool("specRefIdx").unwrap_or(false);

    let mut out = value.to_string();

    match variant {
        ShadingVariant::Gtr => {
            match channel {
                "disperse" => {
                    if let Some(v) = value.trim().parse::<f64>().ok().filter(|v| *v != 0.0) {
                        out = fmt_f64((0.1 / v).abs());
                    }
                }
                "tranRough" => {
                    if let Ok(v) = value.trim().parse::<f64>() {
                        out = fmt_f64(v * 2.0);
                    }
                }
                // specular amount is baked into the IOR response below
                "specAmt" => out = "1.0".to_string(),
                "refIndex" if !use_ref_idx => {
                    if let Some(spec_amt) = material.channel_f64("specAmt") {
                        out = fmt_f64(2.0 / (1.0 - (spec_amt * 0.99999).sqrt()) - 1.0);
                    }
                }
                _ => {}
            }
        }
        ShadingVariant::Principled => {
            if use_ref_idx {
                let spec_amt = material.channel_f64("specAmt");
                let ref_idx = material.channel_f64("refIndex");
                if let (Some(spec_amt), Some(ref_idx)) = (spec_amt, ref_idx) {
                    // Observed-fit approximation; k sets how fast the
                    // specular response saturates as the index grows.
                    let (x, k) = if spec_ref_idx {
                        (2.0 / (1.0 - (spec_amt * 0.8).sqrt()) - 1.0, 100.0)
                    } else {
                        (ref_idx, 20.0)
                    };
                    match channel {
                        "specAmt" => out = fmt_f64(1.0 - 1.0 / (k * (x - 1.0) + 1.0)),
                        "refIndex" => out = fmt_f64(x),
                        _ => {}
                    }
                }
            } else {
                match channel {
                    "specAmt" => out = "1.0".to_string(),
                    "refIndex" => {
                        if let Some(spec_amt) = material.channel_f64("specAmt") {
                            out = fmt_f64(2.0 / (1.0 - (spec_amt * 0.99999).sqrt()) - 1.0);
                        }
                    }
                    "specCol" => out = "(1.0, 1.0, 1.0)".to_string(),
                    _ => {}
                }
            }

            // always: specular color tinted from the diffuse hue
            if channel == "specCol" {
                if let (Some((dr, dg, db)), Some(tint)) =
                    (triple(material, "diffCol"), material.channel_f64("specTint"))
                {
                    let m = dr.max(dg).max(db);
                    // a black diffuse color carries no hue to tint from
                    if m == 0.0 {
                        diags.push(
                            DiagKind::MalformedValue,
                            shader_path,
                            "diffCol has no dominant channel; specular tint skipped",
                        );
                    } else {
                        let sr = 1.0 + (dr / m) * tint;
                        let sg = 1.0 + (dg / m) * tint;
                        let sb = 1.0 + (db / m) * tint;
                        // clamp the triple back below 1 by shifting it down
                        let m = sr.max(sg).max(sb) - 1.0;
                        out = fmt_triple(sr - m, sg - m, sb - m);
                    }
                }
            }
            if channel == "sheenTint" {
                if let Ok(v) = value.trim().parse::<f64>() {
                    out = fmt_triple(v, v, v);
                }
            }
        }
        ShadingVariant::Trad | ShadingVariant::GlPreview => {}
    }

    if out != value {
        diags.push_override(shader_path, channel, value, &out);
    }
    out
}
