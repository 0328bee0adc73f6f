//! Effect-specific post-wiring.
//!
//! After an effect stack folds to a single operand, this module routes it
//! into the shader. Most effects land on their mapped destination input;
//! stencil, bump, normal and displacement each need a small fixup chain
//! first. Bump and normal results also mirror onto the preview shader.

use glam::DVec3;
use tracing::debug;

use crate::diag::DiagKind;
use crate::graph::{Literal, Operand, ValueKind};

use super::blend::set_operand;
use super::Pass;

/// Wire a folded effect operand into the active shader (and material, for
/// displacement). `mask_name` is the sanitized name of the material boundary
/// the fold happened at; fixup node paths derive from it.
pub(crate) fn connect_effect(
    pass: &mut Pass<'_, '_>,
    mask_name: &str,
    effect: &str,
    dest: &str,
    operand: Operand,
) {
    let Some(shader) = pass.cx.shader else {
        pass.diags.push(
            DiagKind::NoMaterialContext,
            mask_name,
            format!("effect {effect} folded with no shader to receive it"),
        );
        return;
    };
    let material_path = pass.cx.material_path.clone().unwrap_or_default();
    debug!(effect, dest, "wiring folded effect");

    // the fixup chains need a producing output; a stack that folded to a
    // plain literal takes the generic path instead
    if let Some(output) = operand.output() {
        match effect {
            "stencil" => {
                // invert then round to get hard 0/1 coverage
                let sink = &mut *pass.sink;
                let sub = sink.define_shader(
                    &format!("{material_path}/{mask_name}_invert_color"),
                    "ND_subtract_float",
                );
                let in1 = sink.create_input(sub, "in1", ValueKind::Color3);
                sink.set_literal(in1, Literal::Color3(DVec3::ONE));
                let in2 = sink.create_input(sub, "in2", ValueKind::Color3);
                sink.connect(in2, output);
                let sub_out = sink.create_output(sub, "out", ValueKind::Color3);

                let round = sink.define_shader(
                    &format!("{material_path}/{mask_name}_set_0_or_1"),
                    "ND_round_float",
                );
                let r_in = sink.create_input(round, "in", ValueKind::Color3);
                sink.connect(r_in, sub_out);
                let round_out = sink.create_output(round, "out", ValueKind::Color3);

                let opacity = sink.create_input(shader, "opacity", ValueKind::Vector3);
                sink.connect(opacity, round_out);
                return;
            }
            "bump" => {
                let scale = pass
                    .cx
                    .material_node
                    .and_then(|m| m.channel_f64("bumpAmp"))
                    .unwrap_or_else(|| {
                        pass.diags.push(
                            DiagKind::MissingChannel,
                            &material_path,
                            "material has no bumpAmp; bump scale 0",
                        );
                        0.0
                    });
                let sink = &mut *pass.sink;
                let bump = sink.define_shader(
                    &format!("{material_path}/{mask_name}_bumpMap"),
                    "ND_bump_vector3",
                );
                let height = sink.create_input(bump, "height", ValueKind::Vector3);
                sink.connect(height, output);
                let s = sink.create_input(bump, "scale", ValueKind::Scalar);
                sink.set_literal(s, Literal::Float(scale));
                let bump_out = sink.create_output(bump, "out", ValueKind::Vector3);

                let normal = sink.create_input(shader, "normal", ValueKind::Vector3);
                sink.connect(normal, bump_out);
                if let Some(preview) = pass.cx.preview_shader {
                    let p = sink.create_input(preview, "normal", ValueKind::Vector3);
                    sink.connect(p, bump_out);
                }
                return;
            }
            "normal" => {
                let sink = &mut *pass.sink;
                let map = sink.define_shader(
                    &format!("{material_path}/{mask_name}_normalmap"),
                    "ND_normalmap",
                );
                let m_in = sink.create_input(map, "in", ValueKind::Vector3);
                sink.connect(m_in, output);
                // strength is not carried by the source channel block
                let s = sink.create_input(map, "scale", ValueKind::Scalar);
                sink.set_literal(s, Literal::Float(0.0));
                let map_out = sink.create_output(map, "out", ValueKind::Vector3);

                let normal = sink.create_input(shader, "normal", ValueKind::Vector3);
                sink.connect(normal, map_out);
                if let Some(preview) = pass.cx.preview_shader {
                    let p = sink.create_input(preview, "normal", ValueKind::Vector3);
                    sink.connect(p, map_out);
                }
                return;
            }
            "displace" => {
                let scale = pass
                    .cx
                    .material_node
                    .and_then(|m| m.channel_f64("displace"))
                    .unwrap_or_else(|| {
                        pass.diags.push(
                            DiagKind::MissingChannel,
                            &material_path,
                            "material has no displace; displacement scale 0",
                        );
                        0.0
                    });
                let sink = &mut *pass.sink;
                let disp = sink.define_shader(
                    &format!("{material_path}/{mask_name}_displacement"),
                    "ND_displacement_float",
                );
                let d_in = sink.create_input(disp, "displacement", ValueKind::Scalar);
                sink.connect(d_in, output);
                let s = sink.create_input(disp, "scale", ValueKind::Scalar);
                sink.set_literal(s, Literal::Float(scale));
                let disp_out = sink.create_output(disp, "out", ValueKind::Scalar);

                if let Some(material) = pass.cx.material {
                    let terminal =
                        pass.sink
                            .create_output(material, "mtlx:displacement", ValueKind::String);
                    pass.sink.connect_output(terminal, disp_out);
                }
                return;
            }
            _ => {}
        }
    }

    // generic path: the mapped destination input on the primary shader,
    // mirrored to the preview shader when its vocabulary covers the effect
    let kind = pass.maps.value_kind(dest).unwrap_or(ValueKind::Scalar);
    let input = pass.sink.create_input(shader, dest, kind);
    set_operand(
        pass.sink,
        &mut pass.diags,
        &material_path,
        input,
        &operand,
        kind,
    );

    if let Some(preview) = pass.cx.preview_shader {
        if let Some(pdest) = pass.maps.preview_effect_input(effect) {
            let pkind = pass.maps.value_kind(pdest).unwrap_or(kind);
            let pdest = pdest.to_string();
            let p_input = pass.sink.create_input(preview, &pdest, pkind);
            set_operand(
                pass.sink,
                &mut pass.diags,
                &material_path,
                p_input,
                &operand,
                pkind,
            );
        }
    }
}
