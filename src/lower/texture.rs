//! Texture-node factories.
//!
//! Image layers expand into a projection-specific sampler chain (UV or
//! triplanar) followed by a shared adjustment chain; noise layers expand into
//! a 3-D locator feeding a unified-noise node. Factories return a single
//! opaque output handle for the layer's final value.

use std::f64::consts::PI;

use glam::{DVec2, DVec3};
use tracing::debug;

use crate::diag::DiagKind;
use crate::graph::{Literal, OutputHandle, ValueKind};
use crate::map::{broadcast, uv_wrap_mode};
use crate::tree::{NodeKind, ShaderTreeNode, TransformParts};

use super::Pass;

/// Build the full subgraph for one image layer under the active material and
/// return its adjusted output. `kind` is the value kind of the destination
/// input the layer's effect targets.
pub(crate) fn image_layer_output(
    pass: &mut Pass<'_, '_>,
    material_path: &str,
    node: &ShaderTreeNode,
    kind: ValueKind,
) -> OutputHandle {
    let name = pass.ident(&node.name, material_path);
    let base = format!("{material_path}/{name}");
    let suffix = kind.family_suffix().unwrap_or("_color3");

    let locator = node.child_of_kind(NodeKind::TextureLocator);
    let file = node
        .child_of_kind(NodeKind::ImageSource)
        .and_then(|src| src.channel_text("filename"))
        .unwrap_or_else(|| {
            pass.diags.push(
                DiagKind::MissingChannel,
                &base,
                "image layer has no source filename",
            );
            ""
        })
        .to_string();

    let proj = locator
        .and_then(|l| l.channel_text("projType"))
        .unwrap_or("uv");
    debug!(layer = %name, proj, file = %file, "image layer");

    let sampled = match proj {
        "triplanar" => triplanar_sampler(pass, &base, locator, &file, kind, suffix),
        other => {
            if other != "uv" {
                pass.diags.push(
                    DiagKind::MalformedValue,
                    &base,
                    format!("unknown projection {other:?}, falling back to uv"),
                );
            }
            uv_sampler(pass, &base, locator, &file, kind, suffix)
        }
    };

    adjust_chain(pass, &base, node, sampled, kind, suffix)
}

/// UV projection: texcoord reader, 2-D transform, image sampler.
fn uv_sampler(
    pass: &mut Pass<'_, '_>,
    base: &str,
    locator: Option<&ShaderTreeNode>,
    file: &str,
    kind: ValueKind,
    suffix: &str,
) -> OutputHandle {
    // absent tile channels default silently; unknown tokens are diagnosed
    let mut wrap = |name: &str| match locator.and_then(|l| l.channel_text(name)) {
        None => "periodic",
        Some(token) => uv_wrap_mode(token).unwrap_or_else(|| {
            pass.diags.push(
                DiagKind::MalformedValue,
                base,
                format!("unknown uv tile token {token:?}; periodic assumed"),
            );
            "periodic"
        }),
    };
    let wrap_s_mode = wrap("tileU");
    let wrap_t_mode = wrap("tileV");

    let sink = &mut *pass.sink;
    let ch_f64 = |name: &str, default: f64| {
        locator.and_then(|l| l.channel_f64(name)).unwrap_or(default)
    };

    let reader = sink.define_shader(&format!("{base}_streader"), "ND_texcoord_vector2");
    let index = sink.create_input(reader, "index", ValueKind::Int);
    sink.set_literal(index, Literal::Int(0));
    let st_out = sink.create_output(reader, "out", ValueKind::Vector2);

    let transform = sink.define_shader(&format!("{base}_transform"), "UsdTransform2d");
    let t_in = sink.create_input(transform, "in", ValueKind::Vector2);
    sink.connect(t_in, st_out);
    let scale = sink.create_input(transform, "scale", ValueKind::Vector2);
    sink.set_literal(
        scale,
        Literal::Vector2(DVec2::new(ch_f64("wrapU", 1.0), ch_f64("wrapV", 1.0))),
    );
    let translation = sink.create_input(transform, "translation", ValueKind::Vector2);
    sink.set_literal(
        translation,
        Literal::Vector2(DVec2::new(ch_f64("m02", 0.0), ch_f64("m12", 0.0))),
    );
    let rotation = sink.create_input(transform, "rotation", ValueKind::Scalar);
    sink.set_literal(
        rotation,
        Literal::Float(360.0 * ch_f64("uvRotation", 0.0) / (2.0 * PI)),
    );
    let transform_out = sink.create_output(transform, "result", ValueKind::Vector2);

    let texture = sink.define_shader(&format!("{base}_uvTexture"), &format!("ND_image{suffix}"));
    let file_in = sink.create_input(texture, "file", ValueKind::Asset);
    sink.set_literal(file_in, Literal::Asset(file.to_string()));
    let wrap_s = sink.create_input(texture, "wrapS", ValueKind::String);
    sink.set_literal(wrap_s, Literal::Str(wrap_s_mode.to_string()));
    let wrap_t = sink.create_input(texture, "wrapT", ValueKind::String);
    sink.set_literal(wrap_t, Literal::Str(wrap_t_mode.to_string()));
    let texcoord = sink.create_input(texture, "texcoord", ValueKind::Vector2);
    sink.connect(texcoord, transform_out);
    sink.create_output(texture, "out", kind)
}

/// Triplanar projection: 3-D locator, geometric normal, triplanar sampler.
fn triplanar_sampler(
    pass: &mut Pass<'_, '_>,
    base: &str,
    locator: Option<&ShaderTreeNode>,
    file: &str,
    kind: ValueKind,
    suffix: &str,
) -> OutputHandle {
    let parent = base.rsplit_once('/').map(|(p, _)| p).unwrap_or(base);
    let locator_out = locator_3d(pass, parent, locator, base);

    let blending = locator
        .and_then(|l| l.channel_f64("triplanarBlending"))
        .unwrap_or(0.0);
    // sharpness fit: narrower blending regions need steeper falloff
    let falloff = ((1.0 - blending) * PI / 4.0).sin();
    let blend = if falloff == 0.0 {
        pass.diags.push(
            DiagKind::MalformedValue,
            base,
            format!("triplanarBlending {blending} leaves no blend region; sharpness 1"),
        );
        1.0
    } else {
        PI / (4.0 * falloff)
    };

    let sink = &mut *pass.sink;
    let normal = sink.define_shader(&format!("{base}_geoNormal"), "ND_normal_vector3");
    let normal_out = sink.create_output(normal, "out", ValueKind::Vector3);

    let texture = sink.define_shader(
        &format!("{base}_triplanarTexture"),
        &format!("ND_triplanarprojection{suffix}"),
    );
    for axis_file in ["filex", "filey", "filez"] {
        let input = sink.create_input(texture, axis_file, ValueKind::Asset);
        sink.set_literal(input, Literal::Asset(file.to_string()));
    }
    let n_in = sink.create_input(texture, "normal", ValueKind::Vector3);
    sink.connect(n_in, normal_out);
    let upaxis = sink.create_input(texture, "upaxis", ValueKind::Int);
    sink.set_literal(upaxis, Literal::Int(1));
    let blend_in = sink.create_input(texture, "blend", ValueKind::Scalar);
    sink.set_literal(blend_in, Literal::Float(blend));
    let position = sink.create_input(texture, "position", ValueKind::Vector3);
    sink.connect(position, locator_out);
    sink.create_output(texture, "out", kind)
}

/// World-space 3-D locator group: position source scaled, rotated and
/// translated by the layer's decomposed local transform. The node-graph
/// interface is flattened; the group's `out` forwards the final inner output.
pub(crate) fn locator_3d(
    pass: &mut Pass<'_, '_>,
    parent_path: &str,
    locator: Option<&ShaderTreeNode>,
    fallback_base: &str,
) -> OutputHandle {
    let (name, xform) = match locator {
        Some(l) => (
            pass.ident(&l.name, parent_path),
            l.channel_transform("localMatrix")
                .copied()
                .unwrap_or_default(),
        ),
        None => {
            pass.diags.push(
                DiagKind::MissingChannel,
                fallback_base,
                "no texture locator; identity transform assumed",
            );
            (
                format!(
                    "{}_locator",
                    fallback_base.rsplit('/').next().unwrap_or(fallback_base)
                ),
                TransformParts::default(),
            )
        }
    };

    let sink = &mut *pass.sink;
    let ng_path = format!("{parent_path}/{name}");
    let group = sink.define_scope(&ng_path);

    let position = sink.define_shader(&format!("{ng_path}/set"), "ND_position_vector3");
    let space = sink.create_input(position, "space", ValueKind::String);
    sink.set_literal(space, Literal::Str("world".to_string()));
    let mut out = sink.create_output(position, "out", ValueKind::Vector3);

    // reciprocal scale acts as frequency
    let scale = sink.define_shader(&format!("{ng_path}/scale"), "ND_multiply_vector3");
    let in1 = sink.create_input(scale, "in1", ValueKind::Vector3);
    sink.connect(in1, out);
    let in2 = sink.create_input(scale, "in2", ValueKind::Vector3);
    sink.set_literal(in2, Literal::Vector3(DVec3::ONE / xform.scale));
    out = sink.create_output(scale, "out", ValueKind::Vector3);

    let rotation = sink.define_shader(&format!("{ng_path}/rotation"), "ND_rotate3d_vector3");
    let r_in = sink.create_input(rotation, "in", ValueKind::Vector3);
    sink.connect(r_in, out);
    let amount = sink.create_input(rotation, "amount", ValueKind::Scalar);
    sink.set_literal(amount, Literal::Float(0.0));
    let axis = sink.create_input(rotation, "axis", ValueKind::Vector3);
    sink.set_literal(axis, Literal::Vector3(xform.rotation));
    out = sink.create_output(rotation, "out", ValueKind::Vector3);

    let translate = sink.define_shader(&format!("{ng_path}/translate"), "ND_add_vector3");
    let t_in1 = sink.create_input(translate, "in1", ValueKind::Vector3);
    sink.connect(t_in1, out);
    let t_in2 = sink.create_input(translate, "in2", ValueKind::Vector3);
    sink.set_literal(t_in2, Literal::Vector3(xform.position));
    out = sink.create_output(translate, "out", ValueKind::Vector3);

    let group_out = sink.create_output(group, "out", ValueKind::Vector3);
    sink.connect_output(group_out, out);
    group_out
}

/// Shared adjustment chain appended after any sampler: value remap, contrast,
/// brightness, then the optional alpha extract / invert / swizzle steps.
fn adjust_chain(
    pass: &mut Pass<'_, '_>,
    base: &str,
    node: &ShaderTreeNode,
    sampled: OutputHandle,
    kind: ValueKind,
    suffix: &str,
) -> OutputHandle {
    let invert = node.channel_bool("invert").unwrap_or(false);
    let src_low = node.channel_f64("min").unwrap_or(0.0);
    let src_high = node.channel_f64("max").unwrap_or(1.0);
    let brightness = node.channel_f64("brightness").unwrap_or(1.0);
    let contrast = node.channel_f64("contrast").unwrap_or(0.0);
    let alpha_only = node.channel_text("alpha") == Some("only");
    let swizzling = node.channel_bool("swizzling").unwrap_or(false);

    let sink = &mut *pass.sink;
    let adjust = format!("{base}_adjust");
    let group = sink.define_scope(&adjust);

    let remap = sink.define_shader(&format!("{adjust}/valueRange"), &format!("ND_remap{suffix}"));
    let r_in = sink.create_input(remap, "in", kind);
    sink.connect(r_in, sampled);
    let outlow = sink.create_input(remap, "outlow", kind);
    sink.set_literal(outlow, broadcast(src_low, kind));
    let outhigh = sink.create_input(remap, "outhigh", kind);
    sink.set_literal(outhigh, broadcast(src_high, kind));
    let mut out = sink.create_output(remap, "out", kind);
    let mut out_kind = kind;

    let contrast_node =
        sink.define_shader(&format!("{adjust}/contrast"), &format!("ND_contrast{suffix}"));
    let c_in = sink.create_input(contrast_node, "in", kind);
    sink.connect(c_in, out);
    let amount = sink.create_input(contrast_node, "amount", kind);
    sink.set_literal(amount, broadcast(contrast, kind));
    out = sink.create_output(contrast_node, "out", kind);

    let bright = sink.define_shader(
        &format!("{adjust}/brightness"),
        &format!("ND_multiply{suffix}"),
    );
    let b_in1 = sink.create_input(bright, "in1", kind);
    sink.connect(b_in1, out);
    let b_in2 = sink.create_input(bright, "in2", kind);
    sink.set_literal(b_in2, broadcast(brightness, kind));
    out = sink.create_output(bright, "out", kind);

    if alpha_only {
        let separate = sink.define_shader(&format!("{adjust}/channel"), "ND_separate4_color4");
        let s_in = sink.create_input(separate, "in", ValueKind::Color4);
        sink.connect(s_in, out);
        out = sink.create_output(separate, "outa", ValueKind::Scalar);
        out_kind = ValueKind::Scalar;
    }

    if invert {
        let inv = sink.define_shader(&format!("{adjust}/invert"), &format!("ND_invert{suffix}"));
        let i_in = sink.create_input(inv, "in", out_kind);
        sink.connect(i_in, out);
        out = sink.create_output(inv, "out", out_kind);
    }

    if swizzling {
        let channel_out = match node.channel_text("rgba") {
            Some("red") => "outr",
            Some("green") => "outg",
            Some("blue") => "outb",
            _ => "outa",
        };
        let separate = sink.define_shader(&format!("{adjust}/channel"), "ND_separate4_color4");
        let s_in = sink.create_input(separate, "in", ValueKind::Color4);
        sink.connect(s_in, out);
        out = sink.create_output(separate, channel_out, ValueKind::Scalar);
        out_kind = ValueKind::Scalar;
    }

    let group_out = sink.create_output(group, "out", out_kind);
    sink.connect_output(group_out, out);
    group_out
}

/// Build the subgraph for one noise layer: a 3-D locator feeding a fractal
/// unified-noise node. Output is always scalar.
pub(crate) fn noise_output(
    pass: &mut Pass<'_, '_>,
    material_path: &str,
    node: &ShaderTreeNode,
) -> OutputHandle {
    let name = pass.ident(&node.name, material_path);
    let base = format!("{material_path}/{name}");
    debug!(layer = %name, "noise layer");

    let locator = node.child_of_kind(NodeKind::TextureLocator);
    let locator_out = locator_3d(pass, material_path, locator, &base);

    let value1 = node.channel_f64("value1").unwrap_or(0.0);
    let value2 = node.channel_f64("value2").unwrap_or(1.0);
    let octaves = node.channel_f64("freqs").unwrap_or(1.0) as i64;
    let lacunarity = node.channel_f64("freqRatio").unwrap_or(2.0);
    let diminish = node.channel_f64("ampRatio").unwrap_or(0.5);

    let sink = &mut *pass.sink;
    let noise = sink.define_shader(&base, "ND_unifiednoise3d_float");
    let position = sink.create_input(noise, "position", ValueKind::Vector3);
    sink.connect(position, locator_out);
    let freq = sink.create_input(noise, "freq", ValueKind::Vector3);
    sink.set_literal(freq, Literal::Vector3(DVec3::ONE));
    let offset = sink.create_input(noise, "offset", ValueKind::Vector3);
    sink.set_literal(offset, Literal::Vector3(DVec3::ZERO));
    let jitter = sink.create_input(noise, "jitter", ValueKind::Scalar);
    sink.set_literal(jitter, Literal::Float(1.0));
    // 0:perlin 1:cell 2:worley 3:fractal
    let noise_type = sink.create_input(noise, "type", ValueKind::Int);
    sink.set_literal(noise_type, Literal::Int(3));

    let outmin = sink.create_input(noise, "outmin", ValueKind::Scalar);
    sink.set_literal(outmin, Literal::Float(value1 / 2.0 + 0.5));
    let outmax = sink.create_input(noise, "outmax", ValueKind::Scalar);
    sink.set_literal(outmax, Literal::Float(value2));
    let clamp = sink.create_input(noise, "clampoutput", ValueKind::Int);
    sink.set_literal(clamp, Literal::Int(0));

    let oct = sink.create_input(noise, "octaves", ValueKind::Int);
    sink.set_literal(oct, Literal::Int(octaves));
    let lac = sink.create_input(noise, "lacunarity", ValueKind::Scalar);
    sink.set_literal(lac, Literal::Float(lacunarity));
    let dim = sink.create_input(noise, "diminish", ValueKind::Scalar);
    sink.set_literal(dim, Literal::Float(diminish));

    sink.create_output(noise, "out", ValueKind::Scalar)
}
