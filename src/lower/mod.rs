//! The lowering pass.
//!
//! A recursive descent over the shader tree, threading a mutable
//! [`ShadingContext`] and appending to a [`GraphSink`]. Masks open material
//! boundaries, layers register effect connectors, materials create shaders,
//! and each mask boundary folds its accumulated stacks into blend chains.

mod blend;
mod overrides;
mod texture;
mod wiring;

pub use blend::{fold_stack, BlendMode, Connector, EffectStack};

use tracing::{debug, warn};

use crate::config::{LowerConfig, ShadingVariant};
use crate::diag::{DiagKind, Diagnostics};
use crate::graph::{GraphSink, NodeHandle, Operand, ValueKind};
use crate::map::{parse_literal, Mappings};
use crate::tree::{NodeKind, ShaderTreeNode};
use crate::util::{clean_name, needs_cleaning};

/// Mutable state threaded through the traversal.
///
/// One material boundary is active at a time; the fields reset when a mask
/// closes (effects) or repoint when a new boundary or material opens.
pub struct ShadingContext<'t> {
    pub material: Option<NodeHandle>,
    pub material_path: Option<String>,
    pub shader: Option<NodeHandle>,
    pub preview_shader: Option<NodeHandle>,
    pub variant: ShadingVariant,
    pub material_node: Option<&'t ShaderTreeNode>,
    pub effects: EffectStack,
}

impl<'t> ShadingContext<'t> {
    fn new(variant: ShadingVariant) -> Self {
        Self {
            material: None,
            material_path: None,
            shader: None,
            preview_shader: None,
            variant,
            material_node: None,
            effects: EffectStack::new(),
        }
    }
}

/// The lowering pass. Construct once per configuration, run per tree.
pub struct Lowerer<'m> {
    config: LowerConfig,
    maps: &'m Mappings,
}

impl<'m> Lowerer<'m> {
    pub fn new(config: LowerConfig, maps: &'m Mappings) -> Self {
        Self { config, maps }
    }

    /// Lower a shader tree into the sink. Never fails; degradations are
    /// recorded in the returned diagnostics.
    pub fn lower(&self, tree: &ShaderTreeNode, sink: &mut dyn GraphSink) -> Diagnostics {
        let mut pass = Pass {
            config: &self.config,
            maps: self.maps,
            sink,
            diags: Diagnostics::new(),
            cx: ShadingContext::new(self.config.default_variant),
        };
        let root = self.config.root_scope.clone();
        pass.lower_node(&root, tree);
        pass.diags
    }
}

/// Per-run working set. Everything the submodules need in one place.
pub(crate) struct Pass<'a, 't> {
    pub(crate) config: &'a LowerConfig,
    pub(crate) maps: &'a Mappings,
    pub(crate) sink: &'a mut dyn GraphSink,
    pub(crate) diags: Diagnostics,
    pub(crate) cx: ShadingContext<'t>,
}

impl<'a, 't> Pass<'a, 't> {
    /// Sanitize a display name into a path segment, recording a rename when
    /// it changes.
    pub(crate) fn ident(&mut self, name: &str, at: &str) -> String {
        if needs_cleaning(name) {
            let cleaned = clean_name(name);
            self.diags.push(
                DiagKind::Renamed,
                at,
                format!("{name:?} renamed to {cleaned}"),
            );
            cleaned
        } else {
            name.to_string()
        }
    }

    fn lower_node(&mut self, path: &str, node: &'t ShaderTreeNode) {
        debug!(kind = %node.kind, name = %node.name, path, "lowering node");
        match node.kind {
            NodeKind::Root => self.lower_root(path, node),
            NodeKind::Mask => self.lower_mask(path, node),
            NodeKind::ImageLayer => self.lower_image_layer(node),
            NodeKind::NoiseLayer => self.lower_noise_layer(node),
            NodeKind::Material => self.lower_material(node),
            // consumed by their parent layer's factory
            NodeKind::TextureLocator | NodeKind::ImageSource => {}
        }
    }

    fn lower_root(&mut self, path: &str, node: &'t ShaderTreeNode) {
        self.sink.define_scope(path);
        for child in &node.children {
            self.lower_node(path, child);
        }
    }

    /// A mask is a material boundary when it carries a surface tag, a plain
    /// scope otherwise. Its subtree is visited either way; effect folding
    /// only happens at enabled boundaries, and the stack always resets.
    fn lower_mask(&mut self, path: &str, node: &'t ShaderTreeNode) {
        let enabled = node.channel_bool("enable").unwrap_or(true);
        let ptag = node.channel_text("ptag").unwrap_or("").to_string();

        let new_path = if ptag.is_empty() {
            let name = self.ident(&node.name, path);
            let p = format!("{path}/{name}");
            self.sink.define_scope(&p);
            p
        } else {
            let name = self.ident(&ptag, path);
            let p = format!("{path}/{name}");
            let material = self.sink.define_material(&p);
            self.cx.material = Some(material);
            self.cx.material_path = Some(p.clone());
            p
        };

        for child in &node.children {
            self.lower_node(&new_path, child);
        }

        if enabled {
            self.fold_effects(&new_path, node);
        } else if !self.cx.effects.is_empty() {
            debug!(path = %new_path, "mask disabled; effect stack discarded");
        }
        self.cx.effects.clear();
    }

    /// Fold every accumulated effect stack into a blend chain and wire the
    /// result into the shader.
    fn fold_effects(&mut self, mask_path: &str, mask_node: &'t ShaderTreeNode) {
        let stack = std::mem::take(&mut self.cx.effects);
        if stack.is_empty() {
            return;
        }
        let mask_name = self.ident(&mask_node.name, mask_path);

        for (effect, connectors) in stack.iter() {
            let Some(dest) = self.maps.effect_input(effect) else {
                warn!(effect, "effect has no destination input; stack dropped");
                self.diags.push(
                    DiagKind::UnmappedEffect,
                    mask_path,
                    format!("effect {effect} has no destination input; stack dropped"),
                );
                continue;
            };
            let dest = dest.to_string();
            let kind = self.maps.value_kind(&dest).unwrap_or(ValueKind::Scalar);

            let base = Operand::Literal(self.base_value(&dest, mask_path));
            let operand =
                blend::fold_stack(self.sink, &mut self.diags, mask_path, connectors, base, kind);
            wiring::connect_effect(self, &mask_name, effect, &dest, operand);
        }
    }

    /// The material channel value a blend chain starts from: destination
    /// input reverse-mapped through the active variant's channel map, read
    /// from the current material's channel block. Missing pieces degrade to
    /// a zero sentinel.
    fn base_value(&mut self, dest: &str, mask_path: &str) -> String {
        let channel = self.maps.source_channel(self.cx.variant, dest);
        let text = channel.and_then(|ch| {
            self.cx
                .material_node
                .and_then(|m| m.channel_text(ch))
        });
        match text {
            Some(t) => t.to_string(),
            None => {
                self.diags.push(
                    DiagKind::MissingChannel,
                    mask_path,
                    format!("no material channel feeds {dest}; base value 0"),
                );
                "0.0".to_string()
            }
        }
    }

    /// Image layers always materialize their subgraph; only enabled layers
    /// register a connector.
    fn lower_image_layer(&mut self, node: &'t ShaderTreeNode) {
        let Some(material_path) = self.cx.material_path.clone() else {
            self.diags.push(
                DiagKind::NoMaterialContext,
                &node.name,
                "image layer outside any material boundary",
            );
            return;
        };
        let Some(effect) = node.channel_text("effect").map(str::to_string) else {
            self.diags.push(
                DiagKind::MissingChannel,
                format!("{material_path}/{}", node.name),
                "image layer has no effect channel",
            );
            return;
        };

        let kind = self
            .maps
            .effect_input(&effect)
            .and_then(|dest| self.maps.value_kind(dest))
            .unwrap_or(ValueKind::Color3);

        let output = texture::image_layer_output(self, &material_path, node, kind);

        if node.channel_bool("enable").unwrap_or(true) {
            self.register_connector(node, &effect, output, &material_path);
        }
    }

    /// Noise layers follow the same materialize-then-register shape.
    fn lower_noise_layer(&mut self, node: &'t ShaderTreeNode) {
        let Some(material_path) = self.cx.material_path.clone() else {
            self.diags.push(
                DiagKind::NoMaterialContext,
                &node.name,
                "noise layer outside any material boundary",
            );
            return;
        };
        let Some(effect) = node.channel_text("effect").map(str::to_string) else {
            self.diags.push(
                DiagKind::MissingChannel,
                format!("{material_path}/{}", node.name),
                "noise layer has no effect channel",
            );
            return;
        };

        let output = texture::noise_output(self, &material_path, node);

        if node.channel_bool("enable").unwrap_or(true) {
            self.register_connector(node, &effect, output, &material_path);
        }
    }

    fn register_connector(
        &mut self,
        node: &'t ShaderTreeNode,
        effect: &str,
        output: crate::graph::OutputHandle,
        material_path: &str,
    ) {
        let name = self.ident(&node.name, material_path);
        let blend = node.channel_text("blend").and_then(BlendMode::parse);
        let opacity = node.channel_f64("opacity").unwrap_or(1.0);
        self.cx.effects.push(
            effect,
            Connector {
                name,
                output,
                blend,
                opacity,
            },
        );
    }

    /// Materials define the primary shader (and optionally the preview
    /// shader) inside the active material boundary.
    fn lower_material(&mut self, node: &'t ShaderTreeNode) {
        if self.cx.material.is_none() {
            // a material outside any mask has nothing to attach to
            self.diags.push(
                DiagKind::NoMaterialContext,
                &node.name,
                "material node outside any mask boundary",
            );
            return;
        }

        let variant = match node.channel_text("brdfType") {
            Some(tag) => ShadingVariant::parse(tag).unwrap_or_else(|_| {
                warn!(tag, "unknown shading variant; using default");
                self.diags.push(
                    DiagKind::UnknownVariant,
                    &node.name,
                    format!("unknown brdfType {tag:?}; using default variant"),
                );
                self.config.default_variant
            }),
            None => self.config.default_variant,
        };
        self.cx.variant = variant;
        self.cx.material_node = Some(node);

        let shader = self.create_shader(node, variant, false);
        self.cx.shader = Some(shader);

        if self.config.preview {
            let preview = self.create_shader(node, ShadingVariant::GlPreview, true);
            self.cx.preview_shader = Some(preview);
        }
    }

    /// Create one shader from the material's channel block: every mapped
    /// channel becomes a typed input, with variant overrides applied first
    /// (preview shaders map without overrides). The shader's terminal output
    /// binds to the material.
    fn create_shader(
        &mut self,
        node: &'t ShaderTreeNode,
        variant: ShadingVariant,
        preview: bool,
    ) -> NodeHandle {
        let material_path = self.cx.material_path.clone().unwrap_or_default();
        let name = self.ident(&node.name, &material_path);
        let (path, shader_id, terminal) = if preview {
            (
                format!("{material_path}/{name}_preview"),
                "UsdPreviewSurface",
                "surface".to_string(),
            )
        } else {
            (
                format!("{material_path}/{name}"),
                "ND_standard_surface_surfaceshader",
                "mtlx:surface".to_string(),
            )
        };
        debug!(path = %path, id = shader_id, "creating shader");

        let shader = self.sink.define_shader(&path, shader_id);

        for (channel, value) in &node.channels {
            if self.config.prefilter_channels
                && !self.maps.channel_allowed(NodeKind::Material, channel)
            {
                continue;
            }
            let Some(text) = value.as_text() else {
                continue;
            };
            let text = if preview {
                text.to_string()
            } else {
                overrides::apply(node, variant, channel, text, &path, &mut self.diags)
            };
            let Some(input_name) = self.maps.mapped_channel(variant, channel) else {
                continue; // unmapped channels drop silently
            };
            let Some(kind) = self.maps.value_kind(input_name) else {
                continue;
            };
            let input_name = input_name.to_string();
            match parse_literal(kind, &text) {
                Ok(lit) => {
                    let input = self.sink.create_input(shader, &input_name, kind);
                    self.sink.set_literal(input, lit);
                }
                Err(err) => {
                    self.diags
                        .push(DiagKind::MalformedValue, &path, err.to_string());
                }
            }
        }

        let shader_out = self.sink.create_output(shader, "surface", ValueKind::String);
        if let Some(material) = self.cx.material {
            let material_out = self.sink.create_output(material, &terminal, ValueKind::String);
            self.sink.connect_output(material_out, shader_out);
        }
        shader
    }
}
