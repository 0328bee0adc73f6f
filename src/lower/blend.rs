//! Effect stacking and blend-chain folding.
//!
//! Layers register a [`Connector`] per effect as the traversal passes them;
//! at each material boundary the stack is folded bottom-up into a chain of
//! blend operator nodes. Two-stage modes (multiply, divide) synthesize a
//! binary math node followed by a mix node; everything else is a single
//! fg/bg/mix operator. Unsupported modes leave the accumulator unchanged.

use smallvec::SmallVec;

use crate::diag::{DiagKind, Diagnostics};
use crate::graph::{GraphSink, InputHandle, Literal, Operand, OutputHandle, ValueKind};
use crate::map::parse_literal;

/// Layer blend mode. Closed set matching the source application's tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Normal,
    Add,
    Subtract,
    Multiply,
    Divide,
    Screen,
    ColorBurn,
    ColorDodge,
    Difference,
    Overlay,
    // known but without an operator counterpart in the target vocabulary
    Darken,
    HardLight,
    Lighten,
    NormalMult,
    SoftLight,
}

impl BlendMode {
    /// Parse a blend-channel token. Unknown tokens are `None` and fold as
    /// unsupported.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "normal" => Some(Self::Normal),
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            "multiply" => Some(Self::Multiply),
            "divide" => Some(Self::Divide),
            "screen" => Some(Self::Screen),
            "colorburn" => Some(Self::ColorBurn),
            "colordodge" => Some(Self::ColorDodge),
            "difference" => Some(Self::Difference),
            "overlay" => Some(Self::Overlay),
            "darken" => Some(Self::Darken),
            "hardlight" => Some(Self::HardLight),
            "lighten" => Some(Self::Lighten),
            "normalmult" => Some(Self::NormalMult),
            "softlight" => Some(Self::SoftLight),
            _ => None,
        }
    }

    /// Operator node-id stem, without the value-kind suffix. `None` for
    /// modes the target vocabulary has no counterpart for.
    pub fn operator_id(self) -> Option<&'static str> {
        match self {
            Self::Multiply => Some("ND_multiply"),
            Self::Divide => Some("ND_divide"),
            Self::Normal => Some("ND_mix"),
            Self::Add => Some("ND_plus"),
            Self::Subtract => Some("ND_minus"),
            Self::Screen => Some("ND_screen"),
            Self::ColorBurn => Some("ND_burn"),
            Self::ColorDodge => Some("ND_dodge"),
            Self::Difference => Some("ND_difference"),
            Self::Overlay => Some("ND_overlay"),
            Self::Darken
            | Self::HardLight
            | Self::Lighten
            | Self::NormalMult
            | Self::SoftLight => None,
        }
    }

    /// Whether the mode folds as a math node plus a mix node.
    pub fn two_stage(self) -> bool {
        matches!(self, Self::Multiply | Self::Divide)
    }
}

/// One layer's contribution to an effect stack.
#[derive(Clone, Debug)]
pub struct Connector {
    /// Sanitized layer name; blend node paths derive from it.
    pub name: String,
    pub output: OutputHandle,
    /// `None` when the blend channel carried an unknown token.
    pub blend: Option<BlendMode>,
    pub opacity: f64,
}

/// Per-effect connector stacks, in first-registration order.
#[derive(Clone, Debug, Default)]
pub struct EffectStack {
    entries: Vec<(String, SmallVec<[Connector; 4]>)>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connector under its effect, creating the stack on first use.
    pub fn push(&mut self, effect: &str, connector: Connector) {
        if let Some((_, stack)) = self.entries.iter_mut().find(|(e, _)| e == effect) {
            stack.push(connector);
        } else {
            let mut stack = SmallVec::new();
            stack.push(connector);
            self.entries.push((effect.to_string(), stack));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Connector])> {
        self.entries.iter().map(|(e, s)| (e.as_str(), s.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Connectors registered under one effect.
    pub fn get(&self, effect: &str) -> Option<&[Connector]> {
        self.entries
            .iter()
            .find(|(e, _)| e == effect)
            .map(|(_, s)| s.as_slice())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Assign an operand to an input: literals parse into the input's kind,
/// outputs connect. Non-parseable text leaves the input unset.
pub(crate) fn set_operand(
    sink: &mut dyn GraphSink,
    diags: &mut Diagnostics,
    path: &str,
    input: InputHandle,
    operand: &Operand,
    kind: ValueKind,
) {
    match operand {
        Operand::Output(out) => sink.connect(input, *out),
        Operand::Literal(text) => match parse_literal(kind, text) {
            Ok(lit) => sink.set_literal(input, lit),
            Err(err) => diags.push(DiagKind::MalformedValue, path, err.to_string()),
        },
    }
}

/// Fold a whole connector stack onto a base operand, bottom-up. The fold is
/// order-preserving: each connector's chain takes the previous accumulator
/// as its background.
pub fn fold_stack(
    sink: &mut dyn GraphSink,
    diags: &mut Diagnostics,
    path: &str,
    connectors: &[Connector],
    base: Operand,
    kind: ValueKind,
) -> Operand {
    let mut acc = base;
    for connector in connectors {
        acc = apply_blend(sink, diags, path, connector, acc, kind);
    }
    acc
}

/// Fold one connector onto the accumulator, synthesizing its blend node(s)
/// under `path`. Returns the new accumulator.
pub(crate) fn apply_blend(
    sink: &mut dyn GraphSink,
    diags: &mut Diagnostics,
    path: &str,
    connector: &Connector,
    acc: Operand,
    kind: ValueKind,
) -> Operand {
    let Some(op) = connector.blend.and_then(BlendMode::operator_id) else {
        let msg = match connector.blend {
            Some(mode) => format!("{mode:?} has no operator; layer left out of the chain"),
            None => "unknown blend token; layer left out of the chain".to_string(),
        };
        diags.push(
            DiagKind::UnsupportedBlend,
            format!("{path}/{}", connector.name),
            msg,
        );
        return acc;
    };
    let suffix = kind.family_suffix().unwrap_or("_float");
    let base = format!("{path}/{}", connector.name);

    if connector.blend.is_some_and(BlendMode::two_stage) {
        // math stage: connector value combined with the accumulator
        let math = sink.define_shader(&format!("{base}_blend"), &format!("{op}{suffix}"));
        let in1 = sink.create_input(math, "in1", kind);
        sink.connect(in1, connector.output);
        let in2 = sink.create_input(math, "in2", kind);
        set_operand(sink, diags, &base, in2, &acc, kind);
        let math_out = sink.create_output(math, "out", kind);

        // mix stage: opacity blends the intermediate against the accumulator
        let mix = sink.define_shader(&format!("{base}_amount"), &format!("ND_mix{suffix}"));
        let fg = sink.create_input(mix, "fg", kind);
        sink.connect(fg, math_out);
        let bg = sink.create_input(mix, "bg", kind);
        set_operand(sink, diags, &base, bg, &acc, kind);
        let mix_in = sink.create_input(mix, "mix", ValueKind::Scalar);
        sink.set_literal(mix_in, Literal::Float(connector.opacity));
        Operand::Output(sink.create_output(mix, "out", kind))
    } else {
        let node = sink.define_shader(&format!("{base}_blend"), &format!("{op}{suffix}"));
        let fg = sink.create_input(node, "fg", kind);
        sink.connect(fg, connector.output);
        let bg = sink.create_input(node, "bg", kind);
        set_operand(sink, diags, &base, bg, &acc, kind);
        let mix_in = sink.create_input(node, "mix", ValueKind::Scalar);
        sink.set_literal(mix_in, Literal::Float(connector.opacity));
        Operand::Output(sink.create_output(node, "out", kind))
    }
}
