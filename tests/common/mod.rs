//! Shared test helpers: a scalar mini-evaluator over the in-memory graph.
//!
//! The evaluator follows the documented blend semantics: two-stage math
//! nodes apply their arithmetic to `in1`/`in2`, and every fg/bg/mix operator
//! interpolates its background toward its foreground by the mix factor.

use shadetree::graph::{Literal, MemoryGraph, NodeHandle, OutputHandle};

/// Evaluate a scalar chain rooted at `output`.
pub fn eval_output(g: &MemoryGraph, output: OutputHandle) -> f64 {
    let resolved = g.resolve_output(output);
    eval_node(g, g.output(resolved).node)
}

fn eval_input(g: &MemoryGraph, node: NodeHandle, name: &str) -> f64 {
    if let Some(src) = g.input_source(node, name) {
        return eval_output(g, src);
    }
    match g.input_literal(node, name) {
        Some(Literal::Float(v)) => *v,
        Some(other) => panic!("non-scalar literal on {name}: {other}"),
        None => panic!("input {name} has neither literal nor source"),
    }
}

fn eval_node(g: &MemoryGraph, node: NodeHandle) -> f64 {
    let id = g.node(node).id.as_deref().unwrap_or("");
    if id.starts_with("ND_constant") {
        eval_input(g, node, "value")
    } else if id.starts_with("ND_multiply") && g.find_input(node, "in1").is_some() {
        eval_input(g, node, "in1") * eval_input(g, node, "in2")
    } else if id.starts_with("ND_divide") {
        eval_input(g, node, "in1") / eval_input(g, node, "in2")
    } else if g.find_input(node, "mix").is_some() {
        // fg/bg/mix operator: bg interpolated toward fg
        let fg = eval_input(g, node, "fg");
        let bg = eval_input(g, node, "bg");
        let mix = eval_input(g, node, "mix");
        fg * mix + bg * (1.0 - mix)
    } else {
        panic!("cannot evaluate node id {id:?}");
    }
}

/// A constant scalar source node, for feeding known values into chains.
pub fn constant(g: &mut MemoryGraph, path: &str, value: f64) -> OutputHandle {
    use shadetree::graph::{GraphSink, ValueKind};
    let node = g.define_shader(path, "ND_constant_float");
    let input = g.create_input(node, "value", ValueKind::Scalar);
    g.set_literal(input, Literal::Float(value));
    g.create_output(node, "out", ValueKind::Scalar)
}
