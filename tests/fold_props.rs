//! Property tests for blend-chain folding.

mod common;

use common::{constant, eval_output};
use proptest::prelude::*;
use shadetree::prelude::*;

fn supported_mode() -> impl Strategy<Value = BlendMode> {
    prop_oneof![
        Just(BlendMode::Normal),
        Just(BlendMode::Add),
        Just(BlendMode::Subtract),
        Just(BlendMode::Multiply),
        Just(BlendMode::Divide),
        Just(BlendMode::Screen),
        Just(BlendMode::Overlay),
        Just(BlendMode::Difference),
    ]
}

type Layer = (BlendMode, f64, f64);

fn layer_stack() -> impl Strategy<Value = Vec<Layer>> {
    prop::collection::vec((supported_mode(), 0.1..0.9f64, 0.2..2.0f64), 2..=5)
}

/// Build a graph with one constant source per layer, fold the stack onto a
/// literal base, and return the graph plus the folded accumulator.
fn fold_layers(layers: &[Layer], base: f64) -> (MemoryGraph, Operand) {
    let mut g = MemoryGraph::new();
    let mut diags = Diagnostics::new();
    let connectors: Vec<Connector> = layers
        .iter()
        .enumerate()
        .map(|(i, &(mode, opacity, value))| Connector {
            name: format!("layer{i}"),
            output: constant(&mut g, &format!("/m/layer{i}_src"), value),
            blend: Some(mode),
            opacity,
        })
        .collect();
    let folded = fold_stack(
        &mut g,
        &mut diags,
        "/m",
        &connectors,
        Operand::Literal(format!("{base}")),
        ValueKind::Scalar,
    );
    assert!(diags.is_empty(), "supported modes must fold cleanly");
    (g, folded)
}

/// Path of the node feeding a connector's accumulator input, or the literal
/// if the chain bottoms out there.
fn acc_source(g: &MemoryGraph, index: usize) -> String {
    let node = g
        .node_by_path(&format!("/m/layer{index}_blend"))
        .expect("blend node exists");
    let input = if g.find_input(node, "in2").is_some() {
        "in2"
    } else {
        "bg"
    };
    match g.input_source(node, input) {
        Some(src) => g.node(g.output(src).node).path.clone(),
        None => format!("{:?}", g.input_literal(node, input)),
    }
}

/// Fold semantics on scalars, mirroring the emitted chains: single-stage
/// modes interpolate the accumulator toward the layer value, two-stage modes
/// interpolate toward the math result.
fn reference_fold(layers: &[Layer], base: f64) -> f64 {
    let mut acc = base;
    for &(mode, opacity, value) in layers {
        let fg = match mode {
            BlendMode::Multiply => value * acc,
            BlendMode::Divide => value / acc,
            _ => value,
        };
        acc = fg * opacity + acc * (1.0 - opacity);
    }
    acc
}

proptest! {
    /// Each connector's chain takes the previous connector's result as its
    /// background, in registration order.
    #[test]
    fn prop_fold_preserves_stack_order(layers in layer_stack()) {
        let signature: Vec<(BlendMode, f64)> =
            layers.iter().map(|&(m, o, _)| (m, o)).collect();
        let reversed_sig: Vec<(BlendMode, f64)> =
            signature.iter().rev().copied().collect();
        prop_assume!(signature != reversed_sig);

        let (fwd, _) = fold_layers(&layers, 0.5);
        let mut rev_layers = layers.clone();
        rev_layers.reverse();
        let (rev, _) = fold_layers(&rev_layers, 0.5);

        // first connector folds straight onto the base literal
        prop_assert!(fwd.node_by_path("/m/layer0_blend").is_some());
        prop_assert!(acc_source(&fwd, 0).contains("Float"));

        let fwd_chain: Vec<String> = (0..layers.len()).map(|i| acc_source(&fwd, i)).collect();
        let rev_chain: Vec<String> = (0..layers.len()).map(|i| acc_source(&rev, i)).collect();
        prop_assert_ne!(fwd_chain, rev_chain);
    }

    /// The emitted chain computes exactly the documented fold.
    #[test]
    fn prop_folded_chain_evaluates_to_reference(layers in layer_stack()) {
        let (g, folded) = fold_layers(&layers, 0.5);
        let out = match folded {
            Operand::Output(out) => out,
            Operand::Literal(_) => panic!("non-empty stack must yield an output"),
        };
        let got = eval_output(&g, out);
        let want = reference_fold(&layers, 0.5);
        let tol = 1e-9 * want.abs().max(1.0);
        prop_assert!((got - want).abs() <= tol, "got {got}, want {want}");
    }

    /// Swapping two layers with distinct values changes the folded value by
    /// exactly the product of the opacities times the value difference.
    #[test]
    fn prop_pair_swap_shifts_result(
        v1 in 0.0..1.0f64,
        v2 in 0.0..1.0f64,
        m1 in 0.1..0.9f64,
        m2 in 0.1..0.9f64,
    ) {
        prop_assume!((v1 - v2).abs() > 1e-3);
        let a = (BlendMode::Normal, m1, v1);
        let b = (BlendMode::Normal, m2, v2);

        let (g_ab, f_ab) = fold_layers(&[a, b], 0.5);
        let (g_ba, f_ba) = fold_layers(&[b, a], 0.5);
        let ab = eval_output(&g_ab, f_ab.output().unwrap());
        let ba = eval_output(&g_ba, f_ba.output().unwrap());

        let shift = m1 * m2 * (v2 - v1);
        prop_assert!((ab - ba - shift).abs() < 1e-9);
        prop_assert!((ab - ba).abs() > 1e-6);
    }
}
