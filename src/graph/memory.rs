//! In-memory shading graph.
//!
//! Reference implementation of [`GraphSink`] with a query surface for tests
//! and the CLI. Append-only: handles stay valid for the graph's lifetime.

use std::collections::HashMap;
use std::fmt::Write as _;

use super::{GraphSink, InputHandle, Literal, NodeHandle, OutputHandle, ValueKind};

/// What a node is in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Scope,
    Material,
    Shader,
}

/// One node of the in-memory graph.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub path: String,
    pub role: NodeRole,
    /// Shading-model or operator identifier ("ND_mix_float", ...).
    pub id: Option<String>,
    pub inputs: Vec<InputHandle>,
    pub outputs: Vec<OutputHandle>,
}

impl GraphNode {
    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// One typed input.
#[derive(Clone, Debug)]
pub struct GraphInput {
    pub node: NodeHandle,
    pub name: String,
    pub kind: ValueKind,
    pub literal: Option<Literal>,
    pub source: Option<OutputHandle>,
}

/// One typed output.
#[derive(Clone, Debug)]
pub struct GraphOutput {
    pub node: NodeHandle,
    pub name: String,
    pub kind: ValueKind,
    /// Inner output this interface output forwards, if bound.
    pub source: Option<OutputHandle>,
}

/// Append-only in-memory shading graph.
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: Vec<GraphNode>,
    inputs: Vec<GraphInput>,
    outputs: Vec<GraphOutput>,
    by_path: HashMap<String, NodeHandle>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn define(&mut self, path: &str, role: NodeRole, id: Option<&str>) -> NodeHandle {
        if let Some(&h) = self.by_path.get(path) {
            // Re-definition may upgrade a scope created as a namespace and
            // attach an id, but never downgrades an existing node.
            if let Some(id) = id {
                let node = &mut self.nodes[h.0 as usize];
                if node.id.is_none() {
                    node.id = Some(id.to_string());
                }
            }
            return h;
        }
        let h = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(GraphNode {
            path: path.to_string(),
            role,
            id: id.map(str::to_string),
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        self.by_path.insert(path.to_string(), h);
        h
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    pub fn node(&self, handle: NodeHandle) -> &GraphNode {
        &self.nodes[handle.0 as usize]
    }

    pub fn input(&self, handle: InputHandle) -> &GraphInput {
        &self.inputs[handle.0 as usize]
    }

    pub fn output(&self, handle: OutputHandle) -> &GraphOutput {
        &self.outputs[handle.0 as usize]
    }

    /// Look a node up by full path.
    pub fn node_by_path(&self, path: &str) -> Option<NodeHandle> {
        self.by_path.get(path).copied()
    }

    /// Find an input on a node by name.
    pub fn find_input(&self, node: NodeHandle, name: &str) -> Option<InputHandle> {
        self.nodes[node.0 as usize]
            .inputs
            .iter()
            .copied()
            .find(|&i| self.inputs[i.0 as usize].name == name)
    }

    /// Find an output on a node by name.
    pub fn find_output(&self, node: NodeHandle, name: &str) -> Option<OutputHandle> {
        self.nodes[node.0 as usize]
            .outputs
            .iter()
            .copied()
            .find(|&o| self.outputs[o.0 as usize].name == name)
    }

    /// Literal assigned to a node input, if any.
    pub fn input_literal(&self, node: NodeHandle, name: &str) -> Option<&Literal> {
        self.find_input(node, name)
            .and_then(|i| self.inputs[i.0 as usize].literal.as_ref())
    }

    /// Connection source of a node input, if any.
    pub fn input_source(&self, node: NodeHandle, name: &str) -> Option<OutputHandle> {
        self.find_input(node, name)
            .and_then(|i| self.inputs[i.0 as usize].source)
    }

    /// Bound source of an interface output, if any.
    pub fn output_source(&self, node: NodeHandle, name: &str) -> Option<OutputHandle> {
        self.find_output(node, name)
            .and_then(|o| self.outputs[o.0 as usize].source)
    }

    /// Follow interface-output bindings down to the producing output.
    pub fn resolve_output(&self, mut output: OutputHandle) -> OutputHandle {
        while let Some(src) = self.outputs[output.0 as usize].source {
            output = src;
        }
        output
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &GraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeHandle(i as u32), n))
    }

    /// All nodes carrying the given identifier.
    pub fn nodes_with_id(&self, id: &str) -> Vec<NodeHandle> {
        self.nodes()
            .filter(|(_, n)| n.id.as_deref() == Some(id))
            .map(|(h, _)| h)
            .collect()
    }

    /// Count nodes whose identifier starts with the given prefix.
    pub fn count_id_prefix(&self, prefix: &str) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.id.as_deref().is_some_and(|id| id.starts_with(prefix)))
            .count()
    }

    /// Human-readable listing of the whole graph, in definition order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            let role = match node.role {
                NodeRole::Scope => "scope",
                NodeRole::Material => "material",
                NodeRole::Shader => "shader",
            };
            let _ = write!(out, "{role} {}", node.path);
            if let Some(id) = &node.id {
                let _ = write!(out, " <{id}>");
            }
            out.push('\n');
            for &i in &node.inputs {
                let input = &self.inputs[i.0 as usize];
                let _ = write!(out, "  in  {} ({})", input.name, input.kind);
                if let Some(lit) = &input.literal {
                    let _ = write!(out, " = {lit}");
                }
                if let Some(src) = input.source {
                    let o = &self.outputs[src.0 as usize];
                    let src_node = &self.nodes[o.node.0 as usize];
                    let _ = write!(out, " <- {}.{}", src_node.path, o.name);
                }
                out.push('\n');
            }
            for &o in &node.outputs {
                let output = &self.outputs[o.0 as usize];
                let _ = write!(out, "  out {} ({})", output.name, output.kind);
                if let Some(src) = output.source {
                    let s = &self.outputs[src.0 as usize];
                    let src_node = &self.nodes[s.node.0 as usize];
                    let _ = write!(out, " <- {}.{}", src_node.path, s.name);
                }
                out.push('\n');
            }
        }
        out
    }
}

impl GraphSink for MemoryGraph {
    fn define_scope(&mut self, path: &str) -> NodeHandle {
        self.define(path, NodeRole::Scope, None)
    }

    fn define_material(&mut self, path: &str) -> NodeHandle {
        self.define(path, NodeRole::Material, None)
    }

    fn define_shader(&mut self, path: &str, shading_model_id: &str) -> NodeHandle {
        self.define(path, NodeRole::Shader, Some(shading_model_id))
    }

    fn create_input(&mut self, node: NodeHandle, name: &str, kind: ValueKind) -> InputHandle {
        if let Some(existing) = self.find_input(node, name) {
            return existing;
        }
        let h = InputHandle(self.inputs.len() as u32);
        self.inputs.push(GraphInput {
            node,
            name: name.to_string(),
            kind,
            literal: None,
            source: None,
        });
        self.nodes[node.0 as usize].inputs.push(h);
        h
    }

    fn create_output(&mut self, node: NodeHandle, name: &str, kind: ValueKind) -> OutputHandle {
        if let Some(existing) = self.find_output(node, name) {
            return existing;
        }
        let h = OutputHandle(self.outputs.len() as u32);
        self.outputs.push(GraphOutput {
            node,
            name: name.to_string(),
            kind,
            source: None,
        });
        self.nodes[node.0 as usize].outputs.push(h);
        h
    }

    fn set_literal(&mut self, input: InputHandle, value: Literal) {
        self.inputs[input.0 as usize].literal = Some(value);
    }

    fn connect(&mut self, input: InputHandle, output: OutputHandle) {
        self.inputs[input.0 as usize].source = Some(output);
    }

    fn connect_output(&mut self, output: OutputHandle, source: OutputHandle) {
        self.outputs[output.0 as usize].source = Some(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_define_idempotent() {
        let mut g = MemoryGraph::new();
        let a = g.define_material("/tree/mat");
        let b = g.define_material("/tree/mat");
        assert_eq!(a, b);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_inputs_and_connections() {
        let mut g = MemoryGraph::new();
        let tex = g.define_shader("/tree/mat/tex", "ND_image_color3");
        let out = g.create_output(tex, "out", ValueKind::Color3);
        let shader = g.define_shader("/tree/mat/shader", "ND_standard_surface_surfaceshader");
        let input = g.create_input(shader, "base_color", ValueKind::Color3);
        g.connect(input, out);

        assert_eq!(g.input_source(shader, "base_color"), Some(out));
        assert!(g.input_literal(shader, "base_color").is_none());

        // create_input is idempotent per (node, name)
        let again = g.create_input(shader, "base_color", ValueKind::Color3);
        assert_eq!(again, input);
    }

    #[test]
    fn test_literal_and_dump() {
        let mut g = MemoryGraph::new();
        let shader = g.define_shader("/m/s", "ND_standard_surface_surfaceshader");
        let input = g.create_input(shader, "base_color", ValueKind::Color3);
        g.set_literal(input, Literal::Color3(DVec3::new(0.8, 0.2, 0.1)));

        let dump = g.dump();
        assert!(dump.contains("shader /m/s <ND_standard_surface_surfaceshader>"));
        assert!(dump.contains("base_color"));
        assert!(dump.contains("0.8"));
    }

    #[test]
    fn test_scope_upgrade_keeps_handle() {
        let mut g = MemoryGraph::new();
        let scope = g.define_scope("/tree/group");
        let again = g.define_shader("/tree/group", "ND_mix_float");
        assert_eq!(scope, again);
        assert_eq!(g.node(scope).id.as_deref(), Some("ND_mix_float"));
    }
}
