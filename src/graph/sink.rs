//! Graph sink capability trait.

use super::{InputHandle, Literal, NodeHandle, OutputHandle, ValueKind};

/// The capability set the lowering pass requires from an output graph.
///
/// Paths compose hierarchically: scopes, materials and shaders act as
/// namespaces for child node paths. The pass only ever appends; it never
/// mutates or removes previously created nodes. Implementations are assumed
/// single-writer; the trait is not required to be thread-safe.
///
/// All `define_*` calls are idempotent per path (a second definition of the
/// same path returns the original handle), and `create_input`/`create_output`
/// are idempotent per `(node, name)`, mirroring the define semantics of the
/// scene-description APIs this abstracts over.
pub trait GraphSink {
    /// Define a plain grouping scope.
    fn define_scope(&mut self, path: &str) -> NodeHandle;

    /// Define a material (a scope that can carry terminal outputs).
    fn define_material(&mut self, path: &str) -> NodeHandle;

    /// Define a shader node with the given shading-model/operator identifier.
    fn define_shader(&mut self, path: &str, shading_model_id: &str) -> NodeHandle;

    /// Create (or fetch) a typed input on a node.
    fn create_input(&mut self, node: NodeHandle, name: &str, kind: ValueKind) -> InputHandle;

    /// Create (or fetch) a typed output on a node.
    fn create_output(&mut self, node: NodeHandle, name: &str, kind: ValueKind) -> OutputHandle;

    /// Assign a literal value to an input.
    fn set_literal(&mut self, input: InputHandle, value: Literal);

    /// Connect an input to a prior node's output.
    fn connect(&mut self, input: InputHandle, output: OutputHandle);

    /// Bind an interface output (a material terminal or a node-graph `out`)
    /// to the inner output that produces its value.
    fn connect_output(&mut self, output: OutputHandle, source: OutputHandle);
}
