//! Graphviz rendering of a built graph, for debug output.

use crate::graph::{Graph, GraphNodeKind};
use nodelint_ast::AstArena;

/// Render `graph` as a DOT digraph. Control edges are solid, data edges
/// dashed; node labels carry the tag and the referenced AST kind.
pub fn graph_to_dot(arena: &AstArena, graph: &Graph) -> String {
    let mut out = String::from("digraph g {\n");
    out.push_str("  node [shape=box, fontname=\"monospace\"];\n");

    for (id, node) in graph.nodes() {
        let mut label = format!("{id}: {}", node.kind.name());
        if let Some(ast) = node.ast {
            label.push_str(" (");
            label.push_str(arena.kind(ast).name());
            if let Some(name) = arena.identifier_name(ast) {
                label.push_str(&format!(" {name}"));
            }
            label.push(')');
        }
        out.push_str(&format!("  n{id} [label=\"{}\"];\n", label.replace('"', "\\\"")));
    }

    for (id, node) in graph.nodes() {
        for n in 0..node.next_count() {
            out.push_str(&format!("  n{id} -> n{};\n", node.next(n)));
        }
        for n in 0..node.input_count() {
            out.push_str(&format!(
                "  n{} -> n{id} [style=dashed, color=gray];\n",
                node.input(n)
            ));
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphNode;

    #[test]
    fn renders_nodes_and_both_edge_styles() {
        let mut graph = Graph::new(nodelint_ast::NodeId(0), false);
        let lit = graph.add_node(GraphNode::new(GraphNodeKind::Literal, None));
        graph.add_node_with_prev(
            GraphNode::with_input(GraphNodeKind::Return, lit, None),
            0,
        );
        let arena = AstArena::new();
        let dot = graph_to_dot(&arena, &graph);
        assert!(dot.contains("0: Start"));
        assert!(dot.contains("2: Return"));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("n0 -> n2"));
    }
}
