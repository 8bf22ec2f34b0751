//! The graph itself: nodes with data and control edge lists.

use crate::block::BasicBlock;
use nodelint_ast::NodeId;
use smallvec::SmallVec;

/// Index of a node inside its graph. Node 0 is always `Start`; a zero
/// input edge therefore never appears in a well-formed graph, which lets
/// zero double as "no value" during construction.
pub type GraphNodeId = u16;

/// The closed set of graph node tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphNodeKind {
    Start,
    End,
    Return,
    Try,
    PrepareException,
    Throw,
    CatchException,
    Undefined,
    Literal,
    ObjectLiteral,
    ObjectProperty,
    ArrayLiteral,
    TemplateLiteral,
    This,
    Super,
    Call,
    NewCall,
    Await,
    BinaryOperator,
    UnaryOperator,
    LoadValue,
    StoreValue,
    LoadProperty,
    LoadNamedProperty,
    StoreProperty,
    StoreNamedProperty,
    Spread,
    Function,
    If,
    IfTrue,
    IfFalse,
    Merge,
    Phi,
    TypeCast,
    Switch,
    Case,
    Break,
    Continue,
    Loop,
    ForOfLoop,
    Argument,
}

impl GraphNodeKind {
    pub const fn name(self) -> &'static str {
        use GraphNodeKind::*;
        match self {
            Start => "Start",
            End => "End",
            Return => "Return",
            Try => "Try",
            PrepareException => "PrepareException",
            Throw => "Throw",
            CatchException => "CatchException",
            Undefined => "Undefined",
            Literal => "Literal",
            ObjectLiteral => "ObjectLiteral",
            ObjectProperty => "ObjectProperty",
            ArrayLiteral => "ArrayLiteral",
            TemplateLiteral => "TemplateLiteral",
            This => "This",
            Super => "Super",
            Call => "Call",
            NewCall => "NewCall",
            Await => "Await",
            BinaryOperator => "BinaryOperator",
            UnaryOperator => "UnaryOperator",
            LoadValue => "LoadValue",
            StoreValue => "StoreValue",
            LoadProperty => "LoadProperty",
            LoadNamedProperty => "LoadNamedProperty",
            StoreProperty => "StoreProperty",
            StoreNamedProperty => "StoreNamedProperty",
            Spread => "Spread",
            Function => "Function",
            If => "If",
            IfTrue => "IfTrue",
            IfFalse => "IfFalse",
            Merge => "Merge",
            Phi => "Phi",
            TypeCast => "TypeCast",
            Switch => "Switch",
            Case => "Case",
            Break => "Break",
            Continue => "Continue",
            Loop => "Loop",
            ForOfLoop => "ForOfLoop",
            Argument => "Argument",
        }
    }
}

/// One graph node: a tag, data inputs, control predecessors/successors, and
/// an optional back-reference into the AST arena.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub kind: GraphNodeKind,
    inputs: SmallVec<[GraphNodeId; 2]>,
    prevs: SmallVec<[GraphNodeId; 1]>,
    nexts: SmallVec<[GraphNodeId; 1]>,
    pub ast: Option<NodeId>,
}

impl GraphNode {
    pub fn new(kind: GraphNodeKind, ast: Option<NodeId>) -> Self {
        GraphNode {
            kind,
            inputs: SmallVec::new(),
            prevs: SmallVec::new(),
            nexts: SmallVec::new(),
            ast,
        }
    }

    pub fn with_input(kind: GraphNodeKind, input: GraphNodeId, ast: Option<NodeId>) -> Self {
        let mut node = GraphNode::new(kind, ast);
        node.inputs.push(input);
        node
    }

    pub fn with_inputs(
        kind: GraphNodeKind,
        inputs: impl IntoIterator<Item = GraphNodeId>,
        ast: Option<NodeId>,
    ) -> Self {
        let mut node = GraphNode::new(kind, ast);
        node.inputs.extend(inputs);
        node
    }

    #[inline]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn prev_count(&self) -> usize {
        self.prevs.len()
    }

    #[inline]
    pub fn next_count(&self) -> usize {
        self.nexts.len()
    }

    #[inline]
    pub fn input(&self, n: usize) -> GraphNodeId {
        self.inputs[n]
    }

    #[inline]
    pub fn prev(&self, n: usize) -> GraphNodeId {
        self.prevs[n]
    }

    #[inline]
    pub fn next(&self, n: usize) -> GraphNodeId {
        self.nexts[n]
    }

    pub fn inputs(&self) -> &[GraphNodeId] {
        &self.inputs
    }

    pub fn prevs(&self) -> &[GraphNodeId] {
        &self.prevs
    }

    pub fn nexts(&self) -> &[GraphNodeId] {
        &self.nexts
    }

    pub fn add_input(&mut self, n: GraphNodeId) {
        self.inputs.push(n);
    }

    pub fn add_prev(&mut self, n: GraphNodeId) {
        self.prevs.push(n);
    }

    pub fn add_next(&mut self, n: GraphNodeId) {
        self.nexts.push(n);
    }

    pub fn set_next(&mut self, idx: usize, new_value: GraphNodeId) {
        self.nexts[idx] = new_value;
    }

    pub fn replace_prev(&mut self, old_value: GraphNodeId, new_value: GraphNodeId) {
        for prev in &mut self.prevs {
            if *prev == old_value {
                *prev = new_value;
                return;
            }
        }
    }
}

/// A per-function graph: the node vector (node 0 is `Start`) plus the basic
/// blocks used during construction.
#[derive(Debug)]
pub struct Graph {
    /// The AST function this graph was built from.
    pub fun: NodeId,
    /// Whether that function is `async` (affects return typing).
    pub is_async: bool,
    nodes: Vec<GraphNode>,
    blocks: Vec<BasicBlock>,
}

impl Graph {
    pub fn new(fun: NodeId, is_async: bool) -> Self {
        let mut graph = Graph {
            fun,
            is_async,
            nodes: vec![GraphNode::new(GraphNodeKind::Start, None)],
            blocks: Vec::new(),
        };
        graph.blocks.push(BasicBlock::new(Vec::new()));
        graph.blocks[0].sealed = true;
        graph
    }

    #[inline]
    pub fn len(&self) -> GraphNodeId {
        self.nodes.len() as GraphNodeId
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, n: GraphNodeId) -> &GraphNode {
        &self.nodes[n as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, n: GraphNodeId) -> &mut GraphNode {
        &mut self.nodes[n as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (GraphNodeId, &GraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i as GraphNodeId, n))
    }

    pub fn add_node(&mut self, node: GraphNode) -> GraphNodeId {
        let new_index = self.nodes.len() as GraphNodeId;
        assert!(self.nodes.len() < u16::MAX as usize, "graph node overflow");
        self.nodes.push(node);
        new_index
    }

    pub fn add_node_with_prev(&mut self, mut node: GraphNode, prev: GraphNodeId) -> GraphNodeId {
        let new_index = self.nodes.len() as GraphNodeId;
        assert!(self.nodes.len() < u16::MAX as usize, "graph node overflow");
        node.add_prev(prev);
        self.nodes.push(node);
        self.nodes[prev as usize].add_next(new_index);
        new_index
    }

    pub fn add_node_with_prevs(&mut self, mut node: GraphNode, prevs: &[GraphNodeId]) -> GraphNodeId {
        let new_index = self.nodes.len() as GraphNodeId;
        assert!(self.nodes.len() < u16::MAX as usize, "graph node overflow");
        for &prev in prevs {
            node.add_prev(prev);
            self.nodes[prev as usize].add_next(new_index);
        }
        self.nodes.push(node);
        new_index
    }

    #[inline]
    pub fn block_count(&self) -> u16 {
        self.blocks.len() as u16
    }

    #[inline]
    pub fn block(&self, n: u16) -> &BasicBlock {
        &self.blocks[n as usize]
    }

    #[inline]
    pub fn block_mut(&mut self, n: u16) -> &mut BasicBlock {
        &mut self.blocks[n as usize]
    }

    pub fn add_basic_block(&mut self, prevs: Vec<u16>) -> u16 {
        let new_index = self.blocks.len() as u16;
        self.blocks.push(BasicBlock::new(prevs));
        new_index
    }

    /// The `End` node, if the function has any exit control flow.
    pub fn end_node(&self) -> Option<GraphNodeId> {
        let last = self.len() - 1;
        (self.node(last).kind == GraphNodeKind::End).then_some(last)
    }
}
