//! Node tree produced by the parser and walked by the evaluator.

use crate::template::expr::Expr;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named overridable sections, keyed by block name.
pub type BlockTable = HashMap<String, Arc<BlockNode>>;

/// An ordered sequence of nodes; the root of every template is one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListNode {
    pub nodes: Vec<Node>,
}

impl ListNode {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output.
    Text(String),
    /// An expression whose value is written to the output.
    Action(ActionNode),
    /// Declares a block and renders its effective override in place.
    Block(Arc<BlockNode>),
    /// Renders a block from the effective block table.
    Yield(YieldNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionNode {
    /// The full expression.
    pub expr: Expr,
    /// `(head, name)` when the last top-level pipe segment is a bare name that
    /// may refer to a writer function.
    pub pipe: Option<(Expr, String)>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub name: String,
    pub body: ListNode,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldNode {
    pub name: String,
    pub line: usize,
}

impl fmt::Display for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|node| write!(f, "{node}"))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(text),
            Node::Action(action) => write!(f, "{{{{ {} }}}}", action.expr),
            Node::Block(block) => {
                write!(f, "{{{{block {}()}}}}{}{{{{end}}}}", block.name, block.body)
            }
            Node::Yield(node) => write!(f, "{{{{yield {}()}}}}", node.name),
        }
    }
}
