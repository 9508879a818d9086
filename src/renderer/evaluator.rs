use crate::constants::MAX_RENDER_DEPTH;
use crate::error::{Error, Result};
use crate::escape::SafeWriter;
use crate::renderer::runtime::Runtime;
use crate::set::SetInner;
use crate::template::expr::Expr;
use crate::template::node::{ActionNode, BlockNode, ListNode, Node};
use minijinja::Value;
use std::io::Write;

/// Renders node trees against an installed [`Runtime`].
pub(crate) struct Evaluator<'a> {
    state: &'a Runtime,
    set: &'a SetInner,
    out: &'a mut dyn Write,
    ctx: Value,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(state: &'a Runtime, set: &'a SetInner, out: &'a mut dyn Write) -> Self {
        let ctx = Value::from(state.scope.clone());
        Self { state, set, out, ctx, depth: 0 }
    }

    pub(crate) fn execute_list(&mut self, list: &ListNode) -> Result<()> {
        for node in &list.nodes {
            match node {
                Node::Text(text) => self.out.write_all(text.as_bytes())?,
                Node::Action(action) => self.execute_action(action)?,
                Node::Block(block) => {
                    let state = self.state;
                    let effective = state.block(&block.name).unwrap_or(block);
                    self.execute_block(effective)?;
                }
                Node::Yield(node) => {
                    let state = self.state;
                    let block = state
                        .block(&node.name)
                        .ok_or_else(|| Error::UnresolvedBlock { name: node.name.clone() })?;
                    self.execute_block(block)?;
                }
            }
        }
        Ok(())
    }

    fn execute_block(&mut self, block: &BlockNode) -> Result<()> {
        if self.depth >= MAX_RENDER_DEPTH {
            return Err(anyhow::anyhow!(
                "block '{}' exceeds the maximum nesting depth of {}",
                block.name,
                MAX_RENDER_DEPTH
            )
            .into());
        }
        self.depth += 1;
        let result = self.execute_list(&block.body);
        self.depth -= 1;
        result
    }

    fn execute_action(&mut self, action: &ActionNode) -> Result<()> {
        if let Some((head, name)) = &action.pipe {
            let state = self.state;
            if let Some(writer) = state.writers.get(name) {
                let value = self.eval(head)?;
                return self.write_value(&value, Some(writer));
            }
        }
        let value = self.eval(&action.expr)?;
        self.write_value(&value, None)
    }

    fn eval(&self, expr: &Expr) -> Result<Value> {
        let value = expr.eval(&self.ctx)?;
        if value.is_undefined() {
            return Err(anyhow::anyhow!("'{}' is undefined", expr).into());
        }
        Ok(value)
    }

    fn write_value(&mut self, value: &Value, writer: Option<&SafeWriter>) -> Result<()> {
        if value.is_none() {
            return Ok(());
        }
        let text = value.to_string();
        match writer {
            Some(writer) => writer(&mut *self.out, text.as_bytes())?,
            None if value.is_safe() => self.out.write_all(text.as_bytes())?,
            None => (self.set.escapee)(&mut *self.out, text.as_bytes())?,
        }
        Ok(())
    }
}
