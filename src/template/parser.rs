//! Turns template source into a node tree plus its inheritance declarations.

use crate::config::Delims;
use crate::constants::{COMMENT_CLOSE, COMMENT_OPEN};
use crate::error::{Error, Result};
use crate::template::expr::Expr;
use crate::template::node::{ActionNode, BlockNode, BlockTable, ListNode, Node, YieldNode};
use std::sync::Arc;

/// Everything the parser extracts from one template source.
#[derive(Debug, Default)]
pub struct Parsed {
    pub root: ListNode,
    /// Path named by `extends`, as written.
    pub extends: Option<String>,
    /// Paths named by `import`, in declaration order.
    pub imports: Vec<String>,
    /// Blocks declared anywhere in this source.
    pub blocks: BlockTable,
}

struct Frame {
    name: Option<String>,
    nodes: Vec<Node>,
    line: usize,
}

struct Parser<'a> {
    name: &'a str,
    source: &'a str,
    delims: &'a Delims,
    frames: Vec<Frame>,
    parsed: Parsed,
}

/// Parses `source`, reporting errors against the template `name`.
pub fn parse(name: &str, source: &str, delims: &Delims) -> Result<Parsed> {
    let mut parser = Parser {
        name,
        source,
        delims,
        frames: vec![Frame { name: None, nodes: Vec::new(), line: 1 }],
        parsed: Parsed::default(),
    };
    parser.run()?;
    parser.finish()
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<()> {
        let source = self.source;
        let mut pos = 0;
        while pos < source.len() {
            let rest = &source[pos..];
            let action = rest.find(self.delims.left.as_str());
            let comment = rest.find(COMMENT_OPEN);
            let (offset, is_comment) = match (action, comment) {
                (None, None) => {
                    self.push_text(rest);
                    break;
                }
                (Some(a), Some(c)) if c < a => (c, true),
                (Some(a), _) => (a, false),
                (None, Some(c)) => (c, true),
            };
            self.push_text(&rest[..offset]);
            let start = pos + offset;
            let line = self.line_at(start);

            if is_comment {
                let body = start + COMMENT_OPEN.len();
                let close = source[body..]
                    .find(COMMENT_CLOSE)
                    .ok_or_else(|| self.error(line, "unclosed comment"))?;
                pos = body + close + COMMENT_CLOSE.len();
            } else {
                let inner_start = start + self.delims.left.len();
                let close = source[inner_start..]
                    .find(self.delims.right.as_str())
                    .ok_or_else(|| self.error(line, "unclosed action"))?;
                let inner = source[inner_start..inner_start + close].trim();
                self.directive(inner, line)?;
                pos = inner_start + close + self.delims.right.len();
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Parsed> {
        while let Some(frame) = self.frames.pop() {
            match frame.name {
                Some(name) => {
                    return Err(self.error(frame.line, &format!("unclosed block '{name}'")))
                }
                None => self.parsed.root = ListNode { nodes: frame.nodes },
            }
        }
        Ok(self.parsed)
    }

    fn directive(&mut self, inner: &str, line: usize) -> Result<()> {
        let (keyword, rest) = inner.split_once(char::is_whitespace).unwrap_or((inner, ""));
        let rest = rest.trim();
        match keyword {
            "extends" => {
                let path = self.quoted(rest, line)?;
                self.prologue("extends", line)?;
                if self.parsed.extends.is_some() {
                    return Err(self.error(line, "a template can extend only one template"));
                }
                if !self.parsed.imports.is_empty() {
                    return Err(self.error(line, "extends must precede imports"));
                }
                self.parsed.extends = Some(path);
            }
            "import" => {
                let path = self.quoted(rest, line)?;
                self.prologue("import", line)?;
                self.parsed.imports.push(path);
            }
            "block" => {
                let name = self.block_name(rest, line)?;
                self.frames.push(Frame { name: Some(name), nodes: Vec::new(), line });
            }
            "yield" => {
                let name = self.block_name(rest, line)?;
                self.current().push(Node::Yield(YieldNode { name, line }));
            }
            "end" if rest.is_empty() => self.end_block(line)?,
            _ => self.action(inner, line)?,
        }
        Ok(())
    }

    /// `extends` and `import` may only open a template; whitespace seen so far
    /// is discarded.
    fn prologue(&mut self, keyword: &str, line: usize) -> Result<()> {
        if self.frames.len() > 1 {
            return Err(self.error(line, &format!("{keyword} is not allowed inside a block")));
        }
        let root = self.current();
        let only_whitespace = root
            .iter()
            .all(|node| matches!(node, Node::Text(text) if text.trim().is_empty()));
        if !only_whitespace {
            return Err(self.error(line, &format!("{keyword} must come before any content")));
        }
        self.current().clear();
        Ok(())
    }

    fn end_block(&mut self, line: usize) -> Result<()> {
        if self.frames.len() == 1 {
            return Err(self.error(line, "unexpected end"));
        }
        let Some(Frame { name: Some(name), nodes, line }) = self.frames.pop() else {
            return Err(self.error(line, "unexpected end"));
        };
        if self.parsed.blocks.contains_key(&name) {
            return Err(self.error(line, &format!("block '{name}' is declared twice")));
        }
        let block = Arc::new(BlockNode { name: name.clone(), body: ListNode { nodes }, line });
        self.parsed.blocks.insert(name, Arc::clone(&block));
        self.current().push(Node::Block(block));
        Ok(())
    }

    fn action(&mut self, expr: &str, line: usize) -> Result<()> {
        if expr.is_empty() {
            return Err(self.error(line, "empty action"));
        }
        let compiled = Expr::compile(expr).map_err(|err| self.error(line, &err.to_string()))?;
        let pipe = split_pipe(expr).and_then(|(head, name)| {
            Expr::compile(head).ok().map(|head| (head, name.to_string()))
        });
        self.current().push(Node::Action(ActionNode { expr: compiled, pipe, line }));
        Ok(())
    }

    fn block_name(&self, rest: &str, line: usize) -> Result<String> {
        let name = rest.strip_suffix("()").unwrap_or(rest).trim();
        if is_identifier(name) {
            Ok(name.to_string())
        } else {
            Err(self.error(line, &format!("invalid block name '{rest}'")))
        }
    }

    fn quoted(&self, rest: &str, line: usize) -> Result<String> {
        let unquoted = match rest.chars().next() {
            Some('`') => rest
                .strip_prefix('`')
                .and_then(|r| r.strip_suffix('`'))
                .filter(|r| !r.contains('`'))
                .map(str::to_string),
            Some('"') => unescape_double_quoted(rest),
            _ => None,
        };
        match unquoted {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(self.error(line, &format!("expected a quoted template path, found '{rest}'"))),
        }
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.current().push(Node::Text(text.to_string()));
        }
    }

    fn current(&mut self) -> &mut Vec<Node> {
        let frame = self.frames.len() - 1;
        &mut self.frames[frame].nodes
    }

    fn line_at(&self, offset: usize) -> usize {
        self.source[..offset].matches('\n').count() + 1
    }

    fn error(&self, line: usize, message: &str) -> Error {
        Error::ParseError { path: self.name.to_string(), line, message: message.to_string() }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reads a complete double-quoted literal, honouring `\"` and `\\`.
fn unescape_double_quoted(literal: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = literal.strip_prefix('"')?.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return chars.as_str().is_empty().then_some(out),
            other => out.push(other),
        }
    }
    None
}

/// Splits `head | name` at the last top-level pipe when `name` is a bare
/// identifier. Pipes inside quotes or brackets are ignored.
fn split_pipe(expr: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut last = None;
    let mut escaped = false;
    for (idx, c) in expr.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => last = Some(idx),
            _ => {}
        }
    }
    let idx = last?;
    let head = expr[..idx].trim();
    let name = expr[idx + 1..].trim();
    (!head.is_empty() && is_identifier(name)).then_some((head, name))
}
