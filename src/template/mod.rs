//! Parsed templates and their execution
//!
//! - `expr`: Action expressions, compiled once per parse
//! - `node`: The node tree a template is parsed into
//! - `parser`: Turns source text into nodes and inheritance declarations

pub mod expr;
pub mod node;
pub mod parser;

use crate::error::{Error, Result};
use crate::renderer::evaluator::Evaluator;
use crate::renderer::runtime;
use crate::renderer::Translator;
use crate::scope::Scope;
use crate::set::SetInner;
use log::{debug, warn};
use minijinja::Value;
use node::{BlockTable, ListNode};
use std::any::Any;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// A parsed template, identified by its canonical path.
///
/// Templates are immutable once built and may be shared between any number of
/// concurrent executions.
pub struct Template {
    name: String,
    root: ListNode,
    extends: Option<Arc<Template>>,
    imports: Vec<Arc<Template>>,
    processed_blocks: Arc<BlockTable>,
    set: Weak<SetInner>,
}

impl Template {
    /// Builds a template and flattens its block table: the extends-ancestor's
    /// blocks first, then each import in order, then the template's own blocks.
    /// A later layer replaces an earlier block of the same name.
    pub(crate) fn new(
        name: &str,
        root: ListNode,
        extends: Option<Arc<Template>>,
        imports: Vec<Arc<Template>>,
        own_blocks: BlockTable,
        set: Weak<SetInner>,
    ) -> Self {
        let mut processed = BlockTable::new();
        let inherited = extends.iter().chain(imports.iter());
        for layer in inherited.map(|t| t.processed_blocks.as_ref()).chain([&own_blocks]) {
            for (block_name, block) in layer {
                processed.insert(block_name.clone(), Arc::clone(block));
            }
        }
        debug!(
            "Composed template '{}' with {} block(s) from {} import(s){}",
            name,
            processed.len(),
            imports.len(),
            if extends.is_some() { " and a parent" } else { "" }
        );
        Self {
            name: name.to_string(),
            root,
            extends,
            imports,
            processed_blocks: Arc::new(processed),
            set,
        }
    }

    /// Canonical, extension-qualified path of this template.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &ListNode {
        &self.root
    }

    pub fn extends(&self) -> Option<&Arc<Template>> {
        self.extends.as_ref()
    }

    pub fn imports(&self) -> &[Arc<Template>] {
        &self.imports
    }

    /// The flattened block table in effect when this template is executed.
    pub fn blocks(&self) -> &BlockTable {
        &self.processed_blocks
    }

    /// Executes the template into `w` without a translator.
    ///
    /// # Arguments
    /// * `w` - Output sink
    /// * `variables` - Execution variables, shadowing set globals
    /// * `data` - Root data value, visible to expressions as `context`
    pub fn execute(&self, w: &mut dyn Write, variables: &Scope, data: Option<Value>) -> Result<()> {
        self.execute_i18n(None, w, variables, data)
    }

    /// Executes the template into `w` with an optional translator.
    ///
    /// Evaluation always starts at the rootmost ancestor of the extends chain,
    /// with this template's block table in effect. Any error or panic raised
    /// while evaluating is returned as [`Error::ExecutionFault`]; output
    /// written before the fault stays written.
    pub fn execute_i18n(
        &self,
        translator: Option<Arc<dyn Translator>>,
        w: &mut dyn Write,
        variables: &Scope,
        data: Option<Value>,
    ) -> Result<()> {
        let set = self
            .set
            .upgrade()
            .ok_or_else(|| Error::DetachedTemplate { path: self.name.clone() })?;

        let mut state = runtime::acquire();
        state.install(
            Arc::clone(&self.processed_blocks),
            translator,
            &set,
            variables,
            data,
        );

        let mut root = self;
        while let Some(parent) = &root.extends {
            root = parent;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            Evaluator::new(&state, &set, w).execute_list(&root.root)
        }));

        let result = match outcome {
            Ok(result) => result.map_err(|err| err.into_execution_fault(&self.name)),
            Err(payload) => Err(Error::ExecutionFault {
                template: self.name.clone(),
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(err) = &result {
            warn!("Recovered from execution fault: {}", err);
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "evaluation panicked".to_string()
    }
}

impl fmt::Display for Template {
    /// Best-effort reconstruction: directives first, then the body. Whitespace
    /// and comments of the original source are not preserved.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.extends {
            write!(f, "{{{{extends {:?}}}}}", parent.name)?;
        }
        for (idx, import) in self.imports.iter().enumerate() {
            if self.extends.is_none() && idx == 0 {
                write!(f, "{{{{import {:?}}}}}", import.name)?;
            } else {
                write!(f, "\n{{{{import {:?}}}}}", import.name)?;
            }
        }
        if self.extends.is_some() || !self.imports.is_empty() {
            if !self.root.is_empty() {
                write!(f, "\n{}", self.root)?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.root)
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("extends", &self.extends.as_ref().map(|t| t.name.as_str()))
            .field("imports", &self.imports.iter().map(|t| t.name.as_str()).collect::<Vec<_>>())
            .field("blocks", &self.processed_blocks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemoryLoader;
    use crate::Set;
    use std::sync::Arc;

    fn render(template: &Template) -> String {
        let mut out = Vec::new();
        template.execute(&mut out, &Scope::new(), None).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_display_plain_body() {
        let set = Set::html(InMemoryLoader::new());
        let template = set.parse("/page", "Hi {{ name }}").unwrap();
        assert_eq!(template.to_string(), "Hi {{ name }}");
    }

    #[test]
    fn test_display_directives_then_body() {
        let loader = Arc::new(InMemoryLoader::new());
        loader.set("/base.jet", "{{block body()}}{{end}}");
        loader.set("/macros.jet", "{{block m()}}{{end}}");
        loader.set("/more.jet", "");
        let set = Set::html(Arc::clone(&loader));

        let source = concat!(
            "{{extends \"base\"}}{{import \"macros\"}}{{import \"more\"}}",
            "{{block body()}}x{{end}}"
        );
        let child = set.parse("/child", source).unwrap();
        assert_eq!(
            child.to_string(),
            concat!(
                "{{extends \"/base.jet\"}}\n{{import \"/macros.jet\"}}\n",
                "{{import \"/more.jet\"}}\n{{block body()}}x{{end}}"
            )
        );

        let imports_only = set.parse("/only", "{{import \"macros\"}}").unwrap();
        assert_eq!(imports_only.to_string(), "{{import \"/macros.jet\"}}");
    }

    #[test]
    fn test_own_blocks_override_imports_which_override_parent() {
        let loader = Arc::new(InMemoryLoader::new());
        loader.set(
            "/base",
            "[{{block a()}}base-a{{end}}|{{block b()}}base-b{{end}}|{{block c()}}base-c{{end}}]",
        );
        loader.set("/mixin", "{{block b()}}mixin-b{{end}}{{block c()}}mixin-c{{end}}");
        let set = Set::html(Arc::clone(&loader));

        let child = set
            .parse("/child", "{{extends \"base\"}}{{import \"mixin\"}}{{block c()}}child-c{{end}}")
            .unwrap();
        // an import shadows the parent's block of the same name
        assert_eq!(render(&child), "[base-a|mixin-b|child-c]");
        assert_eq!(child.blocks().len(), 3);
    }

    #[test]
    fn test_detached_template() {
        let template = {
            let set = Set::html(InMemoryLoader::new());
            set.parse("/orphan", "x").unwrap()
        };
        let mut out = Vec::new();
        let err = template.execute(&mut out, &Scope::new(), None).unwrap_err();
        assert!(matches!(err, Error::DetachedTemplate { .. }));
    }
}
