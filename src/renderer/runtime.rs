use crate::constants::{builtins, CONTEXT_NAME, MAX_POOLED_RUNTIMES};
use crate::escape::{no_escape, safe_writer, SafeWriter};
use crate::renderer::translator::{msg_function, trans_function, Translator};
use crate::scope::{Scope, ScopeValue};
use crate::set::SetInner;
use crate::template::node::{BlockNode, BlockTable};
use log::trace;
use minijinja::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

/// Bindings of a single execution: the effective blocks and the flattened
/// variable scope. The output sink and the owning set reach the evaluator
/// separately; the translator is captured by the `msg` and `trans` bindings.
#[derive(Default)]
pub(crate) struct Runtime {
    pub(crate) blocks: Option<Arc<BlockTable>>,
    pub(crate) scope: BTreeMap<String, Value>,
    pub(crate) writers: HashMap<String, SafeWriter>,
}

impl Runtime {
    /// Binds an execution. Later layers shadow earlier ones: built-ins, set
    /// globals, execution variables, then the root data value.
    pub(crate) fn install(
        &mut self,
        blocks: Arc<BlockTable>,
        translator: Option<Arc<dyn Translator>>,
        set: &SetInner,
        variables: &Scope,
        data: Option<Value>,
    ) {
        self.scope.insert(builtins::MSG.to_string(), msg_function(translator.clone()));
        self.scope.insert(builtins::TRANS.to_string(), trans_function(translator));
        self.writers.insert(builtins::RAW.to_string(), safe_writer(no_escape));

        {
            let globals = set.globals.read().unwrap_or_else(PoisonError::into_inner);
            self.bind(&globals);
        }
        self.bind(variables);

        if let Some(data) = data {
            self.scope.insert(CONTEXT_NAME.to_string(), data);
        }
        self.blocks = Some(blocks);
    }

    fn bind(&mut self, scope: &Scope) {
        for (name, value) in scope.iter() {
            match value {
                ScopeValue::Writer(writer) => {
                    self.scope.remove(name);
                    self.writers.insert(name.to_string(), Arc::clone(writer));
                }
                other => {
                    self.writers.remove(name);
                    if let Some(value) = other.to_expression_value() {
                        self.scope.insert(name.to_string(), value);
                    }
                }
            }
        }
    }

    pub(crate) fn block(&self, name: &str) -> Option<&Arc<BlockNode>> {
        self.blocks.as_ref().and_then(|blocks| blocks.get(name))
    }

    fn reset(&mut self) {
        self.blocks = None;
        self.scope.clear();
        self.writers.clear();
    }

    pub(crate) fn is_reset(&self) -> bool {
        self.blocks.is_none() && self.scope.is_empty() && self.writers.is_empty()
    }
}

/// Idle runtime states waiting for reuse. Only reset states are stored.
pub(crate) struct RuntimePool {
    idle: Mutex<Vec<Runtime>>,
}

static RUNTIME_POOL: RuntimePool = RuntimePool::new();

impl RuntimePool {
    const fn new() -> Self {
        Self { idle: Mutex::new(Vec::new()) }
    }

    fn acquire(&'static self) -> PooledRuntime {
        let state = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        trace!("Runtime acquired ({})", if state.is_some() { "reused" } else { "new" });
        PooledRuntime { pool: self, state: state.unwrap_or_default() }
    }

    fn release(&self, mut state: Runtime) {
        state.reset();
        debug_assert!(state.is_reset());
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_POOLED_RUNTIMES {
            idle.push(state);
        }
        trace!("Runtime released, {} idle", idle.len());
    }
}

/// Takes a runtime state from the shared pool.
pub(crate) fn acquire() -> PooledRuntime {
    RUNTIME_POOL.acquire()
}

/// A runtime state on loan from the pool; returned exactly once, on drop.
pub(crate) struct PooledRuntime {
    pool: &'static RuntimePool,
    state: Runtime,
}

impl Deref for PooledRuntime {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        &self.state
    }
}

impl DerefMut for PooledRuntime {
    fn deref_mut(&mut self) -> &mut Runtime {
        &mut self.state
    }
}

impl Drop for PooledRuntime {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemoryLoader;
    use crate::Set;

    fn installed(set: &Set, variables: &Scope) -> PooledRuntime {
        let mut state = acquire();
        let blocks = Arc::new(BlockTable::new());
        state.install(blocks, None, &set.inner(), variables, Some(Value::from(1)));
        state
    }

    #[test]
    fn test_released_state_is_reset() {
        let set = Set::html(InMemoryLoader::new());
        let mut vars = Scope::new();
        vars.set("name", "x");

        let pool = RuntimePool::new();
        let mut state = Runtime::default();
        let blocks = Arc::new(BlockTable::new());
        state.install(blocks, None, &set.inner(), &vars, Some(Value::from(1)));
        assert!(!state.is_reset());
        pool.release(state);

        let reused = pool.idle.lock().unwrap().pop().unwrap();
        assert!(reused.is_reset());
    }

    #[test]
    fn test_layers_shadow_in_order() {
        let set = Set::html(InMemoryLoader::new());
        set.add_global("title", "global").add_global("shared", "global");
        set.add_global_writer("shout", safe_writer(no_escape));
        let mut vars = Scope::new();
        vars.set("title", "local").set("shout", "now a value");

        let state = installed(&set, &vars);
        assert_eq!(state.scope["title"], Value::from("local"));
        assert_eq!(state.scope["shared"], Value::from("global"));
        assert_eq!(state.scope["shout"], Value::from("now a value"));
        assert!(!state.writers.contains_key("shout"));
        assert!(state.writers.contains_key(builtins::RAW));
        assert!(state.scope.contains_key(builtins::MSG));
        assert_eq!(state.scope[CONTEXT_NAME], Value::from(1));
    }

    #[test]
    fn test_writer_variable_hides_global_value() {
        let set = Set::html(InMemoryLoader::new());
        set.add_global("fmt", 1);
        let mut vars = Scope::new();
        vars.set_writer("fmt", safe_writer(no_escape));

        let state = installed(&set, &vars);
        assert!(!state.scope.contains_key("fmt"));
        assert!(state.writers.contains_key("fmt"));
    }
}
