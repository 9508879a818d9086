//! Template sets: resolution, caching and global scope.

use crate::config::{Delims, SetOptions};
use crate::constants::{DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM, ROOT_PATH};
use crate::error::{Error, Result};
use crate::escape::{html_escape, safe_writer, SafeWriter};
use crate::ext::{join, SlashPath};
use crate::ioutils::read_from;
use crate::loader::{FileSystemLoader, Loader};
use crate::scope::{Scope, ScopeValue};
use crate::template::parser;
use crate::template::Template;
use log::debug;
use minijinja::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type TemplateCache = HashMap<String, Arc<Template>>;

pub(crate) struct SetInner {
    loader: Box<dyn Loader>,
    templates: RwLock<TemplateCache>,
    options: RwLock<SetOptions>,
    pub(crate) globals: RwLock<Scope>,
    pub(crate) escapee: SafeWriter,
}

/// A collection of templates sharing a loader, a cache, globals and options.
///
/// `Set` is a cheap handle; clones refer to the same templates and globals.
/// Every method takes `&self` and is safe to call from many threads at once.
#[derive(Clone)]
pub struct Set {
    inner: Arc<SetInner>,
}

impl Set {
    /// Creates a set reading templates through `loader` and writing dynamic
    /// values through `escapee`.
    pub fn new<L: Loader + 'static>(loader: L, escapee: SafeWriter) -> Self {
        Self {
            inner: Arc::new(SetInner {
                loader: Box::new(loader),
                templates: RwLock::new(TemplateCache::new()),
                options: RwLock::new(SetOptions::default()),
                globals: RwLock::new(Scope::new()),
                escapee,
            }),
        }
    }

    /// Creates a set that HTML-escapes dynamic values.
    pub fn html<L: Loader + 'static>(loader: L) -> Self {
        Self::new(loader, safe_writer(html_escape))
    }

    /// Creates a set reading templates from the directory `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P, escapee: SafeWriter) -> Self {
        Self::new(FileSystemLoader::new(dir), escapee)
    }

    /// Creates an HTML-escaping set reading templates from the directory `dir`.
    pub fn html_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::html(FileSystemLoader::new(dir))
    }

    /// Replaces all options at once after validating them.
    pub fn apply_options(&self, options: SetOptions) -> Result<&Self> {
        options.validate()?;
        *self.inner.options.write().unwrap_or_else(PoisonError::into_inner) = options;
        Ok(self)
    }

    pub fn with_options(self, options: SetOptions) -> Result<Self> {
        self.apply_options(options)?;
        Ok(self)
    }

    /// Snapshot of the current options.
    pub fn options(&self) -> SetOptions {
        self.inner.options.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Turns development mode on or off. In development mode the cache is
    /// bypassed and every lookup reloads and reparses.
    pub fn set_development_mode(&self, enabled: bool) -> &Self {
        self.inner.options.write().unwrap_or_else(PoisonError::into_inner).development_mode =
            enabled;
        self
    }

    /// Replaces the extension candidates tried during resolution.
    ///
    /// # Errors
    /// * `Error::ConfigValidation` if `extensions` is empty; the previous list stays in effect
    pub fn set_extensions<I, S>(&self, extensions: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions.into_iter().map(Into::into).collect();
        self.update_options(|options| options.extensions = extensions)?;
        Ok(self)
    }

    /// Sets the action delimiters used for templates parsed from now on. An
    /// empty side keeps its default.
    ///
    /// # Errors
    /// * `Error::ConfigValidation` if both delimiters end up identical
    pub fn delims(&self, left: &str, right: &str) -> Result<&Self> {
        let or_default = |delim: &str, default: &str| {
            let delim = if delim.is_empty() { default } else { delim };
            delim.to_string()
        };
        let delims = Delims {
            left: or_default(left, DEFAULT_LEFT_DELIM),
            right: or_default(right, DEFAULT_RIGHT_DELIM),
        };
        self.update_options(|options| options.delims = delims)?;
        Ok(self)
    }

    /// Applies `update` to a copy of the options and installs it only if it
    /// still validates.
    fn update_options(&self, update: impl FnOnce(&mut SetOptions)) -> Result<()> {
        let mut options = self.inner.options.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = options.clone();
        update(&mut candidate);
        candidate.validate()?;
        *options = candidate;
        Ok(())
    }

    /// Adds or replaces a global value.
    pub fn add_global<V: Into<Value>>(&self, key: &str, value: V) -> &Self {
        self.globals_mut().set(key, value);
        self
    }

    /// Adds or replaces a global function.
    pub fn add_global_func<F>(&self, key: &str, func: F) -> &Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.globals_mut().set_func(key, func);
        self
    }

    /// Adds or replaces a global writer function.
    pub fn add_global_writer(&self, key: &str, writer: SafeWriter) -> &Self {
        self.globals_mut().set_writer(key, writer);
        self
    }

    pub fn lookup_global(&self, key: &str) -> Option<ScopeValue> {
        self.inner.globals.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn globals_mut(&self) -> RwLockWriteGuard<'_, Scope> {
        self.inner.globals.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finds, and parses if needed, the template at `template_path`.
    ///
    /// The path is rooted at the set, so `x/y` and `/x/y` are the same template.
    /// Each configured extension is tried in order, first against the cache and
    /// then against the loader; the first match wins. Outside development mode
    /// the parsed template and everything it extends or imports are cached.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if no candidate exists
    /// * `Error::LoadError`, `Error::ParseError` or `Error::CyclicInheritance`
    ///   from loading the template or anything it extends or imports
    pub fn get_template(&self, template_path: &str) -> Result<Arc<Template>> {
        let options = self.options();
        let cache = CacheAccess::Exclusive(
            self.inner.templates.write().unwrap_or_else(PoisonError::into_inner),
        );
        Resolver::new(&self.inner, cache, options).resolve_sibling(template_path, ROOT_PATH, true)
    }

    /// Parses `contents` as the template `template_path` without caching it.
    ///
    /// Templates it extends or imports are resolved as usual but are not
    /// cached either.
    ///
    /// # Errors
    /// * `Error::InvalidTemplatePath` if the path has no base name
    /// * `Error::ParseError` if the source is rejected
    pub fn parse(&self, template_path: &str, contents: &str) -> Result<Arc<Template>> {
        let slashed = template_path.to_slash();
        let name = join(ROOT_PATH, &slashed);
        if matches!(slashed.base().as_str(), "." | "/") || name == ROOT_PATH {
            return Err(Error::InvalidTemplatePath { path: template_path.to_string() });
        }

        let options = self.options();
        let cache = CacheAccess::Shared(
            self.inner.templates.read().unwrap_or_else(PoisonError::into_inner),
        );
        Resolver::new(&self.inner, cache, options).compose(&name, contents, false)
    }

    /// Whether a template is cached under the canonical path `name`.
    pub fn is_cached(&self, name: &str) -> bool {
        self.inner.templates.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Drops every cached template.
    pub fn clear_cache(&self) {
        self.inner.templates.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> Arc<SetInner> {
        Arc::clone(&self.inner)
    }
}

impl std::fmt::Debug for Set {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Set").field("options", &self.options()).finish_non_exhaustive()
    }
}

/// The cache as seen by one resolution: explicit parses only read it.
enum CacheAccess<'a> {
    Shared(RwLockReadGuard<'a, TemplateCache>),
    Exclusive(RwLockWriteGuard<'a, TemplateCache>),
}

impl CacheAccess<'_> {
    fn get(&self, name: &str) -> Option<Arc<Template>> {
        match self {
            CacheAccess::Shared(cache) => cache.get(name).cloned(),
            CacheAccess::Exclusive(cache) => cache.get(name).cloned(),
        }
    }

    fn insert(&mut self, name: String, template: Arc<Template>) {
        if let CacheAccess::Exclusive(cache) = self {
            cache.insert(name, template);
        }
    }
}

/// One resolution pass, holding the cache lock for its whole duration.
struct Resolver<'a> {
    set: &'a Arc<SetInner>,
    cache: CacheAccess<'a>,
    options: SetOptions,
    /// Templates whose inheritance is being composed, outermost first.
    composing: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(set: &'a Arc<SetInner>, cache: CacheAccess<'a>, options: SetOptions) -> Self {
        Self { set, cache, options, composing: Vec::new() }
    }

    /// Resolves `template_path` against the directory of `sibling_path` unless
    /// it is already absolute.
    fn resolve_sibling(
        &mut self,
        template_path: &str,
        sibling_path: &str,
        cache_on_success: bool,
    ) -> Result<Arc<Template>> {
        let template_path = template_path.to_slash();
        let resolved = if template_path.is_rooted() {
            template_path.clean()
        } else {
            join(&sibling_path.to_slash().dir(), &template_path)
        };
        self.lookup(&resolved, cache_on_success)
    }

    fn lookup(&mut self, template_path: &str, cache_on_success: bool) -> Result<Arc<Template>> {
        if !self.options.development_mode {
            if let Some(template) = self.from_cache(template_path) {
                debug!("Template '{}' served from cache as '{}'", template_path, template.name());
                return Ok(template);
            }
        } else {
            debug!("Development mode: reloading '{}'", template_path);
        }

        let template = self.from_loader(template_path, cache_on_success)?;
        if cache_on_success && !self.options.development_mode {
            self.cache.insert(template.name().to_string(), Arc::clone(&template));
        }
        Ok(template)
    }

    fn from_cache(&self, template_path: &str) -> Option<Arc<Template>> {
        self.options
            .extensions
            .iter()
            .find_map(|extension| self.cache.get(&format!("{template_path}{extension}")))
    }

    fn from_loader(
        &mut self,
        template_path: &str,
        cache_on_success: bool,
    ) -> Result<Arc<Template>> {
        let loader = &self.set.loader;
        let canonical = self
            .options
            .extensions
            .iter()
            .map(|extension| format!("{template_path}{extension}"))
            .find(|candidate| loader.exists(candidate).is_some());

        match canonical {
            Some(canonical) => {
                debug!("Loading template '{}' as '{}'", template_path, canonical);
                self.load(&canonical, cache_on_success)
            }
            None => Err(Error::TemplateNotFound { path: template_path.to_string() }),
        }
    }

    fn load(&mut self, canonical: &str, cache_on_success: bool) -> Result<Arc<Template>> {
        let reader = self.set.loader.open(canonical)?;
        let contents = read_from(reader)
            .map_err(|source| Error::LoadError { path: canonical.to_string(), source })?;
        self.compose(canonical, &contents, cache_on_success)
    }

    /// Parses `contents` as `name` and links what it extends and imports.
    fn compose(
        &mut self,
        name: &str,
        contents: &str,
        cache_on_success: bool,
    ) -> Result<Arc<Template>> {
        if self.composing.iter().any(|composing| composing == name) {
            return Err(Error::CyclicInheritance { path: name.to_string() });
        }
        let parsed = parser::parse(name, contents, &self.options.delims)?;

        self.composing.push(name.to_string());
        let linked = self.link(name, parsed, cache_on_success);
        self.composing.pop();
        linked
    }

    fn link(
        &mut self,
        name: &str,
        parsed: parser::Parsed,
        cache_on_success: bool,
    ) -> Result<Arc<Template>> {
        let extends = parsed
            .extends
            .as_deref()
            .map(|path| self.resolve_sibling(path, name, cache_on_success))
            .transpose()?;
        let imports = parsed
            .imports
            .iter()
            .map(|path| self.resolve_sibling(path, name, cache_on_success))
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(Template::new(
            name,
            parsed.root,
            extends,
            imports,
            parsed.blocks,
            Arc::downgrade(self.set),
        )))
    }
}
