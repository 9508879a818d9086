use jetset::{Scope, Set, Template, Value};
use std::fs;
use std::path::Path;

/// Writes each `(relative path, content)` pair below `root`, creating
/// directories as needed.
pub fn write_templates(root: &Path, templates: &[(&str, &str)]) {
    for (path, content) in templates {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

/// Executes `template` and returns the output as a string.
pub fn render(template: &Template, variables: &Scope, data: Option<Value>) -> String {
    let mut out = Vec::new();
    template.execute(&mut out, variables, data).unwrap();
    String::from_utf8(out).unwrap()
}

/// Resolves `path` in `set` and renders it without variables or data.
#[allow(dead_code)]
pub fn render_path(set: &Set, path: &str) -> String {
    let template = set.get_template(path).unwrap();
    render(&template, &Scope::new(), None)
}
