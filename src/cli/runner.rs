use crate::{
    cli::Args,
    config::SetOptions,
    error::Result,
    escape::{html_escape, no_escape, safe_writer},
    ioutils::read_input,
    scope::Scope,
    set::Set,
};
use anyhow::Context;
use log::{debug, info};
use minijinja::Value;
use std::io::{self, Write};

/// Builds the template set described by `args`.
pub fn build_set(args: &Args) -> Result<Set> {
    let escapee = if args.no_escape { safe_writer(no_escape) } else { safe_writer(html_escape) };
    let set = Set::from_dir(&args.root, escapee);

    if let Some(config) = &args.config {
        set.apply_options(SetOptions::load(config)?)?;
    }
    if !args.extensions.is_empty() {
        set.set_extensions(args.extensions.iter().cloned())?;
    }
    if args.dev {
        set.set_development_mode(true);
    }
    debug!("Template set rooted at '{}' with {:?}", args.root.display(), set.options());
    Ok(set)
}

fn parse_data(arg: &str) -> Result<Value> {
    let raw = read_input(arg)?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).context("--data must be a valid JSON document")?;
    Ok(Value::from_serialize(&json))
}

/// Renders `args.template` into `out`.
pub fn render(args: &Args, out: &mut dyn Write) -> Result<()> {
    let set = build_set(args)?;
    let data = args.data.as_deref().map(parse_data).transpose()?;

    let mut variables = Scope::new();
    for (key, value) in &args.vars {
        variables.set(key, value.as_str());
    }

    let template = set.get_template(&args.template)?;
    info!("Rendering '{}'", template.name());
    template.execute(out, &variables, data)?;
    out.flush()?;
    Ok(())
}

/// Renders `args.template` to stdout.
pub fn run(args: Args) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&args, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(root: &TempDir, extra: &[&str]) -> Args {
        let mut argv = vec!["jetset", "page", "--root", root.path().to_str().unwrap()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_render_with_data_and_vars() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("page.jet"), "{{ title }}: {{ context.name }}").unwrap();

        let args = args_for(&root, &["--data", "{\"name\": \"<Ann>\"}", "--var", "title=Hi"]);
        let mut out = Vec::new();
        render(&args, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hi: &lt;Ann&gt;");
    }

    #[test]
    fn test_no_escape_flag() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("page.jet"), "{{ title }}").unwrap();

        let args = args_for(&root, &["--var", "title=<b>", "--no-escape"]);
        let mut out = Vec::new();
        render(&args, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<b>");
    }

    #[test]
    fn test_config_and_extension_flags() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("page.tpl"), "tpl").unwrap();
        fs::write(root.path().join("page.jet"), "jet").unwrap();
        let config = root.path().join("jetset.yaml");
        fs::write(&config, "development_mode: true\n").unwrap();

        let args = args_for(&root, &["--config", config.to_str().unwrap(), "--ext", ".tpl"]);
        let set = build_set(&args).unwrap();
        assert!(set.options().development_mode);
        assert_eq!(set.options().extensions, vec![".tpl".to_string()]);

        let mut out = Vec::new();
        render(&args, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "tpl");
    }

    #[test]
    fn test_invalid_data_is_reported() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("page.jet"), "x").unwrap();

        let args = args_for(&root, &["--data", "{not json"]);
        let err = render(&args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("--data must be a valid JSON document"));
    }
}
