//! Output escaping functions threaded through a set to its evaluator.

use minijinja::HtmlEscape;
use std::io::{self, Write};
use std::sync::Arc;

/// A function writing a value's bytes to the output, escaping as it sees fit.
pub type SafeWriter = Arc<dyn Fn(&mut dyn Write, &[u8]) -> io::Result<()> + Send + Sync>;

/// Wraps a plain function or closure as a [`SafeWriter`].
pub fn safe_writer<F>(f: F) -> SafeWriter
where
    F: Fn(&mut dyn Write, &[u8]) -> io::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Writes `bytes` with HTML special characters escaped.
pub fn html_escape(w: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    let text = String::from_utf8_lossy(bytes);
    write!(w, "{}", HtmlEscape(&text))
}

/// Writes `bytes` unchanged.
pub fn no_escape(w: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    w.write_all(bytes)
}
