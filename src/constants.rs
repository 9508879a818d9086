//! Constants used throughout jetset

/// Extension candidates tried, in order, when resolving a logical template path.
/// The empty entry covers paths that already carry their extension.
pub const DEFAULT_EXTENSIONS: &[&str] = &["", ".jet", ".html.jet", ".jet.html"];

/// Default left action delimiter
pub const DEFAULT_LEFT_DELIM: &str = "{{";

/// Default right action delimiter
pub const DEFAULT_RIGHT_DELIM: &str = "}}";

/// Comment markers, independent of the configured delimiters
pub const COMMENT_OPEN: &str = "{*";
pub const COMMENT_CLOSE: &str = "*}";

/// Root of every template set; logical paths are resolved against it
pub const ROOT_PATH: &str = "/";

/// Name under which the root data value is visible to expressions
pub const CONTEXT_NAME: &str = "context";

/// Nesting limit for block and yield rendering
pub const MAX_RENDER_DEPTH: usize = 256;

/// Upper bound on idle runtime states kept for reuse
pub const MAX_POOLED_RUNTIMES: usize = 64;

/// STDIN indicator for CLI arguments
pub const STDIN_INDICATOR: &str = "-";

/// Built-in names installed into every execution scope
pub mod builtins {
    pub const MSG: &str = "msg";
    pub const TRANS: &str = "trans";
    pub const RAW: &str = "raw";
}

/// Exit codes
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
