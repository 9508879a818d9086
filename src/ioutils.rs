use std::io::{self, Read};

use crate::constants::STDIN_INDICATOR;

/// Reads everything from `reader` as UTF-8 text.
pub fn read_from(mut reader: impl Read) -> io::Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(buf)
}

/// Returns `arg` itself, or the whole of stdin when `arg` is `-`.
pub fn read_input(arg: &str) -> io::Result<String> {
    if arg == STDIN_INDICATOR {
        read_from(io::stdin().lock())
    } else {
        Ok(arg.to_string())
    }
}
