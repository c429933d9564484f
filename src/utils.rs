//! # Utility Functions Module
//!
//! Helpers that keep argument building for the external tools readable.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// A value that can be passed as a single command-line argument.
///
/// Paths stay as `OsString` so file names that are not valid UTF-8
/// reach the tool untouched.
pub trait IntoArg {
    fn into_arg(self) -> OsString;
}

impl IntoArg for &str {
    fn into_arg(self) -> OsString {
        OsString::from(self)
    }
}

impl IntoArg for String {
    fn into_arg(self) -> OsString {
        OsString::from(self)
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> OsString {
        OsString::from(self)
    }
}

impl IntoArg for &OsStr {
    fn into_arg(self) -> OsString {
        self.to_os_string()
    }
}

impl IntoArg for OsString {
    fn into_arg(self) -> OsString {
        self
    }
}

impl IntoArg for &Path {
    fn into_arg(self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl IntoArg for &PathBuf {
    fn into_arg(self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl IntoArg for PathBuf {
    fn into_arg(self) -> OsString {
        self.into_os_string()
    }
}

impl IntoArg for u32 {
    fn into_arg(self) -> OsString {
        OsString::from(self.to_string())
    }
}

impl IntoArg for usize {
    fn into_arg(self) -> OsString {
        OsString::from(self.to_string())
    }
}

/// Builds a `Vec<OsString>` argument list from mixed strings, paths and numbers.
///
/// # Example
/// ```rust
/// use media_toolkit::args;
/// use std::path::Path;
///
/// let input = Path::new("Movie.mkv");
/// let args = args!["-i", input, "-map", format!("0:a:{}", 1)];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        ::std::vec![$($crate::utils::IntoArg::into_arg($item)),*]
    };
}

/// Render a command line for log output.
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        let arg = arg.to_string_lossy();
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}
