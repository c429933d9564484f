//! Stand-in executables for the wrappers' unit tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script named `name` into `dir`.
///
/// Every invocation records its arguments, one per line, in `<name>.args`.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let args_file = dir.join(format!("{}.args", name));
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n{}\n",
        args_file.display(),
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments recorded by the last run of a fake tool
pub fn recorded_args(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(format!("{}.args", name)))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Script body that prints `json` on stdout and exits 0
pub fn print_json(json: &str) -> String {
    format!("cat <<'JSON_EOF'\n{}\nJSON_EOF", json)
}
