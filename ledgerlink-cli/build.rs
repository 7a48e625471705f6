use std::path::{Path, PathBuf};
use std::process::Command;

/// `git describe` of the workspace, e.g. `3f9c2ab` or `3f9c2ab-dirty`.
fn describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=7", "--exclude=*"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8(out.stdout).ok()?;
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.to_string())
}

fn main() {
    let workspace = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .and_then(|dir| dir.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(".."));

    // Re-stamp when the checked-out commit moves
    for git_file in ["HEAD", "index"] {
        let path = workspace.join(".git").join(git_file);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }

    let build = describe(&workspace).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=LEDGERLINK_BUILD_SHA={build}");
}
