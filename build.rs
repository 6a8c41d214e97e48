use std::process::Command;

/// `git describe` of the working tree, e.g. `a1b2c3d-dirty`.
fn describe_tree() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=7"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}

fn main() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let app_version = match describe_tree() {
        Some(tree) => format!("{version}+{tree}"),
        None => version,
    };
    println!("cargo:rustc-env=APP_VERSION={app_version}");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
