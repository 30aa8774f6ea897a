use std::process::Command;

// Exposes GIT_VERSION to the crate: `1.2.3-N-gHASH[-dirty]` from the nearest
// `v*` tag, `0.0.0-gHASH` without tags, or the package version outside git.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let version = describe().unwrap_or_else(|| match std::env::var("CARGO_PKG_VERSION") {
        Ok(v) if !v.is_empty() => v,
        _ => "unknown".to_string(),
    });
    println!("cargo:rustc-env=GIT_VERSION={version}");
}

fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--long", "--dirty", "--tags", "--match", "v[0-9]*"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let described = String::from_utf8(output.stdout).ok()?;
    match described.trim() {
        "" => None,
        tagged if tagged.starts_with('v') => Some(tagged[1..].to_string()),
        hash => Some(format!("0.0.0-g{hash}")),
    }
}
