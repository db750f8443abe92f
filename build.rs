use std::process::Command;

fn main() {
    // Release tooling may pin ONE_WORKFLOW_VERSION; local builds use the manifest version.
    let version = std::env::var("ONE_WORKFLOW_VERSION")
        .unwrap_or_else(|_| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());
    println!("cargo:rustc-env=ONE_WORKFLOW_VERSION={version}");

    let commit = std::env::var("ONE_WORKFLOW_COMMIT").unwrap_or_else(|_| {
        match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim().to_string(),
            _ => "unknown".to_string(),
        }
    });
    println!("cargo:rustc-env=ONE_WORKFLOW_COMMIT={commit}");

    println!("cargo:rerun-if-env-changed=ONE_WORKFLOW_VERSION");
    println!("cargo:rerun-if-env-changed=ONE_WORKFLOW_COMMIT");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
