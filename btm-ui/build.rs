//! Stamps btm-ui with its build identity
//!
//! Exposes `BTM_GIT_HASH`, `BTM_BUILD_TIMESTAMP` and `BTM_BUILD_PROFILE` to
//! the crate. `SOURCE_DATE_EPOCH` pins the timestamp for reproducible builds.

use chrono::{DateTime, SecondsFormat, Utc};
use std::process::Command;

/// Trimmed stdout of a successful git invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn revision() -> String {
    let Some(hash) = git(&["rev-parse", "--short=8", "HEAD"]) else {
        return "unknown".to_string();
    };
    match git(&["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{}-dirty", hash),
        _ => hash,
    }
}

fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn main() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=BTM_GIT_HASH={}", revision());
    println!(
        "cargo:rustc-env=BTM_BUILD_TIMESTAMP={}",
        build_time().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    println!("cargo:rustc-env=BTM_BUILD_PROFILE={}", profile);
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    // Without rerun-if-changed on sources Cargo reruns this on every build,
    // which keeps the hash and timestamp current.
}
