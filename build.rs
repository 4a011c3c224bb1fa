use std::{env, process::Command};

fn main() {
    let build_timestamp = chrono::Utc::now().format("%Y%m%d.%H%M%S").to_string();
    emit("BUILD_TIMESTAMP", &build_timestamp);

    let git_hash = git_hash().unwrap_or_else(|| "unknown".to_string());
    emit("GIT_HASH_SHORT", git_hash.get(..7).unwrap_or(&git_hash));
    emit("GIT_HASH", &git_hash);

    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".to_string());
    emit("TARGET_PLATFORM", &format!("{target_arch}-{target_os}"));

    emit("BUILD_PROFILE", &env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()));

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}

fn emit(name: &str, value: &str) {
    println!("cargo:rustc-env={name}={value}");
}

fn git_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}
