//! Build information captured by `build.rs` at compile time.

/// `<version> (<build timestamp>)`, shown by `-V`.
pub const DISPLAY_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_TIMESTAMP"), ")");

/// Multi-line block shown by `--version`.
pub const DETAILED_INFO: &str = concat!(
    "Version: ", env!("CARGO_PKG_VERSION"), "\n",
    "Build: ", env!("BUILD_TIMESTAMP"), "\n",
    "Commit: ", env!("GIT_HASH_SHORT"), "\n",
    "Platform: ", env!("TARGET_PLATFORM"), "\n",
    "Profile: ", env!("BUILD_PROFILE"),
);

pub struct BuildInfo;

impl BuildInfo {
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// YYYYMMDD.HHMMSS
    pub fn build_timestamp() -> &'static str {
        env!("BUILD_TIMESTAMP")
    }

    pub fn git_hash() -> &'static str {
        env!("GIT_HASH")
    }

    pub fn target_platform() -> &'static str {
        env!("TARGET_PLATFORM")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_strings() {
        assert!(DISPLAY_VERSION.starts_with(BuildInfo::version()));
        assert!(DISPLAY_VERSION.contains(BuildInfo::build_timestamp()));
        assert!(DETAILED_INFO.contains(BuildInfo::target_platform()));
        assert!(!BuildInfo::git_hash().is_empty());
    }
}
