//! Build identity, shared by the startup log and `/api/buildinfo`

use axum::response::Json;
use serde::Serialize;

/// Values stamped in by build.rs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub const CURRENT: BuildInfo = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("BTM_GIT_HASH"),
        build_timestamp: env!("BTM_BUILD_TIMESTAMP"),
        build_profile: env!("BTM_BUILD_PROFILE"),
    };

    /// One-line identity logged at startup
    pub fn summary(&self) -> String {
        format!(
            "v{} [{}] built {} ({})",
            self.version, self.git_hash, self.build_timestamp, self.build_profile
        )
    }
}

/// GET /api/buildinfo
pub async fn get_build_info() -> Json<BuildInfo> {
    Json(BuildInfo::CURRENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_format() {
        let info = BuildInfo {
            version: "1.2.3",
            git_hash: "abcd1234-dirty",
            build_timestamp: "2025-01-01T00:00:00Z",
            build_profile: "release",
        };
        assert_eq!(
            info.summary(),
            "v1.2.3 [abcd1234-dirty] built 2025-01-01T00:00:00Z (release)"
        );
    }

    #[test]
    fn test_current_is_stamped() {
        assert_eq!(BuildInfo::CURRENT.version, env!("CARGO_PKG_VERSION"));
        assert!(!BuildInfo::CURRENT.git_hash.is_empty());
        assert!(!BuildInfo::CURRENT.build_profile.is_empty());
    }
}
