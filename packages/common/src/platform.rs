//! Operating system detection

use std::fmt;
use std::str::FromStr;

use crate::error::UnsupportedPlatform;

/// Operating systems with trust-store and hosts-file support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS, system keychain
    MacOs,
    /// Linux, system CA bundle plus the per-user NSS database
    Linux,
    /// Windows, current user's Root store
    Windows,
}

impl Platform {
    /// Platform of the running binary
    pub fn current() -> Result<Self, UnsupportedPlatform> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier to a platform
    ///
    /// Accepts the values of `std::env::consts::OS` plus `darwin`.
    pub fn from_os(os: &str) -> Result<Self, UnsupportedPlatform> {
        match os.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            _ => Err(UnsupportedPlatform(os.to_string())),
        }
    }

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Whether the platform elevates through `sudo`
    pub fn is_unix(self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl FromStr for Platform {
    type Err = UnsupportedPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_os(s)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_identifiers() {
        assert_eq!(Platform::from_os("macos"), Ok(Platform::MacOs));
        assert_eq!(Platform::from_os("Darwin"), Ok(Platform::MacOs));
        assert_eq!(Platform::from_os("linux"), Ok(Platform::Linux));
        assert_eq!("windows".parse::<Platform>(), Ok(Platform::Windows));
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        let err = Platform::from_os("freebsd").unwrap_err();
        assert_eq!(err, UnsupportedPlatform("freebsd".to_string()));
        assert_eq!(err.to_string(), "unsupported platform: freebsd");
    }

    #[test]
    fn test_display_round_trips() {
        for platform in [Platform::MacOs, Platform::Linux, Platform::Windows] {
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
    }

    #[test]
    fn test_current_matches_build_target() {
        let current = Platform::current();
        if cfg!(any(target_os = "macos", target_os = "linux", target_os = "windows")) {
            assert!(current.is_ok());
        } else {
            assert!(current.is_err());
        }
    }
}
