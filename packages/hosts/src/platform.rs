//! Hosts file locations

use std::path::PathBuf;

use locom_common::Platform;

/// Well-known hosts file path of `platform`
pub fn hosts_path(platform: Platform) -> PathBuf {
    match platform {
        Platform::MacOs | Platform::Linux => PathBuf::from("/etc/hosts"),
        Platform::Windows => {
            let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
            PathBuf::from(root)
                .join("System32")
                .join("drivers")
                .join("etc")
                .join("hosts")
        }
    }
}
