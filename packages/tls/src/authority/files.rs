//! File operations for generated certificate material
//!
//! This module handles:
//! - Directory creation
//! - Writing files with fixed permissions, also when they already exist
//! - Removing generated files

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::errors::{Result, TlsError};
use crate::layout::{CertificateLayout, FileType, GeneratedFile};

/// Mode for certificates, chains and config
pub const PUBLIC_MODE: u32 = 0o644;
/// Mode for private keys
pub const PRIVATE_MODE: u32 = 0o600;

pub(crate) async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| TlsError::filesystem(path, e))
}

/// Create or truncate `path`, write `contents` and force `mode`
pub(crate) async fn write_file(
    path: &Path,
    contents: &[u8],
    mode: u32,
    file_type: FileType,
) -> Result<GeneratedFile> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| TlsError::filesystem(path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| TlsError::filesystem(path, e))?;
    file.flush().await.map_err(|e| TlsError::filesystem(path, e))?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| TlsError::filesystem(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "wrote file");
    Ok(GeneratedFile {
        path: path.to_path_buf(),
        file_type,
        size_bytes: contents.len() as u64,
    })
}

/// Concatenate PEM documents, newline-terminating each
pub(crate) fn concat_pem(parts: &[&str]) -> String {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        out.push_str(part);
        if !part.is_empty() && !part.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Files removed by [`cleanup`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files that existed and were deleted
    pub removed: Vec<PathBuf>,
}

/// Remove the generated files of `layout`
///
/// Missing files are skipped. OS trust stores are never touched; untrust
/// the CA first if it was installed.
pub async fn cleanup(layout: &CertificateLayout) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for path in layout.generated_files() {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed");
                report.removed.push(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(TlsError::filesystem(&path, e)),
        }
    }
    Ok(report)
}
