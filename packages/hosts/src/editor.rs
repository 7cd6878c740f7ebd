//! Hosts file editor
//!
//! Setup flow: locate the hosts file, scan out any existing project block,
//! append the fresh block, replace the file through a staged copy, then
//! mirror the block into local state and optionally verify resolution.
//! Verification never fails a successful update.

use std::io::{ErrorKind, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use locom_common::{ElevationStrategy, LoggingTransformer, Platform};
use tempfile::{NamedTempFile, TempPath};

use crate::block::{self, HostsBlock, LineEnding};
use crate::error::{HostsError, Result, VerifyError};
use crate::platform::hosts_path;
use crate::verify::{DnsVerifier, Verification};

/// Prefix of staged hosts files
pub const STAGED_PREFIX: &str = ".locom-hosts-";
/// State mirror path relative to the stage directory
pub const STATE_FILE: &str = ".locom/hosts";

/// What to map: `proxy<suffix>` to `address`, owned by `project`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackEntry {
    /// Bind address written into the mapping line
    pub address: IpAddr,
    /// DNS suffix with leading dot, e.g. `.locom.self`
    pub suffix: String,
    /// Project the block belongs to
    pub project: String,
}

impl LoopbackEntry {
    /// Validate raw configuration values
    pub fn new(address: &str, suffix: &str, project: &str) -> Result<Self> {
        let address: IpAddr = address
            .trim()
            .parse()
            .map_err(|_| HostsError::InvalidEntry(format!("`{address}` is not an IP address")))?;

        let suffix = suffix.trim();
        if !suffix.starts_with('.') || suffix.len() < 2 || suffix.contains(char::is_whitespace) {
            return Err(HostsError::InvalidEntry(format!(
                "DNS suffix `{suffix}` must start with a dot and contain no whitespace"
            )));
        }

        if project.trim().is_empty() || project.contains(['\n', '\r']) {
            return Err(HostsError::InvalidEntry(format!(
                "project name `{project}` cannot be used in a hosts marker"
            )));
        }

        Ok(Self {
            address,
            suffix: suffix.to_string(),
            project: project.to_string(),
        })
    }

    /// Block for this entry
    pub fn block(&self) -> HostsBlock {
        HostsBlock::new(&self.project, &self.address.to_string(), &self.suffix)
    }

    /// `proxy<suffix>`
    pub fn hostname(&self) -> String {
        format!("proxy{}", self.suffix)
    }
}

/// How the hosts file was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMethod {
    /// Staged file renamed over the hosts file
    Renamed,
    /// Staged file copied over the hosts file
    Copied,
    /// Staged file copied by the elevation helper
    Elevated,
}

/// Outcome of [`HostsEditor::setup`]
#[derive(Debug)]
pub struct SetupReport {
    /// Block now in the hosts file
    pub block: HostsBlock,
    /// Line ending used
    pub line_ending: LineEnding,
    /// Whether an earlier block for the project was replaced
    pub replaced_existing: bool,
    /// How the file was written
    pub method: ReplaceMethod,
    /// Where the block was mirrored
    pub state_path: PathBuf,
    /// Present when verification was requested
    pub verification: Option<std::result::Result<Verification, VerifyError>>,
}

/// Outcome of [`HostsEditor::remove`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    /// Blocks stripped from the hosts file
    pub blocks_removed: usize,
    /// How the file was written; `None` when there was nothing to remove
    pub method: Option<ReplaceMethod>,
    /// Whether the state mirror existed and was deleted
    pub state_removed: bool,
}

/// Edits the project block of one hosts file
#[derive(Debug)]
pub struct HostsEditor<E> {
    elevation: E,
    hosts_path: PathBuf,
    state_path: PathBuf,
    verifier: DnsVerifier,
}

impl<E: ElevationStrategy> HostsEditor<E> {
    /// Editor for an explicit hosts file and state mirror
    pub fn new(elevation: E, hosts_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            elevation,
            hosts_path: hosts_path.into(),
            state_path: state_path.into(),
            verifier: DnsVerifier::default(),
        }
    }

    /// Editor for the system hosts file of `platform`, mirroring into `stage_dir`
    pub fn for_platform(platform: Platform, elevation: E, stage_dir: &Path) -> Self {
        Self::new(elevation, hosts_path(platform), stage_dir.join(STATE_FILE))
    }

    /// Use another verifier
    pub fn verifier(self, verifier: DnsVerifier) -> Self {
        Self { verifier, ..self }
    }

    /// Hosts file being edited
    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    /// Write the block for `entry`, replacing any earlier one
    ///
    /// # Errors
    ///
    /// - `Filesystem` when reading, staging or the state mirror fails, or the
    ///   replace fails for a reason other than permissions
    /// - `Elevation` when the elevated copy is denied or unavailable
    pub async fn setup(&self, entry: &LoopbackEntry, verify: bool) -> Result<SetupReport> {
        let block = entry.block();
        let current = self.read_hosts().await?;
        let (updated, stripped) = block::apply_block(&current, &block);
        if stripped.unterminated {
            tracing::warn!(
                project = %entry.project,
                "unterminated locom block in {}; lines after its begin marker were dropped",
                self.hosts_path.display()
            );
        }
        let line_ending = stripped.ending;
        let replaced_existing = stripped.blocks_removed > 0;

        let method = self.replace(updated).await?;
        tracing::info!(hosts = %self.hosts_path.display(), ?method, "hosts file updated");

        self.persist_state(&block).await?;

        let verification = if verify {
            Some(self.verifier.verify(&entry.hostname(), entry.address).await)
        } else {
            None
        };

        Ok(SetupReport {
            block,
            line_ending,
            replaced_existing,
            method,
            state_path: self.state_path.clone(),
            verification,
        })
    }

    /// Strip the project's block and delete the state mirror
    pub async fn remove(&self, project: &str) -> Result<RemoveReport> {
        let current = self.read_hosts().await?;
        let (updated, stripped) = block::remove_block(&current, project);

        let method = if stripped.blocks_removed > 0 {
            Some(self.replace(updated).await?)
        } else {
            tracing::debug!(project, "no block to remove");
            None
        };

        let state_removed = match tokio::fs::remove_file(&self.state_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(HostsError::filesystem(&self.state_path, e)),
        };

        Ok(RemoveReport {
            blocks_removed: stripped.blocks_removed,
            method,
            state_removed,
        })
    }

    async fn read_hosts(&self) -> Result<Vec<u8>> {
        match tokio::fs::read(&self.hosts_path).await {
            Ok(content) => Ok(content),
            // a missing hosts file is treated as empty
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(HostsError::filesystem(&self.hosts_path, e)),
        }
    }

    /// Stage `content` and put it in place of the hosts file
    async fn replace(&self, content: Vec<u8>) -> Result<ReplaceMethod> {
        // rename onto the target, not onto a symlink pointing at it
        let target = tokio::fs::canonicalize(&self.hosts_path)
            .await
            .unwrap_or_else(|_| self.hosts_path.clone());

        let (swap, staging_dir) = {
            let target = target.clone();
            tokio::task::spawn_blocking(move || swap_into_place(&target, &content))
                .await
                .map_err(|e| HostsError::filesystem(&self.hosts_path, std::io::Error::other(e)))??
        };

        let method = self.complete(swap, &target).await?;
        sweep_stale_staged(&staging_dir).await;
        Ok(method)
    }

    /// Finish a swap the unprivileged attempt could not
    async fn complete(&self, swap: Swap, target: &Path) -> Result<ReplaceMethod> {
        match swap {
            Swap::Done(method) => Ok(method),
            Swap::NeedsElevation(staged) => {
                tracing::info!(hosts = %target.display(), "hosts file not writable, requesting elevation");
                self.elevation.copy_elevated(&staged, target).await?;
                Ok(ReplaceMethod::Elevated)
            }
        }
    }

    async fn persist_state(&self, block: &HostsBlock) -> Result<()> {
        if let Some(parent) = self.state_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HostsError::filesystem(parent, e))?;
        }
        tokio::fs::write(&self.state_path, block.render(LineEnding::Lf))
            .await
            .map_err(|e| HostsError::filesystem(&self.state_path, e))
    }
}

/// Where the staged content stands after the unprivileged attempt
#[derive(Debug)]
enum Swap {
    Done(ReplaceMethod),
    /// Staged file still on disk, waiting for an elevated copy
    NeedsElevation(TempPath),
}

/// Stage `content` next to `target` and rename it over `target`
///
/// Blocking; returns the swap outcome and the directory the staged file
/// was created in.
fn swap_into_place(target: &Path, content: &[u8]) -> Result<(Swap, PathBuf)> {
    let staged = stage(target, content)?;
    let staging_dir = staged
        .path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);

    let swap = match staged.persist(target) {
        Ok(_) => Swap::Done(ReplaceMethod::Renamed),
        Err(persist_err) => recover_failed_rename(persist_err.file, target, persist_err.error)?,
    };
    Ok((swap, staging_dir))
}

/// A denied rename escalates; any other failure falls back to a plain copy,
/// which itself escalates when denied
fn recover_failed_rename(
    staged: NamedTempFile,
    target: &Path,
    rename_error: std::io::Error,
) -> Result<Swap> {
    tracing::debug!(error = %rename_error, "rename failed, copying instead");
    if rename_error.kind() == ErrorKind::PermissionDenied {
        return Ok(Swap::NeedsElevation(staged.into_temp_path()));
    }

    match std::fs::copy(staged.path(), target) {
        Ok(_) => Ok(Swap::Done(ReplaceMethod::Copied)),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            Ok(Swap::NeedsElevation(staged.into_temp_path()))
        }
        Err(e) => Err(HostsError::filesystem(target, e)),
    }
}

/// Write `content` to a temp file next to `target`, or in the temp dir if that is denied
fn stage(target: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut staged = match staged_file_in(&dir) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            let fallback = std::env::temp_dir();
            staged_file_in(&fallback).map_err(|e| HostsError::filesystem(&fallback, e))?
        }
        Err(e) => return Err(HostsError::filesystem(&dir, e)),
    };

    let path = staged.path().to_path_buf();
    staged
        .write_all(content)
        .and_then(|()| staged.flush())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| HostsError::filesystem(&path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(target)
            .map(|m| m.permissions().mode() & 0o777)
            .unwrap_or(0o644);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| HostsError::filesystem(&path, e))?;
    }

    Ok(staged)
}

fn staged_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(STAGED_PREFIX)
        .tempfile_in(dir)
}

/// Delete staged files left behind by interrupted runs
async fn sweep_stale_staged(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(STAGED_PREFIX) {
            continue;
        }
        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale staged hosts file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => LoggingTransformer::log_cleanup_warning(&path.display().to_string(), &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locom_common::testing::{ElevatedCall, RecordingElevation};

    #[test]
    fn test_entry_validation() {
        let entry = LoopbackEntry::new("127.0.0.1", ".locom.self", "demo").unwrap();
        assert_eq!(entry.hostname(), "proxy.locom.self");
        assert_eq!(entry.block().mapping_line(), "127.0.0.1 proxy.locom.self");

        assert!(LoopbackEntry::new("::1", ".test", "demo").is_ok());
        assert!(matches!(
            LoopbackEntry::new("localhost", ".locom.self", "demo"),
            Err(HostsError::InvalidEntry(_))
        ));
        assert!(LoopbackEntry::new("127.0.0.1", "locom.self", "demo").is_err());
        assert!(LoopbackEntry::new("127.0.0.1", ".", "demo").is_err());
        assert!(LoopbackEntry::new("127.0.0.1", ".locom.self", " ").is_err());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(".locom-hosts-abc123");
        let keep = dir.path().join("hosts");
        std::fs::write(&stale, "partial").unwrap();
        std::fs::write(&keep, "127.0.0.1 localhost\n").unwrap();

        sweep_stale_staged(dir.path()).await;

        assert!(!stale.exists());
        assert!(keep.exists());
    }

    struct Staged {
        _dir: tempfile::TempDir,
        target: PathBuf,
        state: PathBuf,
        staged: NamedTempFile,
    }

    fn staged_update(old: &str, new: &str) -> Staged {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("hosts");
        std::fs::write(&target, old).unwrap();
        let staged = stage(&target, new.as_bytes()).unwrap();
        Staged {
            state: dir.path().join("state"),
            _dir: dir,
            target,
            staged,
        }
    }

    #[tokio::test]
    async fn test_denied_rename_is_copied_by_elevation_exactly_once() {
        let fx = staged_update("old\n", "new\n");
        let staged_path = fx.staged.path().to_path_buf();
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);

        let swap = recover_failed_rename(fx.staged, &fx.target, denied).unwrap();
        assert!(matches!(swap, Swap::NeedsElevation(_)));
        // nothing was written without elevation
        assert_eq!(std::fs::read_to_string(&fx.target).unwrap(), "old\n");

        let elevation = RecordingElevation::copying();
        let editor = HostsEditor::new(&elevation, &fx.target, &fx.state);
        let method = editor.complete(swap, &fx.target).await.unwrap();

        assert_eq!(method, ReplaceMethod::Elevated);
        assert_eq!(
            elevation.calls(),
            vec![ElevatedCall::Copy {
                source: staged_path.clone(),
                destination: fx.target.clone(),
            }]
        );
        assert_eq!(std::fs::read_to_string(&fx.target).unwrap(), "new\n");
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_other_rename_failures_fall_back_to_plain_copy() {
        let fx = staged_update("old\n", "new\n");
        let cross_device = std::io::Error::other("cross-device link");

        let swap = recover_failed_rename(fx.staged, &fx.target, cross_device).unwrap();

        let elevation = RecordingElevation::copying();
        let editor = HostsEditor::new(&elevation, &fx.target, &fx.state);
        assert_eq!(editor.complete(swap, &fx.target).await.unwrap(), ReplaceMethod::Copied);
        assert!(elevation.calls().is_empty());
        assert_eq!(std::fs::read_to_string(&fx.target).unwrap(), "new\n");
    }

    #[tokio::test]
    async fn test_denied_elevation_leaves_target_alone() {
        let fx = staged_update("old\n", "new\n");
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        let swap = recover_failed_rename(fx.staged, &fx.target, denied).unwrap();

        let elevation = RecordingElevation::denying();
        let editor = HostsEditor::new(&elevation, &fx.target, &fx.state);
        let err = editor.complete(swap, &fx.target).await.unwrap_err();

        assert!(matches!(err, HostsError::Elevation(_)));
        assert_eq!(elevation.calls().len(), 1);
        assert_eq!(std::fs::read_to_string(&fx.target).unwrap(), "old\n");
    }

    #[test]
    fn test_missing_copy_source_is_a_filesystem_error() {
        let fx = staged_update("old\n", "new\n");
        std::fs::remove_file(fx.staged.path()).unwrap();

        let busy = std::io::Error::other("busy");
        let err = recover_failed_rename(fx.staged, &fx.target, busy).unwrap_err();
        assert!(matches!(err, HostsError::Filesystem { .. }));
    }
}
