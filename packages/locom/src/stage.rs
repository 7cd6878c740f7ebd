//! Stage initialization

use std::path::{Path, PathBuf};

use crate::config::{StageConfig, CONFIG_DIR};

/// `locom.yml` written by `init`
pub const DEFAULT_CONFIG: &str = r#"stage:
  network:
    name: locom

    bind:
      address: 127.0.0.1

    dns:
      suffix: .locom.self

    proxy:
      name: traefik
      type:
        engine: traefik
        version: "2.10"

apps:
"#;

/// `init` errors
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The folder has visible entries
    #[error("directory {} is not empty; please run 'locom init' in an empty folder", .0.display())]
    NotEmpty(PathBuf),

    /// `.locom` already exists
    #[error("stage already initialized: {} already exists", .0.display())]
    AlreadyInitialized(PathBuf),

    /// Creating or inspecting the folder failed
    #[error("{action} {}: {source}", path.display())]
    Io {
        /// What was attempted
        action: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> InitError {
    let path = path.to_path_buf();
    move |source| InitError::Io {
        action,
        path,
        source,
    }
}

/// Create a stage in `target`, creating the folder if needed
///
/// Hidden entries (dot files) do not count as content, so a fresh git
/// checkout can be initialized. Returns the path of the written config.
pub async fn init(target: &Path) -> Result<PathBuf, InitError> {
    tokio::fs::create_dir_all(target)
        .await
        .map_err(io_error("creating target folder", target))?;

    let mut entries = tokio::fs::read_dir(target)
        .await
        .map_err(io_error("checking directory", target))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(io_error("checking directory", target))?
    {
        if !entry.file_name().to_string_lossy().starts_with('.') {
            return Err(InitError::NotEmpty(target.to_path_buf()));
        }
    }

    let locom_dir = target.join(CONFIG_DIR);
    match tokio::fs::symlink_metadata(&locom_dir).await {
        Ok(_) => return Err(InitError::AlreadyInitialized(locom_dir)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("checking .locom directory", &locom_dir)(e)),
    }

    tokio::fs::create_dir(&locom_dir)
        .await
        .map_err(io_error("creating .locom directory", &locom_dir))?;

    let config_path = StageConfig::path(target);
    tokio::fs::write(&config_path, DEFAULT_CONFIG)
        .await
        .map_err(io_error("writing locom.yml", &config_path))?;

    tracing::info!(stage = %target.display(), "initialized stage");
    Ok(config_path)
}
