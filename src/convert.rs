//! DOCX to PDF conversion through an external office-suite binary.
//!
//! Each call spawns one `soffice --headless --convert-to pdf` process and
//! waits for it. There is no retry or queueing; callers bound the wait with
//! `tokio::time::timeout`, and dropping the future kills the child.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::ConverterConfig;

/// Bytes of stderr kept in a [`ConvertError::Failed`].
const STDERR_TAIL: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("converter binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),
    #[error("converter exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("converter produced no output at {}", .0.display())]
    OutputMissing(PathBuf),
    #[error("failed to run converter: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Converter {
    binary: PathBuf,
    timeout: Duration,
}

impl Converter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Upper bound callers should put on a single [`Converter::convert`].
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Where the converter writes the PDF for `input`: `<out_dir>/<stem>.pdf`.
    pub fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
        let mut name = input.file_stem().unwrap_or_default().to_os_string();
        name.push(".pdf");
        out_dir.join(name)
    }

    /// Runs `--version`, used as a startup check.
    pub async fn version(&self) -> Result<String, ConvertError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Converts `input` into a PDF inside `out_dir` and returns its path.
    pub async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        let out_dir = std::path::absolute(out_dir)?;
        // Concurrent soffice processes cannot share a profile directory.
        let profile = out_dir.join(".lo-profile");
        let profile_url = url::Url::from_directory_path(&profile).map_err(|()| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("profile path {} is not a file URL", profile.display()),
            )
        })?;

        tracing::debug!(
            "Running {} on {}",
            self.binary.display(),
            input.display()
        );

        let output = self
            .command()
            .env("HOME", &out_dir)
            .arg(format!("-env:UserInstallation={profile_url}"))
            .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
            .arg(&out_dir)
            .arg(input)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let pdf = Self::output_path(input, &out_dir);
        if !tokio::fs::try_exists(&pdf).await.unwrap_or(false) {
            return Err(ConvertError::OutputMissing(pdf));
        }

        Ok(pdf)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);

        // soffice re-executes helpers from its own program directory.
        if let Some(dir) = self.binary.parent().filter(|d| !d.as_os_str().is_empty()) {
            let mut paths = vec![dir.to_path_buf()];
            if let Some(existing) = std::env::var_os("PATH") {
                paths.extend(std::env::split_paths(&existing));
            }
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("PATH", joined);
            }
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: std::io::Error) -> ConvertError {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConvertError::BinaryNotFound(self.binary.clone())
        } else {
            ConvertError::Io(err)
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let start = text.len().saturating_sub(STDERR_TAIL);
    let start = (start..text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len());
    text[start..].to_string()
}

/// Per-request working directory, removed with everything in it on drop.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub async fn create(root: &Path, name: &str) -> std::io::Result<Self> {
        let path = std::path::absolute(root.join(name))?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Cleaned up {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to clean up {}: {e}", self.path.display()),
        }
    }
}
