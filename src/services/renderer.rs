use std::io;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::RenderError;
use crate::models::{DiagramFiles, RendererConfig};
use crate::services::ScratchSpace;

/// Runs the external rendering executable on diagram source files
pub struct RenderService {
    config: RendererConfig,
    scratch: ScratchSpace,
}

impl RenderService {
    pub fn new(config: RendererConfig, scratch: ScratchSpace) -> Self {
        Self { config, scratch }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render `text` in a private scratch directory and return the image bytes.
    ///
    /// The scratch directory is removed before this returns, whatever the outcome.
    pub async fn render(&self, text: &str) -> Result<Vec<u8>, RenderError> {
        let scratch = self.scratch.allocate().await?;
        let result = self.invoke(text, scratch.files()).await;
        if let Err(e) = scratch.close().await {
            tracing::warn!(%e, "Failed to remove scratch directory");
        }
        result
    }

    /// Write `text` to `files.source`, run the renderer on it and read back
    /// the image it wrote to `files.image`.
    ///
    /// Only the two paths in `files` are touched. The child process is awaited
    /// asynchronously and killed if it outlives the configured timeout.
    pub async fn invoke(&self, text: &str, files: &DiagramFiles) -> Result<Vec<u8>, RenderError> {
        tokio::fs::write(&files.source, text).await?;
        // A leftover image from an earlier run must not pass as fresh output
        remove_if_exists(&files.image).await?;

        let started = Instant::now();
        let output = self.run(&files.source).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(
                source = %files.source.display(),
                code = ?output.status.code(),
                elapsed_ms,
                stderr = %stderr,
                "Renderer exited with failure"
            );
            return Err(RenderError::ToolFailure {
                code: output.status.code(),
                stderr,
            });
        }

        let bytes = match tokio::fs::read(&files.image).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    image = %files.image.display(),
                    stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                    "Renderer succeeded but wrote no image"
                );
                return Err(RenderError::OutputMissing {
                    path: files.image.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            source = %files.source.display(),
            size_bytes = bytes.len(),
            elapsed_ms,
            "Diagram rendered"
        );

        Ok(bytes)
    }

    async fn run(&self, source: &Path) -> Result<Output, RenderError> {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers the tool starts can be killed with it
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| {
            tracing::error!(command = %self.config.command, %source, "Failed to start renderer");
            RenderError::Spawn {
                command: self.config.command.clone(),
                source,
            }
        })?;
        let group = ProcessGroup::new(child.id());

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let limit = self.config.timeout();
        let waited = match limit {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        // Leftover descendants die here, on success as well as on timeout,
        // so nothing writes next to the source after this returns
        drop(group);

        let status = match waited {
            Some(status) => status?,
            None => {
                // Reap the killed leader before reporting
                if let Err(e) = child.kill().await {
                    tracing::debug!(%e, "Renderer already gone when killing");
                }
                stdout.abort();
                stderr.abort();

                let limit = limit.unwrap_or_default();
                tracing::warn!(
                    source = %source.display(),
                    timeout_secs = limit.as_secs(),
                    "Renderer timed out, killed"
                );
                return Err(RenderError::Timeout { after: limit });
            }
        };

        Ok(Output {
            status,
            stdout: stdout.await.map_err(io::Error::other)??,
            stderr: stderr.await.map_err(io::Error::other)??,
        })
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Process group led by the renderer; every member is killed on drop.
///
/// Dropping covers timeouts and cancelled requests alike.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    leader: Option<u32>,
}

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            let Some(pgid) = self.leader.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
                return;
            };
            // SAFETY: killpg only sends a signal to the group created at spawn
            let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
            if rc != 0 {
                let err = io::Error::last_os_error();
                // ESRCH: the whole group has already exited
                if err.raw_os_error() != Some(libc::ESRCH) {
                    tracing::warn!(%err, pgid, "Failed to kill renderer process group");
                }
            }
        }
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
