// Printing report markup to a paginated document.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use snafu::{prelude::*, Snafu};

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RenderError {
    #[snafu(display("Could not prepare the files of the renderer"))]
    TempFile { source: std::io::Error },
    #[snafu(display("Could not start the renderer {binary:?}"))]
    Spawn {
        source: std::io::Error,
        binary: String,
    },
    #[snafu(display("The renderer did not finish within {seconds} seconds"))]
    TimedOut { seconds: u64 },
    #[snafu(display("The renderer failed ({status})\nstdout: {stdout}\nstderr: {stderr}"))]
    Failed {
        status: String,
        stdout: String,
        stderr: String,
    },
    #[snafu(display("The renderer finished without writing {path}"))]
    MissingOutput { path: String },
}

/// Converts markup into the bytes of a printable document.
pub trait DocumentRenderer {
    fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError>;
}

/// Prints to PDF with a headless Chromium, or any browser that accepts the
/// same command line.
///
/// The page size and margins come from the `@page` rule of the markup. Each
/// call runs a fresh browser process in a private temporary directory.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    pub binary: String,
    pub timeout: Duration,
    pub extra_args: Vec<String>,
}

impl ChromiumRenderer {
    pub fn new(binary: &str) -> ChromiumRenderer {
        ChromiumRenderer {
            binary: binary.to_string(),
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            extra_args: vec![],
        }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            // Leaves time for the embedded images to be decoded.
            .arg("--virtual-time-budget=2000")
            .arg(format!("--print-to-pdf={}", output.display()))
            .args(&self.extra_args)
            .arg(format!("file://{}", input.display()));
        cmd
    }
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// Waits for a child process, killing it once `timeout` has passed.
pub fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<ExitStatus, RenderError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait().context(SpawnSnafu { binary: "child" })? {
            Some(status) => return Ok(status),
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return TimedOutSnafu {
                    seconds: timeout.as_secs(),
                }
                .fail();
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}

impl DocumentRenderer for ChromiumRenderer {
    fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        let dir = tempfile::tempdir().context(TempFileSnafu)?;
        let input: PathBuf = dir.path().join("report.html");
        let output: PathBuf = dir.path().join("report.pdf");
        let stdout_path = dir.path().join("stdout.log");
        let stderr_path = dir.path().join("stderr.log");
        fs::write(&input, markup).context(TempFileSnafu)?;
        // Files rather than pipes: a chatty browser cannot fill them up and block.
        let stdout = File::create(&stdout_path).context(TempFileSnafu)?;
        let stderr = File::create(&stderr_path).context(TempFileSnafu)?;

        info!("Starting {} to print {}", self.binary, input.display());
        let mut child = self
            .command(&input, &output)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .context(SpawnSnafu {
                binary: self.binary.as_str(),
            })?;
        let status = wait_with_deadline(&mut child, self.timeout)?;
        debug!("renderer exited with {}", status);

        ensure!(
            status.success(),
            FailedSnafu {
                status: status.to_string(),
                stdout: read_log(&stdout_path),
                stderr: read_log(&stderr_path),
            }
        );
        let bytes = fs::read(&output)
            .ok()
            .filter(|b| !b.is_empty())
            .context(MissingOutputSnafu {
                path: output.display().to_string(),
            })?;
        info!("Rendered a document of {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the markup it receives and returns fixed bytes.
    pub struct FakeRenderer {
        pub seen: RefCell<Vec<String>>,
    }

    impl DocumentRenderer for FakeRenderer {
        fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
            self.seen.borrow_mut().push(markup.to_string());
            Ok(b"%PDF-1.4 fake".to_vec())
        }
    }

    #[test]
    fn fake_renderer_is_a_document_renderer() {
        let r = FakeRenderer {
            seen: RefCell::new(vec![]),
        };
        let dynr: &dyn DocumentRenderer = &r;
        assert_eq!(dynr.render("<html/>").unwrap(), b"%PDF-1.4 fake".to_vec());
        assert_eq!(r.seen.borrow().len(), 1);
    }

    #[test]
    fn missing_binary() {
        let r = ChromiumRenderer::new("/nonexistent/chromium-browser");
        let err = r.render("<html/>").unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }), "{:?}", err);
    }

    #[cfg(unix)]
    #[test]
    fn failing_binary() {
        let r = ChromiumRenderer::new("false");
        let err = r.render("<html/>").unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }), "{:?}", err);
    }

    #[cfg(unix)]
    #[test]
    fn binary_without_output() {
        let r = ChromiumRenderer::new("true");
        let err = r.render("<html/>").unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput { .. }), "{:?}", err);
    }

    #[cfg(unix)]
    #[test]
    fn slow_process_is_killed() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let start = Instant::now();
        let err = wait_with_deadline(&mut child, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, RenderError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
