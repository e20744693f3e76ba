use crate::yearsort_core::error::{Result, YearsortError};
use crossbeam_channel::bounded;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// An external tool that can report a capture year for a file.
pub trait MetadataProbe: Send + Sync {
    /// Run the tool and return the first line it printed.
    fn first_line(&self, path: &Path) -> Result<String>;
}

/// Capture-year lookup through the `exiftool` command line.
#[derive(Debug, Clone)]
pub struct ExifToolProbe {
    program: PathBuf,
    timeout: Duration,
}

impl ExifToolProbe {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        ExifToolProbe {
            program: program.into(),
            timeout,
        }
    }

    /// Return a probe if the program answers `-ver`, otherwise `None`.
    pub fn detect(program: impl Into<PathBuf>, timeout: Duration) -> Option<Self> {
        let probe = Self::new(program, timeout);
        if exiftool_available(&probe.program) {
            Some(probe)
        } else {
            log::info!(
                "{} not available, capture dates will come from embedded EXIF or file times",
                probe.program.display()
            );
            None
        }
    }
}

impl MetadataProbe for ExifToolProbe {
    fn first_line(&self, path: &Path) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["-s3", "-DateTimeOriginal", "-d", "%Y"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| YearsortError::Probe(format!("{}: {}", self.program.display(), e)))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| YearsortError::Probe("stdout not captured".to_string()))?;

        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let mut output = String::new();
            let result = stdout.read_to_string(&mut output).map(|_| output);
            let _ = tx.send(result);
        });

        let output = match rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(YearsortError::ProbeTimeout(self.timeout));
            }
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(YearsortError::Probe(format!("exited with {}", status)));
        }

        Ok(output.lines().next().unwrap_or_default().trim().to_string())
    }
}

/// Check if exiftool is available on the system.
pub fn exiftool_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-ver")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
