// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Fetching the default pose model when it is missing locally.
//!
//! Only `yolo11n-pose.onnx` is known. The file is streamed into a `.part`
//! sibling and renamed into place once complete, so an interrupted download
//! never leaves a truncated model behind.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{RecorderError, Result};

/// Default YOLO pose model file name.
pub const DEFAULT_POSE_MODEL: &str = "yolo11n-pose.onnx";

/// Release asset for [`DEFAULT_POSE_MODEL`].
const DEFAULT_POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(300);

const BAR_WIDTH: usize = 12;
/// Minimum seconds between progress redraws.
const REDRAW_INTERVAL: f64 = 0.1;

/// Download URL for a model file name, if it is a known asset.
#[must_use]
pub fn model_url(filename: &str) -> Option<&'static str> {
    (filename == DEFAULT_POSE_MODEL).then_some(DEFAULT_POSE_MODEL_URL)
}

/// Download the model at `model_path` if its file name is a known asset.
///
/// The model lands exactly at `model_path`.
///
/// # Errors
///
/// Returns [`RecorderError::ModelLoadError`] for unknown model names and for
/// any network or filesystem failure.
pub fn try_download_model<P: AsRef<Path>>(model_path: P) -> Result<PathBuf> {
    let path = model_path.as_ref();
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let url = model_url(filename).ok_or_else(|| {
        RecorderError::ModelLoadError(format!(
            "Model file not found: {}. Auto-download is only supported for {DEFAULT_POSE_MODEL}",
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    download_file(url, path)?;
    Ok(path.to_path_buf())
}

/// Stream `url` into `dest` through a `.part` file.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_recv_body(Some(READ_TIMEOUT))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        RecorderError::ModelLoadError(match &e {
            ureq::Error::Timeout(_) => format!("Connection timed out while downloading {url}"),
            ureq::Error::Io(io) => format!("Network error downloading {url}: {io}"),
            _ => format!("Failed to download {url}: {e}"),
        })
    })?;

    let total: Option<u64> = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0);

    let part = dest.with_extension("part");
    let _ = fs::remove_file(&part);

    let mut progress = Progress::new(format!("Downloading {url} to '{}'", dest.display()), total);
    let mut reader = response.into_body().into_reader();

    if let Err(e) = stream_to(&mut reader, &part, &mut progress) {
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    progress.finish();

    fs::rename(&part, dest).map_err(|e| {
        let _ = fs::remove_file(&part);
        RecorderError::ModelLoadError(format!(
            "Failed to move downloaded file to {}: {e}",
            dest.display()
        ))
    })
}

fn stream_to(reader: &mut impl Read, part: &Path, progress: &mut Progress) -> Result<()> {
    let file = File::create(part).map_err(|e| {
        RecorderError::ModelLoadError(format!("Failed to create {}: {e}", part.display()))
    })?;
    let mut writer = BufWriter::new(file);
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buffer).map_err(|e| {
            RecorderError::ModelLoadError(format!("Failed to read from network: {e}"))
        })?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).map_err(|e| {
            RecorderError::ModelLoadError(format!("Failed to write {}: {e}", part.display()))
        })?;
        progress.advance(n as u64);
    }

    writer
        .flush()
        .map_err(|e| RecorderError::ModelLoadError(format!("Failed to flush download: {e}")))
}

/// Single-line download progress on stderr.
struct Progress {
    desc: String,
    total: Option<u64>,
    done: u64,
    started: Instant,
    last_draw: Instant,
}

impl Progress {
    fn new(desc: String, total: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            desc,
            total,
            done: 0,
            started: now,
            last_draw: now,
        }
    }

    fn advance(&mut self, bytes: u64) {
        self.done += bytes;
        if self.last_draw.elapsed().as_secs_f64() >= REDRAW_INTERVAL {
            self.last_draw = Instant::now();
            eprint!("\r\x1b[K{}", self.line());
            std::io::stderr().flush().ok();
        }
    }

    fn finish(&mut self) {
        if let Some(total) = self.total {
            self.done = total;
        }
        eprintln!("\r\x1b[K{}", self.line());
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn line(&self) -> String {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { self.done as f64 / elapsed } else { 0.0 };
        let tail = format!("{}/s {}", format_bytes(rate), format_time(elapsed));

        match self.total {
            Some(total) => {
                let fraction = (self.done as f64 / total as f64).min(1.0);
                format!(
                    "{}: {}% {} {}/{} {tail}",
                    self.desc,
                    (fraction * 100.0) as u8,
                    generate_bar(fraction, BAR_WIDTH),
                    format_bytes(self.done as f64),
                    format_bytes(total as f64),
                )
            }
            None => format!("{}: {} {tail}", self.desc, format_bytes(self.done as f64)),
        }
    }
}

/// Human-readable byte count, e.g. `10.4MB`.
fn format_bytes(bytes: f64) -> String {
    const UNITS: [(&str, f64); 3] = [
        ("GB", 1024.0 * 1024.0 * 1024.0),
        ("MB", 1024.0 * 1024.0),
        ("KB", 1024.0),
    ];
    UNITS
        .iter()
        .find(|(_, size)| bytes >= *size)
        .map_or_else(|| format!("{bytes:.0}B"), |(unit, size)| format!("{:.1}{unit}", bytes / size))
}

/// Elapsed time as `5.5s`, `1:05.0` or `1:01:05.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn format_time(seconds: f64) -> String {
    let secs = seconds % 60.0;
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{}:{secs:04.1}", (seconds / 60.0) as u32)
    } else {
        let hours = (seconds / 3600.0) as u32;
        let mins = ((seconds % 3600.0) / 60.0) as u32;
        format!("{hours}:{mins:02}:{secs:04.1}")
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn generate_bar(fraction: f64, width: usize) -> String {
    let exact = fraction * width as f64;
    let filled = (exact as usize).min(width);
    if filled == width {
        return "━".repeat(width);
    }

    let mut bar = "━".repeat(filled);
    if exact - filled as f64 > 0.5 {
        bar.push('╸');
        bar.push_str(&"─".repeat(width - filled - 1));
    } else {
        bar.push_str(&"─".repeat(width - filled));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_returns_error() {
        let err = try_download_model("unknown_model.onnx").unwrap_err();
        assert!(matches!(err, RecorderError::ModelLoadError(_)));
        assert!(err.to_string().contains("Auto-download is only supported"));
    }

    #[test]
    fn test_model_url() {
        assert_eq!(model_url(DEFAULT_POSE_MODEL), Some(DEFAULT_POSE_MODEL_URL));
        assert_eq!(model_url("yolo11n.onnx"), None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500.0), "500B");
        assert_eq!(format_bytes(1024.0), "1.0KB");
        assert_eq!(format_bytes(1_048_576.0), "1.0MB");
        assert_eq!(format_bytes(1_073_741_824.0), "1.0GB");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(5.5), "5.5s");
        assert_eq!(format_time(65.0), "1:05.0");
        assert_eq!(format_time(3665.0), "1:01:05.0");
    }

    #[test]
    fn test_generate_bar() {
        assert_eq!(generate_bar(0.0, 10), "──────────");
        assert_eq!(generate_bar(1.0, 10), "━━━━━━━━━━");
        assert_eq!(generate_bar(0.5, 10), "━━━━━─────");
        assert_eq!(generate_bar(0.58, 10), "━━━━━╸────");
    }
}
