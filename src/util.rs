//! Shared utilities for the pbmkit codebase

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::Duration;

/// Separator written after every part when concatenating sources.
pub const CONCAT_SEPARATOR: &str = "\n\n\n";

/// Kill a process by PID. Uses SIGKILL on Unix (Linux, macOS, WSL).
#[cfg(unix)]
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_process(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Wait for a spawned child, killing it if `timeout` expires first.
/// Without a timeout this blocks until the child exits.
pub fn wait_with_timeout(mut child: Child, timeout: Option<Duration>) -> Result<ExitStatus> {
    let Some(timeout) = timeout else {
        return child.wait().context("Failed to wait for command");
    };

    let pid = child.id();
    let (sender, receiver) = mpsc::channel();

    std::thread::spawn(move || {
        let result = child.wait();
        let _ = sender.send(result);
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result.context("Failed to execute command"),
        Err(_) => {
            kill_process(pid);
            bail!("Command timed out after {:?}", timeout)
        }
    }
}

/// Byte-exact comparison: equal lengths and pairwise equal bytes.
/// No whitespace or newline normalization takes place.
pub fn files_are_equal(path1: &Path, path2: &Path) -> io::Result<bool> {
    let bytes1 = fs::read(path1)?;
    let bytes2 = fs::read(path2)?;
    Ok(bytes1 == bytes2)
}

/// Concatenate `parts` (relative to `directory`) into `output`, each part
/// followed by [`CONCAT_SEPARATOR`]. `output` may be one of the parts.
pub fn concat_text(directory: &Path, parts: &[&str], output: &str) -> io::Result<()> {
    let mut content = String::new();
    for part in parts {
        content.push_str(&fs::read_to_string(directory.join(part))?);
        content.push_str(CONCAT_SEPARATOR);
    }
    // Write beside the target and rename so a part being overwritten is never
    // read half-written.
    let mut tmp = tempfile::NamedTempFile::new_in(directory)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(directory.join(output)).map_err(|e| e.error)?;
    Ok(())
}

/// Size of a file in bytes, 0 when it does not exist.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Remove a file if present.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Compact human-readable duration ("850ms", "1.2s", "2m 5s").
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Compact human-readable byte count using decimal units ("512B", "1.5kB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{}B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for candidate in UNITS {
        value /= 1000.0;
        unit = candidate;
        if value < 1000.0 {
            break;
        }
    }
    format!("{:.1}{}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_files_are_equal_reflexive() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.out");
        let b = tmp.path().join("b.out");
        fs::write(&a, b"6\n").unwrap();
        fs::copy(&a, &b).unwrap();
        assert!(files_are_equal(&a, &b).unwrap());
    }

    #[test]
    fn test_files_are_equal_single_byte_mutation() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.out");
        let b = tmp.path().join("b.out");
        fs::write(&a, b"hello world\n").unwrap();
        fs::write(&b, b"hello worle\n").unwrap();
        assert!(!files_are_equal(&a, &b).unwrap());
    }

    #[test]
    fn test_files_are_equal_no_whitespace_normalization() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.out");
        let b = tmp.path().join("b.out");
        fs::write(&a, b"6\n").unwrap();
        fs::write(&b, b"6").unwrap();
        assert!(!files_are_equal(&a, &b).unwrap());
        fs::write(&b, b"6\r\n").unwrap();
        assert!(!files_are_equal(&a, &b).unwrap());
    }

    #[test]
    fn test_files_are_equal_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.out");
        fs::write(&a, b"x").unwrap();
        assert!(files_are_equal(&a, &tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_concat_text_in_place() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("body.cc"), "int f() { return 1; }").unwrap();
        fs::write(tmp.path().join("main.cc"), "int main() { return f(); }").unwrap();
        concat_text(tmp.path(), &["body.cc", "main.cc"], "body.cc").unwrap();
        let merged = fs::read_to_string(tmp.path().join("body.cc")).unwrap();
        assert_eq!(
            merged,
            "int f() { return 1; }\n\n\nint main() { return f(); }\n\n\n"
        );
    }

    #[test]
    fn test_file_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x");
        assert_eq!(file_size(&path), 0);
        fs::write(&path, b"12345").unwrap();
        assert_eq!(file_size(&path), 5);
    }

    #[test]
    fn test_remove_if_exists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x");
        assert!(remove_if_exists(&path).is_ok());
        fs::write(&path, b"1").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(999), "999B");
        assert_eq!(format_bytes(1500), "1.5kB");
        assert_eq!(format_bytes(2_500_000), "2.5MB");
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_kills_slow_child() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let result = wait_with_timeout(child, Some(Duration::from_millis(100)));
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timed_out_child_is_killed() {
        let child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        let start = std::time::Instant::now();
        assert!(wait_with_timeout(child, Some(Duration::from_millis(100))).is_err());
        // a dead pid makes `kill -0` fail once the waiting thread reaped it
        let mut alive = true;
        for _ in 0..50 {
            let status = Command::new("kill")
                .args(["-0", &pid.to_string()])
                .stderr(Stdio::null())
                .status()
                .unwrap();
            if !status.success() {
                alive = false;
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        assert!(!alive);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_without_timeout() {
        let child = std::process::Command::new("true").spawn().unwrap();
        let status = wait_with_timeout(child, None).unwrap();
        assert!(status.success());
    }
}
