//! Plain-terminal capture driver.
//!
//! Runs the user's login shell on a pseudo-terminal. Everything the shell
//! prints is passed through to our stdout unchanged and, rendered into
//! plain lines, appended to `terminal_<ts>.log` with timing markers.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Local;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use signal_hook::consts::SIGWINCH;
use signal_hook::iterator::Signals;
use tracing::{debug, warn};

use super::filename::terminal_filename;
use super::header::{write_header, CaptureMeta};
use super::pipe::{now, TimingWriter};
use super::CaptureError;
use crate::normalize::LineRenderer;

/// Name of the file holding the shell's pid inside the session directory.
pub const PID_FILE: &str = ".oplogger.pid";

const DEFAULT_SHELL: &str = "/bin/sh";

/// Result of a finished plain-terminal session.
#[derive(Debug, Clone)]
pub struct PlainSession {
    pub log_path: PathBuf,
    pub exit_code: u32,
}

/// Keeps the controlling terminal in raw mode until dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Cannot restore terminal mode: {}", e);
        }
    }
}

/// Size of the controlling terminal, 80x24 when unknown.
fn window_size() -> PtySize {
    let (cols, rows) = match terminal_size::terminal_size() {
        Some((terminal_size::Width(w), terminal_size::Height(h))) => (w, h),
        None => (80, 24),
    };
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn login_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Pid written by a running plain session in `dir`.
pub fn read_pid(dir: &Path) -> Option<i32> {
    fs::read_to_string(dir.join(PID_FILE))
        .ok()?
        .trim()
        .parse()
        .ok()
        .filter(|pid| *pid > 0)
}

/// Send `SIGHUP` to `pid`. Returns `false` if the process is already gone.
pub fn send_hangup(pid: i32) -> io::Result<bool> {
    match kill(Pid::from_raw(pid), Signal::SIGHUP) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn pty_error(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Pty(e.to_string())
}

/// Run a logged shell in `dir` until it exits.
pub fn run(dir: &Path) -> Result<PlainSession, CaptureError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CaptureError::NotATty);
    }

    let started = Local::now();
    let log_path = dir.join(terminal_filename(&started));
    let cwd = env::current_dir()?;

    let pair = native_pty_system()
        .openpty(window_size())
        .map_err(pty_error)?;

    let shell = login_shell();
    let mut cmd = CommandBuilder::new(&shell);
    cmd.arg("-l");
    cmd.cwd(&cwd);
    let mut child = pair.slave.spawn_command(cmd).map_err(pty_error)?;
    drop(pair.slave);
    debug!("Spawned {} (pid {:?})", shell, child.process_id());

    let meta = CaptureMeta::new()
        .with("type", "plain")
        .with("started", started.to_rfc3339())
        .with("cwd", cwd.to_string_lossy());
    let mut file = BufWriter::new(File::create(&log_path)?);
    write_header(&mut file, &meta)?;
    file.flush()?;
    let mut log = TimingWriter::new(file);

    let pid_path = dir.join(PID_FILE);
    if let Some(pid) = child.process_id() {
        fs::write(&pid_path, format!("{}\n", pid))?;
    }

    let mut reader = pair.master.try_clone_reader().map_err(pty_error)?;
    let mut writer = pair.master.take_writer().map_err(pty_error)?;
    let master = pair.master;

    let raw_mode = RawModeGuard::enable()?;

    let mut signals = Signals::new([SIGWINCH])?;
    let signals_handle = signals.handle();
    let resizer = thread::spawn(move || {
        for _ in signals.forever() {
            if let Err(e) = master.resize(window_size()) {
                debug!("Resize failed: {}", e);
            }
        }
    });

    // Blocks in read() until the process exits; it is never joined.
    thread::spawn(move || {
        let mut input = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if writer.write_all(&buf[..n]).is_err() || writer.flush().is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });

    let mut renderer = LineRenderer::new();
    let mut stdout = io::stdout();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // EIO once the shell side of the pty is closed.
            Err(_) => break,
        };
        let chunk = &buf[..n];
        stdout.write_all(chunk)?;
        stdout.flush()?;

        let stamp = now();
        for line in renderer.feed(chunk) {
            log.write_chunk(format!("{}\n", line).as_bytes(), &stamp)?;
        }
        log.flush()?;
    }
    if let Some(line) = renderer.flush() {
        log.write_chunk(format!("{}\n", line).as_bytes(), &now())?;
    }
    log.finish(&now())?;

    let status = child.wait()?;
    signals_handle.close();
    if resizer.join().is_err() {
        warn!("Resize thread panicked");
    }
    drop(raw_mode);

    if let Err(e) = fs::remove_file(&pid_path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Cannot remove {}: {}", pid_path.display(), e);
        }
    }

    Ok(PlainSession {
        log_path,
        exit_code: status.exit_code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_pid_from_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_pid(dir.path()), None);

        fs::write(dir.path().join(PID_FILE), "4242\n").unwrap();
        assert_eq!(read_pid(dir.path()), Some(4242));

        fs::write(dir.path().join(PID_FILE), "garbage").unwrap();
        assert_eq!(read_pid(dir.path()), None);

        fs::write(dir.path().join(PID_FILE), "0").unwrap();
        assert_eq!(read_pid(dir.path()), None);
    }

    #[test]
    fn hangup_to_missing_process() {
        // Pid far above any default pid_max.
        assert!(!send_hangup(0x3fff_fff0).unwrap());
    }

    #[test]
    fn hangup_ends_running_process() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        assert!(send_hangup(child.id() as i32).unwrap());
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
