//! OS-backed capability implementations.

use std::io::{self, BufRead, BufReader, PipeReader};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{
    AppMetadata, BuildInfo, ClassRegistry, CommandOutput, CommandRunner, DebugState, FileSystem,
    LoopbackConnector, PackageRegistry, SettingKey, SettingsStore,
};
use crate::error::ProbeError;

/// Real filesystem, optionally re-rooted under a directory.
#[derive(Debug, Clone, Default)]
pub struct SystemFileSystem {
    root: Option<PathBuf>,
}

impl SystemFileSystem {
    /// Filesystem as seen by the process.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve absolute paths under `root` instead of `/`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
            None => path.to_path_buf(),
        }
    }
}

impl FileSystem for SystemFileSystem {
    fn exists(&self, path: &Path) -> Result<bool, ProbeError> {
        let resolved = self.resolve(path);
        resolved
            .try_exists()
            .map_err(|e| ProbeError::io(resolved, e))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, ProbeError> {
        let resolved = self.resolve(path);
        let bytes = std::fs::read(&resolved).map_err(|e| ProbeError::io(resolved, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Owns a child process; kills and reaps it when dropped.
struct ChildGuard(Child);

impl ChildGuard {
    fn exit_code(&mut self) -> Option<i32> {
        self.0.try_wait().ok().flatten().and_then(|status| status.code())
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Spawns real processes with stdout and stderr merged into one pipe.
///
/// Output is streamed line by line. When the timeout hits, the lines read so
/// far are returned with `status: None` and the child is killed; only a
/// command that printed nothing fails with [`ProbeError::CommandTimeout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, ProbeError> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| ProbeError::malformed("command", "empty argument list"))?;
        let command_line = args.join(" ");
        let spawn_err = |source| ProbeError::Spawn {
            command: command_line.clone(),
            source,
        };

        let (reader, writer) = std::io::pipe().map_err(spawn_err)?;
        let child = {
            let mut command = Command::new(program);
            command
                .args(rest)
                .stdin(Stdio::null())
                .stdout(writer.try_clone().map_err(spawn_err)?)
                .stderr(writer);
            // Dropping `command` closes our copies of the write end.
            command.spawn().map_err(spawn_err)?
        };
        let mut guard = ChildGuard(child);

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("integrity-command".into())
            .spawn(move || stream_lines(reader, &tx))
            .map_err(spawn_err)?;

        let deadline = Instant::now() + timeout;
        let mut lines = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Ok(line)) => lines.push(line),
                Ok(Err(source)) => {
                    return Err(ProbeError::Spawn {
                        command: command_line,
                        source,
                    })
                },
                Err(RecvTimeoutError::Disconnected) => {
                    let status = guard.exit_code();
                    debug!(command = %command_line, ?status, lines = lines.len(), "command finished");
                    return Ok(CommandOutput { status, lines });
                },
                Err(RecvTimeoutError::Timeout) if lines.is_empty() => {
                    return Err(ProbeError::CommandTimeout {
                        command: command_line,
                        timeout,
                    })
                },
                Err(RecvTimeoutError::Timeout) => {
                    debug!(command = %command_line, lines = lines.len(), "command still running, keeping partial output");
                    return Ok(CommandOutput { status: None, lines });
                },
            }
        }
    }
}

/// Send each line of `reader` until EOF, a read error, or the receiver
/// going away.
fn stream_lines(reader: PipeReader, tx: &mpsc::Sender<io::Result<String>>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if tx.send(Ok(line)).is_err() {
                    return;
                }
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            },
        }
    }
}

/// Plain TCP connects to 127.0.0.1.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoopbackConnector;

impl LoopbackConnector for SystemLoopbackConnector {
    fn connect(&self, port: u16, timeout: Duration) -> Result<(), ProbeError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpStream::connect_timeout(&addr, timeout)
            .map(drop)
            .map_err(|source| ProbeError::Connect { port, source })
    }
}

/// Placeholder for capabilities the host did not provide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl PackageRegistry for Unavailable {
    fn is_installed(&self, _package: &str) -> Result<bool, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "package registry",
        })
    }
}

impl SettingsStore for Unavailable {
    fn get_int(&self, _key: SettingKey) -> Result<i64, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "settings store",
        })
    }
}

impl AppMetadata for Unavailable {
    fn flags(&self) -> Result<u32, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "application metadata",
        })
    }
}

impl DebugState for Unavailable {
    fn is_debugger_connected(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "debugger flags",
        })
    }

    fn is_waiting_for_debugger(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "debugger flags",
        })
    }
}

impl ClassRegistry for Unavailable {
    fn is_class_loadable(&self, _name: &str) -> bool {
        false
    }
}

impl BuildInfo for Unavailable {
    fn tags(&self) -> Result<String, ProbeError> {
        Err(ProbeError::Unavailable {
            capability: "build metadata",
        })
    }
}
