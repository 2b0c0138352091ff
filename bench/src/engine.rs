//! Accounting engine server process.
//!
//! Formats a single-replica data file, starts the server, and waits until
//! its address accepts TCP connections. The server is stopped when the
//! [`EngineProcess`] is dropped.

use std::fs::{self, File};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::config::EngineConfig;
use crate::error::{BenchError, Result};

const MAX_BACKOFF: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
/// Lines of the server's stderr quoted when it dies during startup.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug)]
pub struct EngineProcess {
    child: Option<Child>,
    address: String,
    stderr_log: PathBuf,
}

impl EngineProcess {
    /// Format the data file, start the server and wait for it to listen.
    pub fn launch(config: &EngineConfig) -> Result<Self> {
        clear_stale_data_file(config)?;
        format_data_file(config)?;

        info!(
            "Starting engine {} on {}",
            config.binary.display(),
            config.address
        );
        let stderr_log = stderr_log_path(&config.data_file);
        let stderr = File::create(&stderr_log).map_err(|e| {
            BenchError::Startup(format!("create {}: {e}", stderr_log.display()))
        })?;
        let child = Command::new(&config.binary)
            .arg("start")
            .arg(format!("--addresses={}", config.address))
            .arg("--development")
            .arg(&config.data_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                BenchError::Startup(format!("spawn {}: {e}", config.binary.display()))
            })?;

        let mut engine = Self {
            child: Some(child),
            address: config.address.clone(),
            stderr_log,
        };
        let target = probe_address(&config.address)?;
        wait_until_ready(
            target,
            config.ready_attempts,
            config.ready_initial_backoff,
            || engine.ensure_running(),
        )?;
        info!("Engine is accepting connections on {target}");
        Ok(engine)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// File receiving the server's stderr.
    pub fn stderr_log(&self) -> &Path {
        &self.stderr_log
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn ensure_running(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Err(BenchError::Startup("engine already stopped".into()));
        };
        match child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => {
                let mut msg = format!("engine exited before accepting connections ({status})");
                let tail = stderr_tail(&self.stderr_log);
                if !tail.is_empty() {
                    msg.push_str(": ");
                    msg.push_str(&tail);
                }
                Err(BenchError::Startup(msg))
            }
            Err(e) => Err(BenchError::Startup(format!("engine status: {e}"))),
        }
    }

    /// Kill the server and reap it. Safe to call more than once.
    pub fn stop(&mut self) -> io::Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if child.try_wait()?.is_none() {
            child.kill()?;
        }
        child.wait()?;
        info!("Engine on {} stopped", self.address);
        Ok(())
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop engine on {}: {e}", self.address);
        }
    }
}

/// `<data_file>.stderr.log`
fn stderr_log_path(data_file: &Path) -> PathBuf {
    let mut path = data_file.as_os_str().to_owned();
    path.push(".stderr.log");
    PathBuf::from(path)
}

fn stderr_tail(path: &Path) -> String {
    let Ok(contents) = fs::read_to_string(path) else {
        return String::new();
    };
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n").trim().to_string()
}

fn clear_stale_data_file(config: &EngineConfig) -> Result<()> {
    if !config.fresh_data_file || !config.data_file.exists() {
        return Ok(());
    }
    warn!(
        "Removing data file left by an earlier run: {}",
        config.data_file.display()
    );
    fs::remove_file(&config.data_file).map_err(|e| {
        BenchError::Startup(format!("remove {}: {e}", config.data_file.display()))
    })
}

fn format_data_file(config: &EngineConfig) -> Result<()> {
    info!("Formatting engine data file {}", config.data_file.display());
    let output = Command::new(&config.binary)
        .arg("format")
        .arg(format!("--cluster={}", config.cluster_id))
        .arg(format!("--replica={}", config.replica))
        .arg(format!("--replica-count={}", config.replica_count))
        .arg("--development")
        .arg(&config.data_file)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BenchError::Startup(format!("run {} format: {e}", config.binary.display())))?;

    if !output.status.success() {
        return Err(BenchError::Startup(format!(
            "{} format exited with {}: {}",
            config.binary.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Resolve an engine address. A bare port means the loopback interface.
pub fn probe_address(address: &str) -> Result<SocketAddr> {
    let candidate = if address.chars().all(|c| c.is_ascii_digit()) {
        format!("127.0.0.1:{address}")
    } else {
        address.to_string()
    };
    candidate
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| BenchError::Startup(format!("cannot resolve engine address {address:?}")))
}

/// Wait for a listener on `target`, backing off exponentially between
/// attempts. `alive` is checked before every attempt so a server that died
/// during startup fails fast.
pub fn wait_until_ready(
    target: SocketAddr,
    attempts: u32,
    initial_backoff: Duration,
    mut alive: impl FnMut() -> Result<()>,
) -> Result<()> {
    let mut backoff = initial_backoff;
    for attempt in 1..=attempts.max(1) {
        alive()?;
        match TcpStream::connect_timeout(&target, CONNECT_TIMEOUT) {
            Ok(_) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!(
                    "Engine not ready on {target} (attempt {attempt}/{attempts}): {e}, retrying in {backoff:?}"
                );
                thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => {
                return Err(BenchError::Startup(format!(
                    "engine not ready on {target} after {attempts} attempts: {e}"
                )))
            }
        }
    }
    unreachable!("the final attempt returns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn unused_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    #[test]
    fn bare_port_means_loopback() {
        assert_eq!(
            probe_address("3000").unwrap(),
            "127.0.0.1:3000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            probe_address("127.0.0.1:3001").unwrap(),
            "127.0.0.1:3001".parse::<SocketAddr>().unwrap()
        );
        assert!(probe_address("not an address").is_err());
    }

    #[test]
    fn ready_when_listener_is_up() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let target = listener.local_addr().unwrap();
        wait_until_ready(target, 3, Duration::from_millis(1), || Ok(())).unwrap();
    }

    #[test]
    fn gives_up_after_bounded_attempts() {
        let target = unused_port();
        let mut checks = 0;
        let err = wait_until_ready(target, 3, Duration::from_millis(1), || {
            checks += 1;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(checks, 3);
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn dead_process_stops_the_probe() {
        let target = unused_port();
        let err = wait_until_ready(target, 5, Duration::from_millis(1), || {
            Err(BenchError::Startup("exited".into()))
        })
        .unwrap_err();
        assert!(matches!(err, BenchError::Startup(msg) if msg == "exited"));
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use super::unused_port;
        use std::fs;
        use std::net::TcpListener;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        /// Stand-in engine: `format` refuses an existing file, `start` idles
        /// (or complains on stderr and exits with `start_exit`).
        fn fake_engine(dir: &Path, start_exit: Option<i32>) -> PathBuf {
            let start = match start_exit {
                Some(code) => format!("echo 'starting'; echo 'replica 0: address in use' >&2; exit {code}"),
                None => "exec sleep 30".to_string(),
            };
            let script = format!(
                "#!/bin/sh\n\
                 for a in \"$@\"; do last=\"$a\"; done\n\
                 case \"$1\" in\n\
                 format) [ -e \"$last\" ] && {{ echo 'file exists' >&2; exit 1; }}; : > \"$last\" ;;\n\
                 start) {start} ;;\n\
                 esac\n"
            );
            let path = dir.join("engine.sh");
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn config(dir: &Path, binary: PathBuf, address: String) -> EngineConfig {
            EngineConfig {
                binary,
                data_file: dir.join("0_0.tigerbeetle"),
                address,
                ready_attempts: 3,
                ready_initial_backoff: Duration::from_millis(10),
                ..EngineConfig::default()
            }
        }

        #[test]
        fn launch_formats_starts_and_stops() {
            let dir = tempfile::tempdir().unwrap();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let address = listener.local_addr().unwrap().to_string();
            let config = config(dir.path(), fake_engine(dir.path(), None), address);

            let mut engine = EngineProcess::launch(&config).unwrap();
            assert!(config.data_file.exists());
            assert!(engine.is_running());
            assert!(engine.id().is_some());
            assert_eq!(engine.address(), config.address);
            assert_eq!(
                engine.stderr_log(),
                dir.path().join("0_0.tigerbeetle.stderr.log")
            );

            engine.stop().unwrap();
            assert!(!engine.is_running());
            engine.stop().unwrap();
        }

        #[test]
        fn stale_data_file_is_replaced() {
            let dir = tempfile::tempdir().unwrap();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let address = listener.local_addr().unwrap().to_string();
            let config = config(dir.path(), fake_engine(dir.path(), None), address);
            fs::write(&config.data_file, b"stale").unwrap();

            let engine = EngineProcess::launch(&config).unwrap();
            assert_eq!(fs::metadata(&config.data_file).unwrap().len(), 0);
            drop(engine);
        }

        #[test]
        fn stale_data_file_kept_when_not_fresh() {
            let dir = tempfile::tempdir().unwrap();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let address = listener.local_addr().unwrap().to_string();
            let mut config = config(dir.path(), fake_engine(dir.path(), None), address);
            config.fresh_data_file = false;
            fs::write(&config.data_file, b"stale").unwrap();

            let err = EngineProcess::launch(&config).unwrap_err();
            assert!(err.to_string().contains("file exists"));
        }

        #[test]
        fn early_exit_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let address = unused_port().to_string();
            let config = config(dir.path(), fake_engine(dir.path(), Some(3)), address);

            let err = EngineProcess::launch(&config).unwrap_err();
            let msg = err.to_string();
            assert!(
                msg.contains("exited before accepting") || msg.contains("not ready"),
                "unexpected error: {msg}"
            );
        }

        #[test]
        fn early_exit_quotes_engine_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let address = unused_port().to_string();
            let mut config = config(dir.path(), fake_engine(dir.path(), Some(1)), address);
            config.ready_attempts = 20;

            let msg = EngineProcess::launch(&config).unwrap_err().to_string();
            assert!(msg.contains("exited before accepting"), "unexpected error: {msg}");
            assert!(msg.contains("replica 0: address in use"), "unexpected error: {msg}");
            assert!(!msg.contains("starting"));
        }

        #[test]
        fn stderr_tail_keeps_last_lines() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("engine.stderr.log");
            let lines: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
            fs::write(&path, lines.join("\n")).unwrap();

            let tail = stderr_tail(&path);
            assert!(tail.starts_with("line 10\n"));
            assert!(tail.ends_with("line 29"));
            assert_eq!(stderr_tail(&dir.path().join("missing")), "");
        }

        #[test]
        fn missing_binary_is_a_startup_error() {
            let dir = tempfile::tempdir().unwrap();
            let config = config(
                dir.path(),
                dir.path().join("no-such-engine"),
                "3000".to_string(),
            );
            assert!(matches!(
                EngineProcess::launch(&config),
                Err(BenchError::Startup(_))
            ));
        }
    }
}
