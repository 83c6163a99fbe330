// src/backends/runner.rs

//! External command execution
//!
//! Every backend talks to its package manager through [`CommandRunner`], so
//! adapters can be driven by canned output in tests. [`SystemRunner`] is the
//! production implementation: it bounds each child process with a timeout
//! and kills it when the timeout expires.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default per-invocation timeout for external commands
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or None when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs on behalf of backend adapters
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion
    ///
    /// Returns None when the program is missing, cannot be spawned, or
    /// exceeds the runner's timeout.
    fn run(&self, program: &str, args: &[&str]) -> Option<CommandOutput>;

    /// Whether `program` resolves on the search path
    fn has_command(&self, program: &str) -> bool;
}

/// Runs commands on the host
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = pipe {
                let _ = pipe.read_to_end(&mut buf);
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    }

    fn kill(child: &mut Child, program: &str) {
        if let Err(e) = child.kill() {
            debug!("Failed to kill {}: {}", program, e);
        }
        let _ = child.wait();
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let mut child = match Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!("Failed to spawn {}: {}", program, e);
                return None;
            }
        };

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout = Self::drain(child.stdout.take());
        let stderr = Self::drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!(
                        "{} timed out after {:.1}s, killing it",
                        program,
                        self.timeout.as_secs_f64()
                    );
                    Self::kill(&mut child, program);
                    return None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    warn!("Failed to wait for {}: {}", program, e);
                    Self::kill(&mut child, program);
                    return None;
                }
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        Some(CommandOutput {
            status: status.code(),
            stdout,
            stderr,
        })
    }

    fn has_command(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Canned-output runner for adapter tests

    use super::{CommandOutput, CommandRunner};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct FakeRunner {
        outputs: HashMap<String, CommandOutput>,
        commands: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `program args...` with a successful run printing `stdout`
        pub fn with_output(self, command_line: &str, stdout: &str) -> Self {
            self.with_status(command_line, 0, stdout)
        }

        pub fn with_status(mut self, command_line: &str, status: i32, stdout: &str) -> Self {
            if let Some(program) = command_line.split_whitespace().next() {
                self.commands.insert(program.to_string());
            }
            self.outputs.insert(
                command_line.to_string(),
                CommandOutput {
                    status: Some(status),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            );
            self
        }

        /// Make `program` resolvable without canning any output for it
        pub fn with_command(mut self, program: &str) -> Self {
            self.commands.insert(program.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.calls.lock().unwrap().push(line.clone());
            self.outputs.get(&line).cloned()
        }

        fn has_command(&self, program: &str) -> bool {
            self.commands.contains(program)
        }
    }
}
