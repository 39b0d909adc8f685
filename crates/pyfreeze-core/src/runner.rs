//! Single-flight execution of the packaging command.
//!
//! A build moves through launch, streaming and termination on one worker
//! thread. Its stdout and stderr are piped and merged into a single line
//! stream, forwarded to the caller as [`BuildEvent::Output`] messages over
//! an mpsc channel so the caller's thread is never blocked. At most one
//! build is in flight per [`BuildRunner`]; a second start request is
//! rejected, not queued, so overlapping invocations can never race on the
//! shared temporary icon file.
//!
//! Cancellation is not supported: a launched build runs to completion.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

/// Number of trailing output lines kept for failure diagnostics.
pub const TAIL_LINES: usize = 50;

/// Messages delivered to the observer while a build runs.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// One line of merged stdout/stderr output.
    Output(String),
    /// Terminal event; the runner is idle again once this is sent.
    Finished(BuildOutcome),
}

/// Terminal outcome of one build.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The process exited with code 0.
    Success,
    /// The process exited with a nonzero code (or was killed by a signal,
    /// in which case `exit_code` is `None`).
    Failed {
        exit_code: Option<i32>,
        /// The last [`TAIL_LINES`] lines of merged output.
        tail: Vec<String>,
    },
    /// The process could not be spawned at all.
    LaunchFailed { message: String },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// Errors from a start request, before any process is spawned.
#[derive(Debug, PartialEq, Eq)]
pub enum RunnerError {
    /// A build is already streaming; the request is rejected.
    InFlight,
    /// The command has no program token.
    EmptyCommand,
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::InFlight => write!(f, "a build is already running"),
            RunnerError::EmptyCommand => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for RunnerError {}

/// Executes build commands on a background worker, one at a time.
pub struct BuildRunner {
    in_flight: Arc<AtomicBool>,
}

impl BuildRunner {
    pub fn new() -> Self {
        BuildRunner {
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a build is currently in flight.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Launch `argv` on a worker thread, streaming events to `events`.
    ///
    /// Returns immediately. The worker releases the in-flight guard before
    /// sending [`BuildEvent::Finished`], so a caller reacting to the
    /// terminal event can start the next build right away.
    pub fn start(&self, argv: Vec<String>, events: Sender<BuildEvent>) -> Result<(), RunnerError> {
        if argv.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RunnerError::InFlight);
        }

        let in_flight = Arc::clone(&self.in_flight);
        thread::spawn(move || {
            let outcome = run_to_completion(&argv, &events);
            in_flight.store(false, Ordering::SeqCst);
            let _ = events.send(BuildEvent::Finished(outcome));
        });

        Ok(())
    }
}

impl Default for BuildRunner {
    fn default() -> Self {
        BuildRunner::new()
    }
}

/// Spawn the process, forward its merged output and wait for termination.
fn run_to_completion(argv: &[String], events: &Sender<BuildEvent>) -> BuildOutcome {
    let mut child = match Command::new(&argv[0])
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return BuildOutcome::LaunchFailed {
                message: format!("failed to launch '{}': {}", argv[0], e),
            };
        }
    };

    // Merge stdout and stderr: one forwarder thread per pipe, both feeding
    // the same line channel. The channel closes when both pipes do.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    let mut forwarders = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(spawn_forwarder(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(spawn_forwarder(stderr, line_tx.clone()));
    }
    drop(line_tx);

    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    for line in line_rx {
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.clone());
        let _ = events.send(BuildEvent::Output(line));
    }
    for handle in forwarders {
        let _ = handle.join();
    }

    match child.wait() {
        Ok(status) if status.success() => BuildOutcome::Success,
        Ok(status) => BuildOutcome::Failed {
            exit_code: status.code(),
            tail: tail.into(),
        },
        Err(e) => BuildOutcome::LaunchFailed {
            message: format!("failed to wait for '{}': {}", argv[0], e),
        },
    }
}

fn spawn_forwarder<R: Read + Send + 'static>(stream: R, tx: Sender<String>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::time::Duration;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    /// Drain events until the terminal one arrives.
    fn collect(rx: &Receiver<BuildEvent>) -> (Vec<String>, BuildOutcome) {
        let mut lines = Vec::new();
        loop {
            match rx.recv_timeout(Duration::from_secs(10)).expect("build did not finish") {
                BuildEvent::Output(line) => lines.push(line),
                BuildEvent::Finished(outcome) => return (lines, outcome),
            }
        }
    }

    #[test]
    fn empty_command_is_rejected_before_spawning() {
        let runner = BuildRunner::new();
        let (tx, _rx) = mpsc::channel();
        assert_eq!(runner.start(Vec::new(), tx), Err(RunnerError::EmptyCommand));
        assert!(!runner.is_running());
    }

    #[test]
    fn missing_executable_is_a_launch_failure() {
        let runner = BuildRunner::new();
        let (tx, rx) = mpsc::channel();
        runner
            .start(argv(&["pyfreeze-no-such-binary"]), tx)
            .unwrap();

        let (lines, outcome) = collect(&rx);
        assert!(lines.is_empty());
        assert!(matches!(outcome, BuildOutcome::LaunchFailed { .. }));
        // Guard is released before the terminal event is sent.
        assert!(!runner.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_maps_to_success_with_streamed_output() {
        let runner = BuildRunner::new();
        let (tx, rx) = mpsc::channel();
        runner
            .start(argv(&["sh", "-c", "echo building; echo done"]), tx)
            .unwrap();

        let (lines, outcome) = collect(&rx);
        assert!(outcome.is_success());
        assert_eq!(lines, vec!["building", "done"]);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_maps_to_failure_with_code_and_merged_tail() {
        let runner = BuildRunner::new();
        let (tx, rx) = mpsc::channel();
        runner
            .start(argv(&["sh", "-c", "echo out; echo err 1>&2; exit 3"]), tx)
            .unwrap();

        let (lines, outcome) = collect(&rx);
        // stderr is merged into the same stream as stdout
        assert!(lines.contains(&"out".to_string()));
        assert!(lines.contains(&"err".to_string()));
        match outcome {
            BuildOutcome::Failed { exit_code, tail } => {
                assert_eq!(exit_code, Some(3));
                assert!(tail.contains(&"out".to_string()));
                assert!(tail.contains(&"err".to_string()));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn second_start_while_streaming_is_rejected() {
        let runner = BuildRunner::new();
        let (tx, rx) = mpsc::channel();
        runner.start(argv(&["sh", "-c", "sleep 1"]), tx).unwrap();
        assert!(runner.is_running());

        let (tx2, _rx2) = mpsc::channel();
        assert_eq!(
            runner.start(argv(&["sh", "-c", "echo second"]), tx2),
            Err(RunnerError::InFlight)
        );

        let (_, outcome) = collect(&rx);
        assert!(outcome.is_success());

        // After the terminal event the runner accepts a new build.
        let (tx3, rx3) = mpsc::channel();
        runner.start(argv(&["sh", "-c", "echo third"]), tx3).unwrap();
        let (lines, outcome) = collect(&rx3);
        assert!(outcome.is_success());
        assert_eq!(lines, vec!["third"]);
    }
}
