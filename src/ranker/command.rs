use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::{CancelToken, RankRequest, TastinessRanker};
use crate::error::RankerError;
use crate::planner::constants::RANKER_POLL_INTERVAL_MS;

/// Ranker backed by an external program.
///
/// The request is written to the child's stdin as JSON and the child's stdout
/// is taken as the answer. The child is killed if the call is cancelled.
#[derive(Debug, Clone)]
pub struct CommandRanker {
    program: String,
    args: Vec<String>,
}

impl CommandRanker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace: the first word is the program.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }
}

impl TastinessRanker for CommandRanker {
    fn name(&self) -> &str {
        &self.program
    }

    fn rank(&self, request: &RankRequest, cancel: &CancelToken) -> Result<String, RankerError> {
        let payload = serde_json::to_vec(request).map_err(|e| RankerError::Failed(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Feed and drain on separate threads so a chatty child can't block us.
        if let Some(mut stdin) = child.stdin.take() {
            thread::spawn(move || {
                let _ = stdin.write_all(&payload);
            });
        }
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut out = String::new();
                stdout.read_to_string(&mut out).map(|_| out)
            })
        });

        let poll = Duration::from_millis(RANKER_POLL_INTERVAL_MS);
        let status = loop {
            if cancel.is_cancelled() {
                debug!(program = %self.program, "killing cancelled ranker process");
                let _ = child.kill();
                let _ = child.wait();
                return Err(RankerError::Cancelled);
            }
            match child.try_wait()? {
                Some(status) => break status,
                None => thread::sleep(poll),
            }
        };

        if !status.success() {
            return Err(RankerError::Failed(format!("{} exited with {status}", self.program)));
        }

        match reader {
            Some(handle) => handle
                .join()
                .map_err(|_| RankerError::Failed("stdout reader panicked".to_string()))?
                .map_err(RankerError::from),
            None => Ok(String::new()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use super::*;

    fn request() -> RankRequest {
        RankRequest {
            system: "sys".to_string(),
            prompt: "pick".to_string(),
            options: Vec::new(),
        }
    }

    fn sh(script: &str) -> CommandRanker {
        CommandRanker::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_reads_child_stdout() {
        let ranker = sh("cat > /dev/null; echo '{\"items\": []}'");
        let out = ranker.rank(&request(), &CancelToken::new()).unwrap();
        assert_eq!(out.trim(), "{\"items\": []}");
    }

    #[test]
    fn test_child_sees_request_json() {
        let ranker = sh("cat");
        let out = ranker.rank(&request(), &CancelToken::new()).unwrap();
        let echoed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(echoed["prompt"], "pick");
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let ranker = sh("exit 3");
        let err = ranker.rank(&request(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, RankerError::Failed(_)));
    }

    #[test]
    fn test_cancel_kills_child() {
        let ranker = sh("sleep 30");
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.cancel();
        });

        let start = Instant::now();
        let err = ranker.rank(&request(), &cancel).unwrap_err();
        assert!(matches!(err, RankerError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_command_line_split() {
        let ranker = CommandRanker::from_command_line("python3 rank.py --model small").unwrap();
        assert_eq!(ranker.name(), "python3");
        assert_eq!(ranker.args, vec!["rank.py", "--model", "small"]);
        assert!(CommandRanker::from_command_line("   ").is_none());
    }
}
