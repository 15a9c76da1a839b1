//! Subprocess execution.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::error::EngineError;

/// Callback receiving each line the program writes, stdout and stderr merged.
pub type LineSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Runs an argument vector to completion and reports its exit code.
///
/// `argv[0]` is the program, the rest are its arguments, passed without any
/// shell interpretation.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, argv: &[String], on_line: LineSink<'_>) -> Result<i32, EngineError>;
}

/// Spawns real processes with tokio.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(&self, argv: &[String], on_line: LineSink<'_>) -> Result<i32, EngineError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| EngineError::invalid_parameter("empty command line"))?;

        debug!("Running: {:?}", argv);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::BinaryNotFound {
                    path: PathBuf::from(program),
                }
            } else {
                EngineError::Io(e)
            }
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, tx.clone());
        }
        drop(tx);

        // Channel closes once both pipes hit EOF.
        while let Some(line) = rx.recv().await {
            trace!("{}", line);
            on_line(&line);
        }

        let status = child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }
}

fn spawn_line_reader<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        // The pipe stays open until EOF whatever the bytes decode to.
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    // A closed receiver only means nobody listens; keep draining.
                    let _ = tx.send(line);
                }
                Err(e) => {
                    debug!("Stopped reading subprocess output: {}", e);
                    break;
                }
            }
        }
    });
}
