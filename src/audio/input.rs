use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8 * 1024;
const STOP_GRACE: Duration = Duration::from_secs(3);
const STDERR_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum AudioError {
    /// No capture device, or the recorder could not be started.
    Unavailable(String),
    Io(std::io::Error),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Unavailable(reason) => write!(f, "audio input unavailable: {reason}"),
            AudioError::Io(err) => write!(f, "audio input failed: {err}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Io(err) => Some(err),
            AudioError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Io(err)
    }
}

/// A source of encoded audio, e.g. a microphone behind an encoder.
#[async_trait]
pub trait AudioInput: Send + Sync {
    async fn open(&self) -> Result<Box<dyn CaptureTrack>, AudioError>;
}

/// An open capture. Chunks are encoded bytes in `mime_type`.
#[async_trait]
pub trait CaptureTrack: Send {
    fn mime_type(&self) -> &str;

    /// The next chunk, or `None` once the track has ended.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, AudioError>;

    /// Release the device. Chunks already produced can still be drained with
    /// [`CaptureTrack::next_chunk`].
    async fn stop(&mut self) -> Result<(), AudioError>;
}

/// Captures by running an external recorder that writes encoded audio to
/// stdout (for example `ffmpeg ... -f webm -`).
#[derive(Debug, Clone)]
pub struct CommandAudioInput {
    argv: Vec<String>,
    mime_type: String,
    stop_input: Option<String>,
    stop_grace: Duration,
}

impl CommandAudioInput {
    pub fn new(argv: Vec<String>, mime_type: impl Into<String>) -> Self {
        Self {
            argv,
            mime_type: mime_type.into(),
            stop_input: None,
            stop_grace: STOP_GRACE,
        }
    }

    /// Bytes written to the recorder's stdin to ask it to finish, e.g. `q`
    /// for ffmpeg. Stdin is closed afterwards either way.
    pub fn with_stop_input(mut self, stop_input: impl Into<String>) -> Self {
        self.stop_input = Some(stop_input.into()).filter(|input| !input.is_empty());
        self
    }

    /// How long a recorder may take to flush after being asked to stop
    /// before it is killed.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }
}

#[async_trait]
impl AudioInput for CommandAudioInput {
    async fn open(&self) -> Result<Box<dyn CaptureTrack>, AudioError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(AudioError::Unavailable(
                "no recorder command configured".to_string(),
            ));
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AudioError::Unavailable(format!("{program}: {err}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AudioError::Unavailable(format!("{program}: no stdout")))?;
        let stderr = child.stderr.take().map(|stderr| tokio::spawn(last_stderr_line(stderr)));
        debug!(%program, "recorder process started");

        Ok(Box::new(CommandTrack {
            program: program.clone(),
            stdin: child.stdin.take(),
            child,
            stdout,
            stderr,
            pending: Vec::new(),
            stdout_closed: false,
            stop_input: self.stop_input.clone(),
            stop_grace: self.stop_grace,
            mime_type: self.mime_type.clone(),
        }))
    }
}

/// Keeps draining the recorder's stderr so it never blocks on a full pipe,
/// and returns the last non-empty line.
async fn last_stderr_line(stderr: ChildStderr) -> Option<String> {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    let mut last = None;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim();
                if !text.is_empty() {
                    last = Some(text.to_string());
                }
            }
        }
    }
    last
}

struct CommandTrack {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<Option<String>>>,
    /// Output flushed while waiting for the recorder to exit.
    pending: Vec<u8>,
    /// Set once stdout reaches EOF on its own.
    stdout_closed: bool,
    stop_input: Option<String>,
    stop_grace: Duration,
    mime_type: String,
}

impl CommandTrack {
    /// Turn an exit the recorder chose itself into an error when it failed.
    async fn check_exit(&mut self, status: ExitStatus) -> Result<(), AudioError> {
        debug!(program = %self.program, ?status, "recorder process exited");
        if status.success() {
            return Ok(());
        }
        let reason = match self.stderr.take() {
            Some(handle) => tokio::time::timeout(STDERR_WAIT, handle)
                .await
                .ok()
                .and_then(Result::ok)
                .flatten(),
            None => None,
        };
        Err(AudioError::Unavailable(reason.unwrap_or_else(|| {
            format!("{} exited with {status}", self.program)
        })))
    }

    /// Wait for the child while still reading its stdout, so a recorder
    /// flushing a large trailer cannot stall on a full pipe.
    async fn wait_draining(&mut self) -> Option<std::io::Result<ExitStatus>> {
        let Self {
            child,
            stdout,
            pending,
            stop_grace,
            ..
        } = self;
        let drain = async move {
            let mut buf = vec![0_u8; READ_CHUNK];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => pending.extend_from_slice(&buf[..read]),
                }
            }
        };
        let wait = async move {
            let (_, status) = tokio::join!(drain, child.wait());
            status
        };
        tokio::time::timeout(*stop_grace, wait).await.ok()
    }
}

#[async_trait]
impl CaptureTrack for CommandTrack {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, AudioError> {
        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        let mut buf = vec![0_u8; READ_CHUNK];
        let read = self.stdout.read(&mut buf).await?;
        if read == 0 {
            self.stdout_closed = true;
            return Ok(None);
        }
        buf.truncate(read);
        Ok(Some(buf))
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(status) = self.child.try_wait()? {
            return self.check_exit(status).await;
        }

        // A recorder that closed stdout by itself is ending on its own terms;
        // its exit status decides whether the capture failed.
        let ending_on_its_own = self.stdout_closed;
        if let Some(mut stdin) = self.stdin.take() {
            if let Some(stop_input) = self.stop_input.as_deref() {
                if let Err(err) = stdin.write_all(stop_input.as_bytes()).await {
                    debug!(error = %err, "recorder stdin already closed");
                }
                let _ = stdin.flush().await;
            }
        }

        match self.wait_draining().await {
            Some(status) if ending_on_its_own => self.check_exit(status?).await,
            Some(status) => {
                let status = status?;
                debug!(program = %self.program, ?status, "recorder finished");
                Ok(())
            }
            None => {
                warn!(program = %self.program, "recorder ignored stop request, killing it");
                self.child.start_kill()?;
                let status = self.child.wait().await?;
                debug!(?status, "recorder process killed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let input = CommandAudioInput::new(
            vec!["kindred-no-such-recorder".to_string()],
            "audio/webm",
        );
        let Err(err) = input.open().await else {
            panic!("spawn should fail");
        };
        assert!(matches!(err, AudioError::Unavailable(_)));
    }

    #[tokio::test]
    async fn empty_command_is_unavailable() {
        let input = CommandAudioInput::new(Vec::new(), "audio/webm");
        assert!(input.open().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reads_recorder_stdout_until_exit() {
        let input = CommandAudioInput::new(
            vec!["sh".to_string(), "-c".to_string(), "printf abc".to_string()],
            "audio/webm",
        );
        let mut track = input.open().await.expect("sh should spawn");
        assert_eq!(track.mime_type(), "audio/webm");

        let mut bytes = Vec::new();
        while let Some(chunk) = track.next_chunk().await.expect("read") {
            bytes.extend(chunk);
        }
        assert_eq!(bytes, b"abc");
        track.stop().await.expect("stop");
    }

    #[cfg(unix)]
    fn sh(script: &str) -> CommandAudioInput {
        CommandAudioInput::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            "audio/webm",
        )
    }

    #[cfg(unix)]
    async fn read_all(track: &mut Box<dyn CaptureTrack>) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Ok(Some(chunk)) = track.next_chunk().await {
            bytes.extend(chunk);
        }
        bytes
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn recorder_that_fails_on_its_own_reports_stderr() {
        let mut track = sh("echo 'no such device' >&2; exit 1")
            .open()
            .await
            .expect("sh should spawn");
        assert!(read_all(&mut track).await.is_empty());

        let Err(AudioError::Unavailable(reason)) = track.stop().await else {
            panic!("a failed recorder should be reported");
        };
        assert_eq!(reason, "no such device");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_lets_the_recorder_write_its_trailer() {
        // Waits for the stop sequence on stdin, then finalizes like an encoder.
        let mut track = sh("printf head; read -r cmd; printf \"tail-$cmd\"")
            .with_stop_input("q\n")
            .open()
            .await
            .expect("sh should spawn");

        let first = track.next_chunk().await.expect("read").expect("header");
        assert_eq!(first, b"head");

        track.stop().await.expect("graceful stop");
        assert_eq!(read_all(&mut track).await, b"tail-q");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn closing_stdin_is_enough_without_a_stop_sequence() {
        let mut track = sh("cat >/dev/null; printf done")
            .open()
            .await
            .expect("sh should spawn");

        track.stop().await.expect("graceful stop");
        assert_eq!(read_all(&mut track).await, b"done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn recorder_ignoring_the_stop_request_is_killed() {
        let mut track = sh("exec sleep 30")
            .with_stop_grace(Duration::from_millis(100))
            .open()
            .await
            .expect("sh should spawn");

        tokio::time::timeout(Duration::from_secs(5), track.stop())
            .await
            .expect("stop should not wait for the recorder")
            .expect("killing is not an error");
        assert!(read_all(&mut track).await.is_empty());
    }
}
