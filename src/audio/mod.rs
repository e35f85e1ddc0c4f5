//! Microphone capture into a single encoded clip.

pub mod input;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use input::{AudioError, AudioInput, CaptureTrack, CommandAudioInput};

pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderState {
    pub is_recording: bool,
    /// Whole seconds since `start`.
    pub duration: u64,
    pub audio: Option<AudioClip>,
    pub error: Option<String>,
}

struct ActiveCapture {
    /// Asks the reader to stop the track and finish the clip.
    cancel: CancellationToken,
    /// Set by `reset`; the reader then leaves the state alone.
    abandon: CancellationToken,
    reader: JoinHandle<Option<AudioClip>>,
    ticker: JoinHandle<()>,
}

impl ActiveCapture {
    fn abandon(self) {
        self.abandon.cancel();
        self.cancel.cancel();
        self.ticker.abort();
    }
}

pub struct AudioRecorder {
    input: Arc<dyn AudioInput>,
    state: Arc<Mutex<RecorderState>>,
    active: Mutex<Option<ActiveCapture>>,
    lifecycle: tokio::sync::Mutex<()>,
}

impl AudioRecorder {
    pub fn new(input: Arc<dyn AudioInput>) -> Self {
        Self {
            input,
            state: Arc::new(Mutex::new(RecorderState::default())),
            active: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> RecorderState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().unwrap().is_recording
    }

    pub fn duration(&self) -> u64 {
        self.state.lock().unwrap().duration
    }

    /// Open the input and start buffering. A failure to open is recorded in
    /// the state's `error` rather than returned. If the input ends by itself
    /// the recording finishes early, with `error` set when the device failed.
    pub async fn start(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_recording() {
            return;
        }

        let track = match self.input.open().await {
            Ok(track) => track,
            Err(err) => {
                warn!(error = %err, "could not open audio input");
                let mut state = self.state.lock().unwrap();
                state.is_recording = false;
                state.error = Some(err.to_string());
                return;
            }
        };

        {
            let mut state = self.state.lock().unwrap();
            *state = RecorderState {
                is_recording: true,
                ..RecorderState::default()
            };
        }

        let cancel = CancellationToken::new();
        let abandon = CancellationToken::new();
        let reader = tokio::spawn(buffer_track(
            track,
            cancel.clone(),
            abandon.clone(),
            Arc::clone(&self.state),
        ));
        let ticker = tokio::spawn(count_seconds(Arc::clone(&self.state)));
        let previous = self.active.lock().unwrap().replace(ActiveCapture {
            cancel,
            abandon,
            reader,
            ticker,
        });
        if let Some(previous) = previous {
            previous.abandon();
        }
        debug!("recording started");
    }

    /// Stop recording and assemble the clip. Does nothing unless a capture
    /// was started.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let Some(active) = self.active.lock().unwrap().take() else {
            return;
        };

        active.ticker.abort();
        active.cancel.cancel();
        let finished = active.reader.await;
        let mut state = self.state.lock().unwrap();
        match finished {
            Ok(clip) => state.audio = clip,
            Err(err) => {
                warn!(error = %err, "capture task failed");
                state.is_recording = false;
                state.audio = None;
                state.error = Some("Recording failed".to_string());
            }
        }
        drop(state);
        debug!(duration = self.duration(), "recording stopped");
    }

    /// Hand the finished clip to the caller.
    pub fn take_audio(&self) -> Option<AudioClip> {
        self.state.lock().unwrap().audio.take()
    }

    /// Abandon any capture and return to the initial state.
    pub fn reset(&self) {
        if let Some(active) = self.active.lock().unwrap().take() {
            active.abandon();
        }
        *self.state.lock().unwrap() = RecorderState::default();
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        if let Some(active) = self.active.lock().unwrap().take() {
            active.abandon();
        }
    }
}

/// Buffer chunks until cancelled or until the track ends by itself, then
/// stop the track. Recording ends here; a failure lands in `error`, and the
/// clip is handed back for `stop` to publish.
async fn buffer_track(
    mut track: Box<dyn CaptureTrack>,
    cancel: CancellationToken,
    abandon: CancellationToken,
    state: Arc<Mutex<RecorderState>>,
) -> Option<AudioClip> {
    let mut bytes = Vec::new();
    let mut failure = None;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            chunk = track.next_chunk() => chunk,
        };
        match chunk {
            Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(None) => {
                debug!("audio input ended before stop");
                break;
            }
            Err(err) => {
                warn!(error = %err, "audio read failed");
                failure = Some(err);
                break;
            }
        }
    }

    if let Err(err) = track.stop().await {
        warn!(error = %err, "audio input did not stop cleanly");
        failure.get_or_insert(err);
    }
    // Whatever the encoder flushed on shutdown belongs to the clip.
    while let Ok(Some(chunk)) = track.next_chunk().await {
        bytes.extend_from_slice(&chunk);
    }

    let mut state = state.lock().unwrap();
    if abandon.is_cancelled() {
        return None;
    }
    state.is_recording = false;
    match failure {
        Some(err) => {
            state.error = Some(err.to_string());
            None
        }
        None => Some(AudioClip {
            mime_type: track.mime_type().to_string(),
            bytes,
        }),
    }
}

/// Adds a second per tick while recording; exits once recording ends.
async fn count_seconds(state: Arc<Mutex<RecorderState>>) {
    let period = Duration::from_secs(1);
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let mut state = state.lock().unwrap();
        if !state.is_recording {
            break;
        }
        state.duration += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FakeInput {
        chunks: Vec<&'static str>,
        fail: bool,
        /// The track ends by itself once its chunks run out.
        ends_early: bool,
        /// Reason reported by `stop` for a track that ended early.
        dies_with: Option<&'static str>,
        stopped: Arc<AtomicBool>,
    }

    impl FakeInput {
        fn new(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                fail: false,
                ends_early: false,
                dies_with: None,
                stopped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct FakeTrack {
        chunks: VecDeque<Vec<u8>>,
        ends_early: bool,
        dies_with: Option<&'static str>,
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl AudioInput for FakeInput {
        async fn open(&self) -> Result<Box<dyn CaptureTrack>, AudioError> {
            if self.fail {
                return Err(AudioError::Unavailable("permission denied".to_string()));
            }
            Ok(Box::new(FakeTrack {
                chunks: self.chunks.iter().map(|chunk| chunk.as_bytes().to_vec()).collect(),
                ends_early: self.ends_early || self.dies_with.is_some(),
                dies_with: self.dies_with,
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    #[async_trait]
    impl CaptureTrack for FakeTrack {
        fn mime_type(&self) -> &str {
            DEFAULT_MIME_TYPE
        }

        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, AudioError> {
            if let Some(chunk) = self.chunks.pop_front() {
                return Ok(Some(chunk));
            }
            if self.ends_early || self.stopped.load(Ordering::SeqCst) {
                return Ok(None);
            }
            std::future::pending::<Result<Option<Vec<u8>>, AudioError>>().await
        }

        async fn stop(&mut self) -> Result<(), AudioError> {
            self.stopped.store(true, Ordering::SeqCst);
            match self.dies_with {
                Some(reason) => Err(AudioError::Unavailable(reason.to_string())),
                None => Ok(()),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_start_is_a_no_op() {
        let recorder = AudioRecorder::new(Arc::new(FakeInput::new(vec!["x"])));
        recorder.stop().await;
        assert_eq!(recorder.snapshot(), RecorderState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_is_recorded_not_returned() {
        let mut input = FakeInput::new(Vec::new());
        input.fail = true;
        let recorder = AudioRecorder::new(Arc::new(input));

        recorder.start().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let state = recorder.snapshot();
        assert!(!state.is_recording);
        assert_eq!(state.duration, 0);
        assert_eq!(
            state.error.as_deref(),
            Some("audio input unavailable: permission denied")
        );
        assert!(state.audio.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn records_counts_seconds_and_joins_chunks() {
        let input = FakeInput::new(vec!["web", "m-", "data"]);
        let stopped = Arc::clone(&input.stopped);
        let recorder = AudioRecorder::new(Arc::new(input));

        recorder.start().await;
        assert!(recorder.is_recording());
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(recorder.duration(), 3);

        recorder.stop().await;
        assert!(stopped.load(Ordering::SeqCst));
        let state = recorder.snapshot();
        assert!(!state.is_recording);
        assert_eq!(
            state.audio,
            Some(AudioClip {
                mime_type: "audio/webm".to_string(),
                bytes: b"webm-data".to_vec(),
            })
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.duration(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn take_audio_hands_over_once_and_reset_clears() {
        let recorder = AudioRecorder::new(Arc::new(FakeInput::new(vec!["abc"])));
        recorder.start().await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        recorder.stop().await;

        assert_eq!(recorder.take_audio().map(|clip| clip.bytes), Some(b"abc".to_vec()));
        assert_eq!(recorder.take_audio(), None);

        recorder.reset();
        assert_eq!(recorder.snapshot(), RecorderState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_recording_stops_the_counter() {
        let recorder = AudioRecorder::new(Arc::new(FakeInput::new(Vec::new())));
        recorder.start().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        recorder.reset();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(recorder.snapshot(), RecorderState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn device_that_dies_ends_the_recording_with_an_error() {
        let mut input = FakeInput::new(vec!["partial"]);
        input.dies_with = Some("no such device");
        let recorder = AudioRecorder::new(Arc::new(input));

        recorder.start().await;
        tokio::time::sleep(Duration::from_millis(2300)).await;

        let state = recorder.snapshot();
        assert!(!state.is_recording);
        assert_eq!(state.duration, 0);
        assert_eq!(
            state.error.as_deref(),
            Some("audio input unavailable: no such device")
        );
        assert!(state.audio.is_none());

        recorder.stop().await;
        assert_eq!(recorder.snapshot(), state);
    }

    #[tokio::test(start_paused = true)]
    async fn input_that_finishes_by_itself_yields_the_clip() {
        let mut input = FakeInput::new(vec!["short", "-clip"]);
        input.ends_early = true;
        let recorder = AudioRecorder::new(Arc::new(input));

        recorder.start().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!recorder.is_recording());
        assert_eq!(recorder.duration(), 0);
        assert!(recorder.snapshot().audio.is_none());

        recorder.stop().await;
        assert_eq!(
            recorder.take_audio().map(|clip| clip.bytes),
            Some(b"short-clip".to_vec())
        );
        assert_eq!(recorder.snapshot().error, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn recorder_process_exiting_with_failure_reports_its_stderr() {
        let input = CommandAudioInput::new(
            vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo 'no such device' >&2; exit 1".to_string(),
            ],
            DEFAULT_MIME_TYPE,
        );
        let recorder = AudioRecorder::new(Arc::new(input));

        recorder.start().await;
        tokio::time::timeout(Duration::from_secs(10), async {
            while recorder.is_recording() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("recording should end when the recorder exits");

        let state = recorder.snapshot();
        assert_eq!(
            state.error.as_deref(),
            Some("audio input unavailable: no such device")
        );
        assert!(state.audio.is_none());

        recorder.stop().await;
        assert!(recorder.take_audio().is_none());
    }
}
