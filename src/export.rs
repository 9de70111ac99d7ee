//! Export pipeline: capture the composited surface in real time, record
//! it into a container stream, and deliver the finished file.
//!
//! **Flow**: `start` negotiates a codec, switches the composition into
//! export mode (live video frames instead of posters), rewinds and starts
//! every clip, and routes their audio into the mixer. Each `tick` advances
//! playback, renders, captures due frames at the output rate, and reports
//! progress. When the capture target is reached the session finalizes:
//! mixed audio and trailer packets are appended, the chunks concatenate
//! into one file delivered through the [`DownloadSink`], and playback is
//! torn down.
//!
//! **Why traits at the seams**: real encoding and real file delivery are
//! embedder concerns. [`Recorder`] and [`DownloadSink`] keep the control
//! flow (state machine, progress, teardown, failure paths) fully
//! exercisable with the built-in packet recorder and an in-memory sink.

use anyhow::Context;
use log::{info, warn};

use crate::audio::AudioMixer;
use crate::entities::comp::Composition;
use crate::entities::frame::Frame;
use crate::entities::layer::LayerId;
use crate::utils::epoch_ms;

/// Output container/codec pairs, in preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportCodec {
    Mp4H264,
    WebmVp9,
}

impl ExportCodec {
    /// Preference order for negotiation.
    pub fn preference() -> [ExportCodec; 2] {
        [ExportCodec::Mp4H264, ExportCodec::WebmVp9]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportCodec::Mp4H264 => "mp4",
            ExportCodec::WebmVp9 => "webm",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportCodec::Mp4H264 => "video/mp4",
            ExportCodec::WebmVp9 => "video/webm",
        }
    }
}

impl std::fmt::Display for ExportCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportCodec::Mp4H264 => write!(f, "H.264/MP4"),
            ExportCodec::WebmVp9 => write!(f, "VP9/WebM"),
        }
    }
}

/// What the runtime can actually encode.
pub trait CodecSupport {
    fn supports(&self, codec: ExportCodec) -> bool;
}

/// Assumes both codecs are available.
pub struct DefaultCodecSupport;

impl CodecSupport for DefaultCodecSupport {
    fn supports(&self, _codec: ExportCodec) -> bool {
        true
    }
}

/// Export tuning knobs.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ExportSettings {
    /// Output frame rate.
    pub fps: f32,
    /// Capture length when no source defines a duration.
    pub default_duration: f32,
    /// Seconds between progress reports.
    pub progress_interval: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            default_duration: 5.0,
            progress_interval: 0.1,
        }
    }
}

/// Session lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportState {
    Idle,
    Capturing,
    Finalizing,
    Failed(String),
}

/// Export pipeline errors.
#[derive(Debug)]
pub enum ExportError {
    AlreadyExporting,
    NoSupportedCodec,
    Record(anyhow::Error),
    Deliver(anyhow::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::AlreadyExporting => write!(f, "An export is already in progress"),
            ExportError::NoSupportedCodec => write!(f, "No supported export codec available"),
            ExportError::Record(e) => write!(f, "Recording failed: {}", e),
            ExportError::Deliver(e) => write!(f, "Delivery failed: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Stream recorder seam. Every call may emit container bytes.
pub trait Recorder {
    /// Open the stream. Returns header bytes.
    fn start(
        &mut self,
        codec: ExportCodec,
        width: usize,
        height: usize,
        fps: f32,
    ) -> anyhow::Result<Vec<u8>>;

    /// Encode one captured frame at the given presentation timestamp.
    fn push_frame(&mut self, frame: &Frame, pts: f32) -> anyhow::Result<Vec<u8>>;

    /// Close the stream, attaching the mixed audio track when present.
    /// Returns trailing chunks.
    fn finish(&mut self, audio: Option<(&[f32], u32)>) -> anyhow::Result<Vec<Vec<u8>>>;
}

/// Built-in recorder producing a length-prefixed packet stream.
///
/// Not a real codec: each frame lands as a raw RGBA packet so the whole
/// pipeline (capture cadence, chunk collection, finalize, delivery) runs
/// end to end without an encoder dependency. Swap in a real [`Recorder`]
/// for playable output.
#[derive(Debug, Default)]
pub struct PacketRecorder {
    frames: u64,
}

const PACKET_MAGIC: &[u8; 4] = b"MIXA";

impl PacketRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recorder for PacketRecorder {
    fn start(
        &mut self,
        codec: ExportCodec,
        width: usize,
        height: usize,
        fps: f32,
    ) -> anyhow::Result<Vec<u8>> {
        self.frames = 0;
        let mut header = Vec::with_capacity(17);
        header.extend_from_slice(PACKET_MAGIC);
        header.push(match codec {
            ExportCodec::Mp4H264 => 0,
            ExportCodec::WebmVp9 => 1,
        });
        header.extend_from_slice(&(width as u32).to_le_bytes());
        header.extend_from_slice(&(height as u32).to_le_bytes());
        header.extend_from_slice(&fps.to_le_bytes());
        Ok(header)
    }

    fn push_frame(&mut self, frame: &Frame, pts: f32) -> anyhow::Result<Vec<u8>> {
        self.frames += 1;
        let payload = frame.buffer();
        let mut packet = Vec::with_capacity(9 + payload.len());
        packet.push(b'F');
        packet.extend_from_slice(&pts.to_le_bytes());
        packet.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        packet.extend_from_slice(payload);
        Ok(packet)
    }

    fn finish(&mut self, audio: Option<(&[f32], u32)>) -> anyhow::Result<Vec<Vec<u8>>> {
        let mut chunks = Vec::new();
        if let Some((samples, rate)) = audio {
            let mut packet = Vec::with_capacity(9 + samples.len() * 4);
            packet.push(b'A');
            packet.extend_from_slice(&rate.to_le_bytes());
            packet.extend_from_slice(&(samples.len() as u32).to_le_bytes());
            for s in samples {
                packet.extend_from_slice(&s.to_le_bytes());
            }
            chunks.push(packet);
        }
        let mut trailer = Vec::with_capacity(9);
        trailer.push(b'E');
        trailer.extend_from_slice(&self.frames.to_le_bytes());
        chunks.push(trailer);
        Ok(chunks)
    }
}

/// Where the finished file goes.
pub trait DownloadSink {
    fn deliver(&mut self, file_name: &str, mime: &str, data: &[u8]) -> anyhow::Result<()>;
}

/// Writes the finished file into a directory.
pub struct FileSink {
    dir: std::path::PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileSink {
    fn deliver(&mut self, file_name: &str, _mime: &str, data: &[u8]) -> anyhow::Result<()> {
        let path = self.dir.join(file_name);
        std::fs::write(&path, data)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        info!("Wrote export to {}", path.display());
        Ok(())
    }
}

/// One capture-record-deliver session over a [`Composition`].
pub struct ExportSession {
    settings: ExportSettings,
    state: ExportState,
    recorder: Box<dyn Recorder>,
    sink: Box<dyn DownloadSink>,
    codec: Option<ExportCodec>,
    mixer: Option<AudioMixer>,
    chunks: Vec<Vec<u8>>,
    elapsed: f32,
    target: f32,
    frames_captured: u64,
    since_report: f32,
    last_file_name: Option<String>,
}

impl ExportSession {
    pub fn new(
        recorder: Box<dyn Recorder>,
        sink: Box<dyn DownloadSink>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            settings,
            state: ExportState::Idle,
            recorder,
            sink,
            codec: None,
            mixer: None,
            chunks: Vec::new(),
            elapsed: 0.0,
            target: 0.0,
            frames_captured: 0,
            since_report: 0.0,
            last_file_name: None,
        }
    }

    /// Packet recorder writing into `dir`, with default settings.
    pub fn to_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(
            Box::new(PacketRecorder::new()),
            Box::new(FileSink::new(dir)),
            ExportSettings::default(),
        )
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn codec(&self) -> Option<ExportCodec> {
        self.codec
    }

    /// Name of the most recently delivered file.
    pub fn last_file_name(&self) -> Option<&str> {
        self.last_file_name.as_deref()
    }

    /// Begin capturing.
    ///
    /// Negotiates a codec in preference order, switches the composition
    /// into export mode, rewinds and starts every video clip, and routes
    /// their audio. The capture target is the composition duration, or the
    /// default when nothing defines one.
    pub fn start(
        &mut self,
        comp: &mut Composition,
        support: &dyn CodecSupport,
    ) -> Result<(), ExportError> {
        if self.state == ExportState::Capturing {
            return Err(ExportError::AlreadyExporting);
        }

        let codec = ExportCodec::preference()
            .into_iter()
            .find(|c| support.supports(*c))
            .ok_or(ExportError::NoSupportedCodec)?;
        if codec != ExportCodec::Mp4H264 {
            warn!("H.264/MP4 unavailable, falling back to {}", codec);
        }

        self.codec = Some(codec);
        self.chunks.clear();
        self.elapsed = 0.0;
        self.since_report = 0.0;
        self.frames_captured = 0;
        // The background layer drives the capture length; other layers'
        // clips do not extend it.
        self.target = comp
            .layer(LayerId::Background)
            .source()
            .duration()
            .unwrap_or(self.settings.default_duration);

        comp.set_exporting(true);

        let mut mixer = AudioMixer::new();
        for id in LayerId::all() {
            let layer = comp.layer_mut(id);
            if let Some(clip) = layer.source_mut().as_video_mut() {
                clip.rewind();
                clip.set_muted(false);
                clip.play();
                if let Some(track) = clip.audio() {
                    if let Err(e) = mixer.route(id.name(), track) {
                        warn!("Skipping {} layer audio: {}", id, e);
                    }
                }
            }
        }
        self.mixer = Some(mixer);

        let (width, height) = comp.resolution();
        match self.recorder.start(codec, width, height, self.settings.fps) {
            Ok(header) => self.chunks.push(header),
            Err(e) => {
                self.teardown(comp);
                self.state = ExportState::Failed(e.to_string());
                return Err(ExportError::Record(e));
            }
        }

        info!(
            "Export started: {} {}x{} @ {} fps, {:.1}s target",
            codec, width, height, self.settings.fps, self.target
        );
        self.state = ExportState::Capturing;
        Ok(())
    }

    /// Advance the session by `dt` seconds of capture time.
    ///
    /// Returns a progress percentage when a report is due: capped at 99
    /// while capturing, exactly 100 once the file has been delivered.
    pub fn tick(&mut self, comp: &mut Composition, dt: f32) -> Option<u8> {
        if self.state != ExportState::Capturing {
            return None;
        }

        for id in LayerId::all() {
            if let Some(clip) = comp.layer_mut(id).source_mut().as_video_mut() {
                clip.advance(dt);
            }
        }
        comp.render_frame();

        self.elapsed += dt;
        self.since_report += dt;

        // Capture every output frame that has come due, re-sampling the
        // current surface when the tick spans several frame periods.
        let due = (self.elapsed.min(self.target) * self.settings.fps).ceil() as u64;
        while self.frames_captured < due {
            let pts = self.frames_captured as f32 / self.settings.fps;
            match self.recorder.push_frame(comp.surface(), pts) {
                Ok(chunk) => self.chunks.push(chunk),
                Err(e) => {
                    warn!("Export failed while recording: {}", e);
                    self.teardown(comp);
                    self.state = ExportState::Failed(e.to_string());
                    return None;
                }
            }
            self.frames_captured += 1;
        }

        if self.elapsed >= self.target {
            return match self.finalize(comp) {
                Ok(()) => Some(100),
                Err(_) => None,
            };
        }

        if self.since_report >= self.settings.progress_interval {
            self.since_report = 0.0;
            let pct = (self.elapsed / self.target * 100.0).round() as u8;
            return Some(pct.min(99));
        }
        None
    }

    /// Abort the session, discarding everything captured so far.
    pub fn cancel(&mut self, comp: &mut Composition) {
        if self.state != ExportState::Capturing {
            return;
        }
        info!("Export cancelled after {:.1}s", self.elapsed);
        self.teardown(comp);
        self.chunks.clear();
        self.mixer = None;
        self.state = ExportState::Idle;
    }

    fn finalize(&mut self, comp: &mut Composition) -> Result<(), ExportError> {
        self.state = ExportState::Finalizing;

        let mixed = self.mixer.take().and_then(AudioMixer::mix);
        let audio = mixed.as_ref().map(|(samples, rate)| (samples.as_slice(), *rate));
        match self.recorder.finish(audio) {
            Ok(tail) => self.chunks.extend(tail),
            Err(e) => {
                self.teardown(comp);
                self.state = ExportState::Failed(e.to_string());
                return Err(ExportError::Record(e));
            }
        }

        self.teardown(comp);

        // Codec is always set past start()
        let codec = self.codec.unwrap_or(ExportCodec::Mp4H264);
        let file_name = format!("composite_export_{}.{}", epoch_ms(), codec.extension());
        let data: Vec<u8> = self.chunks.concat();
        self.chunks.clear();

        if let Err(e) = self.sink.deliver(&file_name, codec.mime(), &data) {
            self.state = ExportState::Failed(e.to_string());
            return Err(ExportError::Deliver(e));
        }

        info!(
            "Export finished: {} ({} frames, {} bytes)",
            file_name,
            self.frames_captured,
            data.len()
        );
        self.last_file_name = Some(file_name);
        self.state = ExportState::Idle;
        Ok(())
    }

    /// Stop playback and leave the composition in preview mode.
    fn teardown(&mut self, comp: &mut Composition) {
        for id in LayerId::all() {
            if let Some(clip) = comp.layer_mut(id).source_mut().as_video_mut() {
                clip.pause();
                clip.set_muted(true);
            }
        }
        comp.set_exporting(false);
    }
}
