//! Layer sources - tagged variant over everything a layer can hold.
//!
//! **Why**: a layer is sometimes a still, sometimes a playing clip,
//! sometimes just a descriptor for a file that failed to decode. One enum
//! with an explicit discriminant keeps the compositor free of structural
//! guessing, and `kind()` can never drift from the payload because it is
//! derived, not stored.
//!
//! **Used by**: Layer (ownership), Composition (drawing), export (audio
//! routing + playback control).

use serde::{Deserialize, Serialize};

use super::frame::Frame;

/// Discriminant of [`Source`], used for skip/dispatch decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    None,
    Image,
    Video,
    Placeholder,
}

/// Mono or interleaved audio attached to a video clip.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Descriptor for a file that could not be decoded.
///
/// Carries the original file name for on-canvas labelling and a nominal
/// 1280x720 footprint so transform math still has dimensions to work with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceholderSource {
    pub file_name: String,
    pub width: usize,
    pub height: usize,
}

impl PlaceholderSource {
    pub const NOMINAL_WIDTH: usize = 1280;
    pub const NOMINAL_HEIGHT: usize = 720;

    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            width: Self::NOMINAL_WIDTH,
            height: Self::NOMINAL_HEIGHT,
        }
    }
}

/// Decoded video clip: a frame sequence with fps-based timing.
///
/// Decoding happens behind the resolver boundary; the clip itself is
/// already-decoded frames. Starts muted, looping and paused, matching how
/// a freshly loaded preview source should behave.
#[derive(Clone, Debug)]
pub struct VideoClip {
    frames: Vec<Frame>,
    fps: f32,
    position: f32,
    playing: bool,
    muted: bool,
    looping: bool,
    audio: Option<AudioTrack>,
}

impl VideoClip {
    /// Build a clip from decoded frames. Returns None for an empty frame
    /// list or a non-positive fps - a clip must have a defined duration.
    pub fn new(frames: Vec<Frame>, fps: f32) -> Option<Self> {
        if frames.is_empty() || !(fps > 0.0) {
            return None;
        }
        Some(Self {
            frames,
            fps,
            position: 0.0,
            playing: false,
            muted: true,
            looping: true,
            audio: None,
        })
    }

    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f32 {
        self.frames.len() as f32 / self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Natural pixel dimensions, taken from the first frame.
    pub fn natural_size(&self) -> (usize, usize) {
        self.frames[0].resolution()
    }

    /// Current playback position in seconds.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    /// Frame at the current playback position.
    pub fn current_frame(&self) -> &Frame {
        let idx = (self.position * self.fps) as usize;
        &self.frames[idx.min(self.frames.len() - 1)]
    }

    /// Advance playback by `dt` seconds if playing, wrapping at the end
    /// when looping and pausing at the last frame otherwise.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.position += dt;
        let duration = self.duration();
        if self.position >= duration {
            if self.looping {
                self.position %= duration;
            } else {
                self.position = duration;
                self.playing = false;
            }
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Reset playback to the start.
    pub fn rewind(&mut self) {
        self.position = 0.0;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

/// Polymorphic handle a layer exclusively owns.
#[derive(Clone, Debug, Default)]
pub enum Source {
    #[default]
    None,
    Image(Frame),
    Video(VideoClip),
    Placeholder(PlaceholderSource),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::None => SourceKind::None,
            Source::Image(_) => SourceKind::Image,
            Source::Video(_) => SourceKind::Video,
            Source::Placeholder(_) => SourceKind::Placeholder,
        }
    }

    /// Natural pixel dimensions, if the source has any.
    pub fn natural_size(&self) -> Option<(usize, usize)> {
        match self {
            Source::None => None,
            Source::Image(frame) => Some(frame.resolution()),
            Source::Video(clip) => Some(clip.natural_size()),
            Source::Placeholder(ph) => Some((ph.width, ph.height)),
        }
    }

    /// Known duration in seconds. Only time-based sources have one.
    pub fn duration(&self) -> Option<f32> {
        match self {
            Source::Video(clip) => Some(clip.duration()),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoClip> {
        match self {
            Source::Video(clip) => Some(clip),
            _ => None,
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoClip> {
        match self {
            Source::Video(clip) => Some(clip),
            _ => None,
        }
    }
}
