//! Layer state for the three fixed composition slots.
//!
//! A layer owns its source exclusively, plus the geometry and keying
//! parameters the compositor reads every frame. Numeric setters validate
//! at this boundary so bad values never reach the draw path: scale rejects
//! non-positive input, opacity and tolerance clamp to [0,1].

use serde::{Deserialize, Serialize};

use super::frame::Frame;
use super::source::{Source, SourceKind};

/// Fixed z-ordered layer slots, bottom to top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerId {
    Background,
    Primary,
    Overlay,
}

impl LayerId {
    /// All slots in draw order.
    pub fn all() -> [LayerId; 3] {
        [LayerId::Background, LayerId::Primary, LayerId::Overlay]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerId::Background => "background",
            LayerId::Primary => "primary",
            LayerId::Overlay => "overlay",
        }
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Layer parameter validation errors.
#[derive(Debug, PartialEq)]
pub enum LayerError {
    InvalidScale(f32),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::InvalidScale(v) => write!(f, "Scale must be > 0, got {}", v),
        }
    }
}

impl std::error::Error for LayerError {}

/// Default chroma-key target: pure green.
pub const DEFAULT_KEY_COLOR: [u8; 3] = [0, 255, 0];

/// Default chroma-key tolerance.
pub const DEFAULT_KEY_TOLERANCE: f32 = 0.1;

/// One visual slot in the composition.
#[derive(Clone, Debug)]
pub struct Layer {
    source: Source,
    position_x: f32,
    position_y: f32,
    scale: f32,
    opacity: f32,
    chroma_key_enabled: bool,
    chroma_key_color: [u8; 3],
    chroma_key_tolerance: f32,
    poster_frame: Option<Frame>,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    pub fn new() -> Self {
        Self {
            source: Source::None,
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
            opacity: 1.0,
            chroma_key_enabled: false,
            chroma_key_color: DEFAULT_KEY_COLOR,
            chroma_key_tolerance: DEFAULT_KEY_TOLERANCE,
            poster_frame: None,
        }
    }

    /// Replace the source. Resets position to the surface center, scale to
    /// 1.0, and drops the poster frame of the previous source.
    pub fn set_source(&mut self, source: Source) {
        self.source = source;
        self.position_x = 0.0;
        self.position_y = 0.0;
        self.scale = 1.0;
        self.poster_frame = None;
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    /// Variant tag of the owned source.
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn position(&self) -> (f32, f32) {
        (self.position_x, self.position_y)
    }

    /// Offset in surface pixels from the surface center.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position_x = x;
        self.position_y = y;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Multiplier over the source's natural dimensions. Must be > 0.
    pub fn set_scale(&mut self, scale: f32) -> Result<(), LayerError> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(LayerError::InvalidScale(scale));
        }
        self.scale = scale;
        Ok(())
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
    }

    pub fn chroma_key_enabled(&self) -> bool {
        self.chroma_key_enabled
    }

    pub fn set_chroma_key_enabled(&mut self, enabled: bool) {
        self.chroma_key_enabled = enabled;
    }

    pub fn chroma_key_color(&self) -> [u8; 3] {
        self.chroma_key_color
    }

    pub fn set_chroma_key_color(&mut self, rgb: [u8; 3]) {
        self.chroma_key_color = rgb;
    }

    pub fn chroma_key_tolerance(&self) -> f32 {
        self.chroma_key_tolerance
    }

    pub fn set_chroma_key_tolerance(&mut self, tolerance: f32) {
        self.chroma_key_tolerance = if tolerance.is_nan() {
            DEFAULT_KEY_TOLERANCE
        } else {
            tolerance.clamp(0.0, 1.0)
        };
    }

    pub fn poster_frame(&self) -> Option<&Frame> {
        self.poster_frame.as_ref()
    }

    /// Cache a preview still for the current source. Lives until the next
    /// `set_source`.
    pub fn set_poster_frame(&mut self, frame: Frame) {
        self.poster_frame = Some(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::source::VideoClip;

    /// `default()` must satisfy the same invariants the setters enforce,
    /// scale > 0 in particular.
    #[test]
    fn test_default_matches_new() {
        let layer = Layer::default();
        assert!(layer.scale() > 0.0);
        assert_eq!(layer.scale(), 1.0);
        assert_eq!(layer.opacity(), 1.0);
        assert_eq!(layer.chroma_key_color(), DEFAULT_KEY_COLOR);
        assert_eq!(layer.chroma_key_tolerance(), DEFAULT_KEY_TOLERANCE);
    }

    #[test]
    fn test_defaults() {
        let layer = Layer::new();
        assert_eq!(layer.kind(), SourceKind::None);
        assert_eq!(layer.position(), (0.0, 0.0));
        assert_eq!(layer.scale(), 1.0);
        assert_eq!(layer.opacity(), 1.0);
        assert!(!layer.chroma_key_enabled());
        assert_eq!(layer.chroma_key_color(), [0, 255, 0]);
        assert_eq!(layer.chroma_key_tolerance(), 0.1);
        assert!(layer.poster_frame().is_none());
    }

    #[test]
    fn test_scale_rejects_non_positive() {
        let mut layer = Layer::new();
        assert_eq!(layer.set_scale(0.0), Err(LayerError::InvalidScale(0.0)));
        assert_eq!(layer.set_scale(-2.0), Err(LayerError::InvalidScale(-2.0)));
        assert!(layer.set_scale(f32::NAN).is_err());
        assert!(layer.set_scale(f32::INFINITY).is_err());
        assert_eq!(layer.scale(), 1.0);

        assert!(layer.set_scale(0.5).is_ok());
        assert_eq!(layer.scale(), 0.5);
    }

    #[test]
    fn test_opacity_and_tolerance_clamp() {
        let mut layer = Layer::new();
        layer.set_opacity(2.0);
        assert_eq!(layer.opacity(), 1.0);
        layer.set_opacity(-0.5);
        assert_eq!(layer.opacity(), 0.0);

        layer.set_chroma_key_tolerance(7.0);
        assert_eq!(layer.chroma_key_tolerance(), 1.0);
        layer.set_chroma_key_tolerance(-1.0);
        assert_eq!(layer.chroma_key_tolerance(), 0.0);
    }

    #[test]
    fn test_set_source_resets_transform_and_poster() {
        let mut layer = Layer::new();
        layer.set_position(50.0, -20.0);
        layer.set_scale(2.0).unwrap();
        layer.set_poster_frame(Frame::new(2, 2));

        let clip = VideoClip::new(vec![Frame::new(4, 4)], 24.0).unwrap();
        layer.set_source(Source::Video(clip));

        assert_eq!(layer.position(), (0.0, 0.0));
        assert_eq!(layer.scale(), 1.0);
        assert!(layer.poster_frame().is_none());
        assert_eq!(layer.kind(), SourceKind::Video);
    }

    #[test]
    fn test_layer_id_order_and_names() {
        let ids = LayerId::all();
        assert_eq!(ids[0], LayerId::Background);
        assert_eq!(ids[2], LayerId::Overlay);
        assert_eq!(LayerId::Primary.to_string(), "primary");
    }
}
