//! Composition session - the layer stack, the output surface, and the
//! per-frame draw routine.
//!
//! **Why**: everything the render and export paths share lives in one
//! explicitly constructed object: three fixed z-ordered layers, the
//! surface they composite into, the chroma-key scratch engine, and the
//! exporting flag that switches non-background video layers between
//! poster stills (cheap preview) and live frames (export).
//!
//! **Used by**: Player (once per display tick), ExportSession (surface
//! capture + playback control), embedding UI (control surface).
//!
//! # Draw model
//!
//! Layers draw bottom-to-top in fixed order. Position is an offset from
//! the surface center and scaling happens about that same center, so a
//! layer at (0,0) is centered for any scale and any natural size. A layer
//! that cannot be drawn this frame (no source, zero-sized metadata) is
//! skipped; a single bad layer never aborts the frame.

use log::{debug, warn};

use crate::entities::effects::ChromaKeyEngine;
use crate::entities::frame::Frame;
use crate::entities::layer::{Layer, LayerError, LayerId};
use crate::entities::source::{PlaceholderSource, Source};
use crate::entities::text;
use crate::utils::format_time;

/// Surface clear color: opaque black.
const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

const PLACEHOLDER_FILL: [u8; 4] = [70, 70, 80, 160];
const PLACEHOLDER_BORDER: [u8; 4] = [200, 200, 210, 220];
const PLACEHOLDER_BORDER_PX: usize = 2;

/// Playback readout derived from the background layer each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeReadout {
    /// Background playback progress in percent, 0 when not time-based.
    pub progress_percent: f32,
    /// Elapsed position as zero-padded `mm:ss`.
    pub elapsed: String,
    /// Total duration as zero-padded `mm:ss`.
    pub total: String,
}

impl Default for TimeReadout {
    fn default() -> Self {
        Self {
            progress_percent: 0.0,
            elapsed: "00:00".into(),
            total: "00:00".into(),
        }
    }
}

/// The compositing session.
pub struct Composition {
    layers: [Layer; 3],
    selected: LayerId,
    surface: Frame,
    keyer: ChromaKeyEngine,
    exporting: bool,
    pending_posters: Vec<LayerId>,
    readout: TimeReadout,
}

impl Composition {
    /// Create a session with an output surface of the given resolution.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            layers: [Layer::new(), Layer::new(), Layer::new()],
            selected: LayerId::Background,
            surface: Frame::solid(width, height, CLEAR_COLOR),
            keyer: ChromaKeyEngine::new(),
            exporting: false,
            pending_posters: Vec::new(),
            readout: TimeReadout::default(),
        }
    }

    fn index(id: LayerId) -> usize {
        match id {
            LayerId::Background => 0,
            LayerId::Primary => 1,
            LayerId::Overlay => 2,
        }
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[Self::index(id)]
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[Self::index(id)]
    }

    /// Exactly one layer is selected for editing at any time.
    pub fn select_layer(&mut self, id: LayerId) {
        self.selected = id;
    }

    pub fn selected(&self) -> LayerId {
        self.selected
    }

    pub fn selected_layer_mut(&mut self) -> &mut Layer {
        self.layer_mut(self.selected)
    }

    pub fn surface(&self) -> &Frame {
        &self.surface
    }

    pub fn resolution(&self) -> (usize, usize) {
        self.surface.resolution()
    }

    pub fn time_readout(&self) -> &TimeReadout {
        &self.readout
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Toggled by the export pipeline; forces live frames for all video
    /// layers while set.
    pub fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
    }

    /// Replace a layer's source and queue a poster capture for video.
    ///
    /// The poster is captured on the next tick, not here - source
    /// installation and preview-still capture stay separate steps.
    pub fn set_source(&mut self, id: LayerId, source: Source) {
        let is_video = source.as_video().is_some();
        self.layer_mut(id).set_source(source);
        self.pending_posters.retain(|&p| p != id);
        if is_video {
            self.pending_posters.push(id);
        }
    }

    /// Service queued poster captures. Called at the start of a tick.
    pub fn capture_pending_posters(&mut self) {
        let pending: Vec<LayerId> = self.pending_posters.drain(..).collect();
        for id in pending {
            let layer = self.layer_mut(id);
            // The source may have been replaced since the capture was queued
            if let Some(poster) = layer.source().as_video().map(|c| c.current_frame().clone()) {
                debug!("Captured poster frame for {} layer", id);
                layer.set_poster_frame(poster);
            }
        }
    }

    /// Recreate the output surface. Discards surface content and resets
    /// every layer position to the center; scale and opacity survive.
    pub fn set_resolution(&mut self, width: usize, height: usize) {
        self.surface = Frame::solid(width, height, CLEAR_COLOR);
        for layer in &mut self.layers {
            layer.set_position(0.0, 0.0);
        }
    }

    /// Composition duration: the longest known duration among time-based
    /// sources, primarily driven by the background layer.
    pub fn duration(&self) -> Option<f32> {
        self.layers
            .iter()
            .filter_map(|l| l.source().duration())
            .fold(None, |acc, d| Some(acc.map_or(d, |a: f32| a.max(d))))
    }

    /// Scale the layer so its width matches the surface width, recentered.
    pub fn fit_to_width(&mut self, id: LayerId) -> Result<(), LayerError> {
        let surface_w = self.surface.width() as f32;
        self.fit(id, |nat| surface_w / nat.0 as f32)
    }

    /// Scale the layer so its height matches the surface height, recentered.
    pub fn fit_to_height(&mut self, id: LayerId) -> Result<(), LayerError> {
        let surface_h = self.surface.height() as f32;
        self.fit(id, |nat| surface_h / nat.1 as f32)
    }

    fn fit(
        &mut self,
        id: LayerId,
        derive: impl FnOnce((usize, usize)) -> f32,
    ) -> Result<(), LayerError> {
        let layer = self.layer_mut(id);
        let Some(nat) = layer.source().natural_size() else {
            debug!("Fit ignored: {} layer has no source", id);
            return Ok(());
        };
        layer.set_scale(derive(nat))?;
        layer.set_position(0.0, 0.0);
        Ok(())
    }

    /// Reset the layer position to the surface center.
    pub fn center(&mut self, id: LayerId) {
        self.layer_mut(id).set_position(0.0, 0.0);
    }

    /// Composite all layers into the surface and refresh the readout.
    ///
    /// Never fails: layers that cannot be drawn this frame are skipped.
    pub fn render_frame(&mut self) {
        let Self {
            layers,
            surface,
            keyer,
            exporting,
            readout,
            ..
        } = self;

        surface.fill(CLEAR_COLOR);

        for id in LayerId::all() {
            draw_layer(id, &layers[Self::index(id)], surface, keyer, *exporting);
        }

        *readout = match layers[0].source() {
            Source::Video(clip) => {
                let duration = clip.duration();
                TimeReadout {
                    progress_percent: if duration > 0.0 {
                        clip.position() / duration * 100.0
                    } else {
                        0.0
                    },
                    elapsed: format_time(clip.position()),
                    total: format_time(duration),
                }
            }
            _ => TimeReadout::default(),
        };
    }
}

/// Destination rectangle for a layer: scaled about the surface center,
/// then offset by the layer position.
fn dest_rect(
    surface: &Frame,
    layer: &Layer,
    natural: (usize, usize),
) -> (i64, i64, usize, usize) {
    let scale = layer.scale();
    let dst_w = ((natural.0 as f32 * scale).round() as usize).max(1);
    let dst_h = ((natural.1 as f32 * scale).round() as usize).max(1);
    let (px, py) = layer.position();
    let dst_x = (surface.width() as f32 / 2.0 + px - dst_w as f32 / 2.0).round() as i64;
    let dst_y = (surface.height() as f32 / 2.0 + py - dst_h as f32 / 2.0).round() as i64;
    (dst_x, dst_y, dst_w, dst_h)
}

fn draw_layer(
    id: LayerId,
    layer: &Layer,
    surface: &mut Frame,
    keyer: &mut ChromaKeyEngine,
    exporting: bool,
) {
    let frame: &Frame = match layer.source() {
        Source::None => return,
        Source::Placeholder(ph) => {
            draw_placeholder(surface, layer, ph);
            return;
        }
        Source::Image(frame) => frame,
        Source::Video(clip) => {
            // Preview keeps non-background video motionless via the poster
            // still; export always reads the live frame.
            match layer.poster_frame() {
                Some(poster) if !exporting && id != LayerId::Background => poster,
                _ => clip.current_frame(),
            }
        }
    };

    let natural = frame.resolution();
    if natural.0 == 0 || natural.1 == 0 {
        warn!("Skipping {} layer: source has no dimensions", id);
        return;
    }

    let (dst_x, dst_y, dst_w, dst_h) = dest_rect(surface, layer, natural);

    if layer.chroma_key_enabled() {
        let keyed = keyer.apply(frame, layer.chroma_key_color(), layer.chroma_key_tolerance());
        surface.blit_scaled(keyed, dst_x, dst_y, dst_w, dst_h, layer.opacity());
    } else {
        surface.blit_scaled(frame, dst_x, dst_y, dst_w, dst_h, layer.opacity());
    }
}

fn draw_placeholder(surface: &mut Frame, layer: &Layer, ph: &PlaceholderSource) {
    let (dst_x, dst_y, dst_w, dst_h) = dest_rect(surface, layer, (ph.width, ph.height));
    let opacity = layer.opacity();
    let fade = |rgba: [u8; 4]| {
        [rgba[0], rgba[1], rgba[2], (rgba[3] as f32 * opacity) as u8]
    };

    surface.fill_rect(dst_x, dst_y, dst_w, dst_h, fade(PLACEHOLDER_FILL));

    let b = PLACEHOLDER_BORDER_PX;
    let border = fade(PLACEHOLDER_BORDER);
    surface.fill_rect(dst_x, dst_y, dst_w, b, border);
    surface.fill_rect(dst_x, dst_y + dst_h as i64 - b as i64, dst_w, b, border);
    surface.fill_rect(dst_x, dst_y, b, dst_h, border);
    surface.fill_rect(dst_x + dst_w as i64 - b as i64, dst_y, b, dst_h, border);

    // Center the file name in the rect; a label wider than the rect keeps
    // a small left inset and clips on the right.
    let px = 2;
    let label_w = text::label_width(&ph.file_name, px) as i64;
    let label_x = dst_x + ((dst_w as i64 - label_w) / 2).max(8);
    text::draw_label(
        surface,
        label_x,
        dst_y + 8,
        &ph.file_name,
        fade([255, 255, 255, 255]),
        px,
    );
}
