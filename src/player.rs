//! Preview player: the tick loop that drives the composition on screen.
//!
//! One `tick(dt)` per display refresh does, in order: service queued
//! poster captures, advance the background clip (preview plays only the
//! background layer; primary and overlay stay on their posters), and
//! re-render the surface. While an export session owns playback the
//! player keeps rendering but stops advancing anything itself.

use crate::entities::comp::Composition;
use crate::entities::layer::LayerId;

/// Preview playback over a composition.
pub struct Player {
    pub comp: Composition,
    playing: bool,
}

impl Player {
    pub fn new(comp: Composition) -> Self {
        Self {
            comp,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Advance the preview by `dt` seconds and render.
    pub fn tick(&mut self, dt: f32) {
        self.comp.capture_pending_posters();

        if self.playing && !self.comp.is_exporting() {
            if let Some(clip) = self
                .comp
                .layer_mut(LayerId::Background)
                .source_mut()
                .as_video_mut()
            {
                // Preview playback bypasses the clip's own play gate so a
                // freshly loaded (paused) clip still previews in motion.
                clip.play();
                clip.advance(dt);
            }
        }

        self.comp.render_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::frame::Frame;
    use crate::entities::source::{Source, VideoClip};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn two_frame_clip() -> VideoClip {
        VideoClip::new(vec![Frame::solid(4, 4, RED), Frame::solid(4, 4, BLUE)], 1.0).unwrap()
    }

    #[test]
    fn test_paused_player_does_not_advance() {
        let mut comp = Composition::new(4, 4);
        comp.set_source(LayerId::Background, Source::Video(two_frame_clip()));
        let mut player = Player::new(comp);

        player.tick(1.5);
        assert_eq!(player.comp.surface().pixel(2, 2), Some(RED));

        player.play();
        player.tick(1.5);
        assert_eq!(player.comp.surface().pixel(2, 2), Some(BLUE));
    }

    #[test]
    fn test_preview_advances_background_only() {
        let mut comp = Composition::new(4, 4);
        comp.set_source(LayerId::Background, Source::Video(two_frame_clip()));
        comp.set_source(LayerId::Primary, Source::Video(two_frame_clip()));
        let mut player = Player::new(comp);
        player.play();

        // First tick captures the primary poster (frame 0, red) and starts
        // the background moving.
        player.tick(0.0);
        player.tick(1.5);

        assert_eq!(player.comp.surface().pixel(2, 2), Some(RED));
        let primary = player.comp.layer(LayerId::Primary).source().as_video().unwrap();
        assert_eq!(primary.position(), 0.0);
    }

    #[test]
    fn test_player_stands_down_during_export() {
        let mut comp = Composition::new(4, 4);
        comp.set_source(LayerId::Background, Source::Video(two_frame_clip()));
        comp.set_exporting(true);
        let mut player = Player::new(comp);
        player.play();

        player.tick(1.5);
        let clip = player.comp.layer(LayerId::Background).source().as_video().unwrap();
        assert_eq!(clip.position(), 0.0);
    }

    #[test]
    fn test_toggle() {
        let mut player = Player::new(Composition::new(2, 2));
        assert!(!player.is_playing());
        player.toggle();
        assert!(player.is_playing());
        player.toggle();
        assert!(!player.is_playing());
    }
}
