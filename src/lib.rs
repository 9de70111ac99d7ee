//! mixa - a real-time three-layer visual compositor.
//!
//! Three fixed z-ordered layers (background, primary, overlay) composite
//! into one RGBA surface. Each layer holds an image, a video clip, or a
//! placeholder for a file that failed to decode, with center-relative
//! position/scale, opacity, and an optional chroma key. A [`Player`]
//! drives the preview loop; an [`export::ExportSession`] captures the
//! surface in real time and delivers a finished file.
//!
//! ```no_run
//! use std::path::Path;
//! use mixa::{Composition, LayerId, Player};
//! use mixa::entities::loader;
//!
//! mixa::init_logging();
//!
//! let mut comp = Composition::new(1280, 720);
//! comp.set_source(LayerId::Background, loader::resolve(Path::new("bg.mp4")));
//! comp.set_source(LayerId::Primary, loader::resolve(Path::new("talent.png")));
//! comp.layer_mut(LayerId::Primary).set_chroma_key_enabled(true);
//!
//! let mut player = Player::new(comp);
//! player.play();
//! player.tick(1.0 / 60.0);
//! ```

pub mod audio;
pub mod entities;
pub mod export;
pub mod player;
pub mod utils;

pub use entities::{
    Composition, Frame, Layer, LayerError, LayerId, Source, SourceKind, TimeReadout, VideoClip,
};
pub use export::{ExportCodec, ExportSession, ExportSettings, ExportState};
pub use player::Player;
pub use utils::init_logging;
