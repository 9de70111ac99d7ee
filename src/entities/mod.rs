//! Core compositing entities: frames, sources, layers, effects, and the
//! Composition session that ties them together.

pub mod comp;
pub mod effects;
pub mod frame;
pub mod layer;
pub mod loader;
pub mod source;
pub mod text;

pub use comp::{Composition, TimeReadout};
pub use effects::ChromaKeyEngine;
pub use frame::Frame;
pub use layer::{Layer, LayerError, LayerId};
pub use source::{AudioTrack, PlaceholderSource, Source, SourceKind, VideoClip};
