//! Per-layer pixel effects applied before compositing.
//!
//! The only effect this pipeline carries is the chroma keyer; it runs on
//! the source's natural-resolution frame, ahead of the scaled blit, so
//! keying precision never depends on display scale.

pub mod chroma_key;

pub use chroma_key::ChromaKeyEngine;
