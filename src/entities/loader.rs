//! File to Source resolution.
//!
//! **Why**: the compositor must never see a decode error. Whatever the
//! user picks, resolution produces a representable value: a decoded still,
//! a decoded clip, or a Placeholder carrying the file name. Failure is a
//! value here, not an exception.
//!
//! Still images decode in-process via the `image` crate. Video decoding is
//! an embedder concern (hardware decoders, FFmpeg, platform media APIs);
//! it plugs in through [`DecodeVideo`], and any failure there also folds
//! into a Placeholder.

use std::path::Path;
use std::sync::Once;

use anyhow::anyhow;
use log::{debug, warn};

use crate::entities::frame::Frame;
use crate::entities::source::{PlaceholderSource, Source, VideoClip};

/// Supported video file extensions.
pub const VIDEO_EXTS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Supported image file extensions.
pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "tga"];

static UNSUPPORTED_ADVISORY: Once = Once::new();

fn ext_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Check if file is a video format.
pub fn is_video(path: &Path) -> bool {
    VIDEO_EXTS.contains(&ext_of(path).as_str())
}

/// Check if file is an image format.
pub fn is_image(path: &Path) -> bool {
    IMAGE_EXTS.contains(&ext_of(path).as_str())
}

/// Video decode seam for the embedding application.
pub trait DecodeVideo {
    /// Decode the file into a clip, or a reason why not.
    fn decode(&self, path: &Path) -> anyhow::Result<VideoClip>;
}

/// Built-in stand-in: declines every video file, producing placeholders.
pub struct NoVideoDecoder;

impl DecodeVideo for NoVideoDecoder {
    fn decode(&self, _path: &Path) -> anyhow::Result<VideoClip> {
        Err(anyhow!("No video decoder configured"))
    }
}

/// Resolve a user-selected file into a drawable source.
///
/// Never fails: undecodable input becomes a [`Source::Placeholder`] with
/// the original file name and a nominal 1280x720 footprint.
pub fn resolve(path: &Path) -> Source {
    resolve_with(path, &NoVideoDecoder)
}

/// Like [`resolve`], with an embedder-supplied video decoder.
pub fn resolve_with(path: &Path, decoder: &dyn DecodeVideo) -> Source {
    if is_image(path) {
        match load_image(path) {
            Ok(frame) => {
                debug!("Resolved image source: {}", path.display());
                return Source::Image(frame);
            }
            Err(e) => return placeholder_for(path, &e.to_string()),
        }
    }

    if is_video(path) {
        match decoder.decode(path) {
            Ok(clip) => {
                debug!(
                    "Resolved video source: {} ({:.2}s @ {} fps)",
                    path.display(),
                    clip.duration(),
                    clip.fps()
                );
                return Source::Video(clip);
            }
            Err(e) => return placeholder_for(path, &e.to_string()),
        }
    }

    placeholder_for(path, "Unrecognized file extension")
}

fn load_image(path: &Path) -> anyhow::Result<Frame> {
    let img = image::open(path)?;
    let width = img.width() as usize;
    let height = img.height() as usize;
    let rgba = img.to_rgba8();
    Frame::from_rgba(rgba.into_raw(), width, height)
        .ok_or_else(|| anyhow!("Decoded buffer size does not match {}x{}", width, height))
}

fn placeholder_for(path: &Path, reason: &str) -> Source {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    warn!("Cannot decode {}: {}", file_name, reason);
    UNSUPPORTED_ADVISORY.call_once(|| {
        warn!("Some media could not be decoded; re-export it in a supported codec to composite it");
    });

    Source::Placeholder(PlaceholderSource::new(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::source::SourceKind;

    struct FixedClipDecoder;

    impl DecodeVideo for FixedClipDecoder {
        fn decode(&self, _path: &Path) -> anyhow::Result<VideoClip> {
            VideoClip::new(vec![Frame::new(8, 8); 24], 24.0).ok_or_else(|| anyhow!("empty"))
        }
    }

    #[test]
    fn test_classification() {
        assert!(is_video(Path::new("clip.MP4")));
        assert!(is_video(Path::new("clip.webm")));
        assert!(!is_video(Path::new("clip.png")));
        assert!(is_image(Path::new("shot.JPEG")));
        assert!(!is_image(Path::new("shot")));
    }

    #[test]
    fn test_missing_image_becomes_placeholder() {
        let src = resolve(Path::new("/nonexistent/bg.png"));
        assert_eq!(src.kind(), SourceKind::Placeholder);
        if let Source::Placeholder(ph) = &src {
            assert_eq!(ph.file_name, "bg.png");
            assert_eq!((ph.width, ph.height), (1280, 720));
        }
    }

    #[test]
    fn test_video_without_decoder_becomes_placeholder() {
        let src = resolve(Path::new("talk.mp4"));
        assert_eq!(src.kind(), SourceKind::Placeholder);
    }

    #[test]
    fn test_video_with_decoder_resolves() {
        let src = resolve_with(Path::new("talk.mp4"), &FixedClipDecoder);
        assert_eq!(src.kind(), SourceKind::Video);
        let clip = src.as_video().unwrap();
        assert!(clip.is_muted());
        assert!((clip.duration() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_extension_becomes_placeholder() {
        let src = resolve(Path::new("notes.txt"));
        assert_eq!(src.kind(), SourceKind::Placeholder);
    }
}
