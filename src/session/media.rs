//! Local and remote media references
//!
//! Capture itself happens outside this crate. A `MediaHandle` only carries a
//! stream identifier and the enable flags of its tracks, which is all the
//! call logic needs to mute and unmute.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a media stream as reported by the negotiation library
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One captured track
///
/// The enable flag is shared between clones, so the negotiation library
/// observes a mute without any renegotiation.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    enabled: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Handle to the local participant's captured stream
#[derive(Debug, Clone)]
pub struct MediaHandle {
    id: StreamId,
    tracks: Vec<MediaTrack>,
}

impl MediaHandle {
    /// Create a handle from already captured tracks
    pub fn new(id: impl Into<StreamId>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Create a handle with one audio and one video track, both enabled
    pub fn audio_video(id: impl Into<StreamId>) -> Self {
        Self::new(
            id,
            vec![MediaTrack::new(TrackKind::Audio), MediaTrack::new(TrackKind::Video)],
        )
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Flip every video track. Returns the new state.
    pub fn toggle_video(&self) -> bool {
        self.toggle(TrackKind::Video)
    }

    /// Flip every audio track. Returns the new state.
    pub fn toggle_audio(&self) -> bool {
        self.toggle(TrackKind::Audio)
    }

    pub fn is_video_enabled(&self) -> bool {
        self.is_enabled(TrackKind::Video)
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.is_enabled(TrackKind::Audio)
    }

    /// True if any track of `kind` is enabled
    pub fn is_enabled(&self, kind: TrackKind) -> bool {
        self.tracks_of(kind).any(MediaTrack::is_enabled)
    }

    fn toggle(&self, kind: TrackKind) -> bool {
        let enabled = !self.is_enabled(kind);
        self.set_enabled(kind, enabled);
        enabled && self.tracks_of(kind).next().is_some()
    }

    fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        for track in self.tracks_of(kind) {
            track.set_enabled(enabled);
        }
    }

    fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }
}
