//! Video surfaces
//!
//! The grid holds at most one surface per link identifier. Attaching a
//! stream for a link that already has a surface swaps the stream in place.

use super::media::StreamId;
use crate::protocol::LinkId;

/// A rendered video tile bound to one link identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSurface {
    pub link_id: LinkId,
    pub stream: StreamId,
    pub label: String,
    /// Only the local participant's own surface is muted
    pub muted: bool,
}

/// Result of `SurfaceGrid::attach`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    Created,
    Updated,
}

/// Layout hint derived from the number of visible surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    Empty,
    /// Exactly one surface, shown full size
    Single,
    Multi,
}

/// Ordered set of surfaces, deduplicated by link identifier
#[derive(Debug, Default)]
pub struct SurfaceGrid {
    surfaces: Vec<VideoSurface>,
}

impl SurfaceGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `stream` for `link_id`, creating the surface on first use
    pub fn attach(
        &mut self,
        link_id: &LinkId,
        stream: StreamId,
        label: &str,
        muted: bool,
    ) -> SurfaceChange {
        if let Some(existing) = self.surfaces.iter_mut().find(|s| &s.link_id == link_id) {
            existing.stream = stream;
            if !label.is_empty() {
                existing.label = label.to_string();
            }
            return SurfaceChange::Updated;
        }

        self.surfaces.push(VideoSurface {
            link_id: link_id.clone(),
            stream,
            label: label.to_string(),
            muted,
        });
        SurfaceChange::Created
    }

    /// Remove the surface for `link_id`
    pub fn remove(&mut self, link_id: &LinkId) -> Option<VideoSurface> {
        let index = self.surfaces.iter().position(|s| &s.link_id == link_id)?;
        Some(self.surfaces.remove(index))
    }

    pub fn get(&self, link_id: &LinkId) -> Option<&VideoSurface> {
        self.surfaces.iter().find(|s| &s.link_id == link_id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn layout(&self) -> GridLayout {
        match self.surfaces.len() {
            0 => GridLayout::Empty,
            1 => GridLayout::Single,
            _ => GridLayout::Multi,
        }
    }
}
