use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Clips are never trimmed shorter than this (seconds).
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Default magnetic snap tolerance (seconds).
pub const DEFAULT_SNAP_TOLERANCE: f64 = 0.1;

/// Tolerance for float comparisons on timeline positions.
pub const TIME_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ClipKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClipKind {
    Video,
    Audio,
    Image,
}

// ---------------------------------------------------------------------------
// Effect / SpeedPoint
// ---------------------------------------------------------------------------

/// A named effect or transition attached to a clip. Parameters are opaque to
/// the engine; they only need to survive serialization and clip copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    pub id: Uuid,
    pub name: String,
    pub params: serde_json::Value,
}

/// One control point of a clip speed curve: playback `rate` from `time`
/// (seconds into the clip) onward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeedPoint {
    pub time: f64,
    pub rate: f64,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A placed, trimmed reference to a media asset on a track.
///
/// `start` and `duration` are timeline seconds; `trim_start`/`trim_end` are
/// the seconds cut from the source's head/tail. The engine keeps
/// `trim_start + duration + trim_end <= source duration` whenever the asset
/// duration is known, and always keeps `duration >= MIN_CLIP_DURATION`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub track_id: Uuid,
    pub kind: ClipKind,
    pub start: f64,
    pub duration: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub linked_clip_id: Option<Uuid>,
    pub volume: f64,
    pub opacity: f64,
    pub effects: Vec<Effect>,
    pub transitions: Vec<Effect>,
    pub speed_curve: Option<Vec<SpeedPoint>>,
}

impl Clip {
    pub fn new(asset_id: Uuid, track_id: Uuid, kind: ClipKind, start: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            track_id,
            kind,
            start: start.max(0.0),
            duration: duration.max(MIN_CLIP_DURATION),
            trim_start: 0.0,
            trim_end: 0.0,
            linked_clip_id: None,
            volume: 1.0,
            opacity: 1.0,
            effects: vec![],
            transitions: vec![],
            speed_curve: None,
        }
    }

    /// Timeline end of the clip (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

// ---------------------------------------------------------------------------
// TrackKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// An ordered lane of clips. Clips are kept sorted by `start` after every
/// structural mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub kind: TrackKind,
    pub clips: Vec<Clip>,
    pub allow_overlap: bool,
    pub locked: bool,
    pub muted: bool,
    pub solo: bool,
    pub volume: f64,
    pub visible: bool,
    pub z_index: u32,
}

impl Track {
    /// New empty track. Audio tracks allow overlapping clips, video tracks
    /// block them.
    pub fn new(kind: TrackKind, z_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            clips: vec![],
            allow_overlap: kind == TrackKind::Audio,
            locked: false,
            muted: false,
            solo: false,
            volume: 1.0,
            visible: true,
            z_index,
        }
    }

    /// Re-establish the sort-by-start invariant.
    pub fn sort_clips(&mut self) {
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}

// ---------------------------------------------------------------------------
// SequenceFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SequenceFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub sample_rate: u32,
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// One editable timeline: a set of tracks plus the derived total duration.
/// `duration` is recomputed after every structural mutation, never stored
/// stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sequence {
    pub id: Uuid,
    pub tracks: Vec<Track>,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub sample_rate: u32,
}

impl Sequence {
    pub fn new(format: SequenceFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks: vec![],
            duration: 0.0,
            width: format.width,
            height: format.height,
            fps: format.fps,
            sample_rate: format.sample_rate,
        }
    }

    /// `duration = max(clip.start + clip.duration)` over all clips.
    pub fn recompute_duration(&mut self) {
        self.duration = self
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(Clip::end)
            .fold(0.0, f64::max);
    }

    pub fn track(&self, track_id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn clip(&self, clip_id: Uuid) -> Option<&Clip> {
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .find(|c| c.id == clip_id)
    }

    /// First (track index, clip index) holding the given clip id.
    pub fn clip_location(&self, clip_id: Uuid) -> Option<(usize, usize)> {
        for (ti, track) in self.tracks.iter().enumerate() {
            if let Some(ci) = track.clips.iter().position(|c| c.id == clip_id) {
                return Some((ti, ci));
            }
        }
        None
    }

    /// Check the structural invariants the engine maintains: non-negative
    /// clip timing, the minimum duration floor, sort-by-start order and no
    /// overlaps on tracks that block them. Used to reject corrupt documents
    /// on load; in-process edits uphold these by construction.
    pub fn validate(&self) -> crate::Result<()> {
        use crate::CoreError;
        for track in &self.tracks {
            for clip in &track.clips {
                if clip.start < 0.0
                    || clip.trim_start < 0.0
                    || clip.trim_end < 0.0
                    || clip.duration < MIN_CLIP_DURATION - TIME_EPSILON
                {
                    return Err(CoreError::InvariantViolated(format!(
                        "clip {} has out-of-range timing",
                        clip.id
                    )));
                }
            }
            for pair in track.clips.windows(2) {
                if pair[0].start > pair[1].start {
                    return Err(CoreError::InvariantViolated(format!(
                        "track {} clips are not sorted by start",
                        track.id
                    )));
                }
            }
            if !track.allow_overlap {
                let mut max_end = f64::NEG_INFINITY;
                for clip in &track.clips {
                    if clip.start < max_end - TIME_EPSILON {
                        return Err(CoreError::InvariantViolated(format!(
                            "track {} has overlapping clips",
                            track.id
                        )));
                    }
                    max_end = max_end.max(clip.end());
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BeatMarker
// ---------------------------------------------------------------------------

/// A beat detected by the (external) audio analysis collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BeatMarker {
    pub time: f64,
    pub strength: f64,
}

// ---------------------------------------------------------------------------
// AssetMeta
// ---------------------------------------------------------------------------

/// Metadata supplied by the media-asset provider. The engine only relies on
/// `duration` (trim bounds) and `beat_markers` (beat snapping); the rest is
/// carried for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetMeta {
    pub duration: f64,
    pub kind: ClipKind,
    pub thumbnails: Vec<String>,
    pub waveform: Option<Vec<f32>>,
    pub beat_markers: Option<Vec<BeatMarker>>,
}

// ---------------------------------------------------------------------------
// ProjectSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSettings {
    pub snap_tolerance: f64,
    pub zoom: f64,
    pub active_sequence_id: Option<Uuid>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            zoom: 1.0,
            active_sequence_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// The long-lived document root. Mutated only through the editor; every
/// committed mutation replaces the whole value (copy-on-write), so held
/// references to older snapshots stay valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub sequences: Vec<Sequence>,
    pub media_assets: HashMap<Uuid, AssetMeta>,
    pub settings: ProjectSettings,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
