use crate::types::{BeatMarker, Sequence, TIME_EPSILON};
use uuid::Uuid;

/// Beat deltas outside this window are tempo-implausible and ignored when
/// estimating BPM (24..300 BPM).
const MIN_BEAT_DELTA: f64 = 0.2;
const MAX_BEAT_DELTA: f64 = 2.5;

/// Collect snap candidates for dragging a clip on `track_id`: edges of every
/// other clip on that track, the playhead, and beat markers when beat snap is
/// on. Sorted and deduplicated.
pub fn collect_snap_points(
    sequence: &Sequence,
    track_id: Uuid,
    exclude_clip_id: Option<Uuid>,
    playhead: Option<f64>,
    beat_markers: Option<&[BeatMarker]>,
) -> Vec<f64> {
    let mut points = vec![0.0];

    if let Some(track) = sequence.track(track_id) {
        for clip in &track.clips {
            if Some(clip.id) == exclude_clip_id {
                continue;
            }
            points.push(clip.start);
            points.push(clip.end());
        }
    }
    if let Some(playhead) = playhead {
        points.push(playhead);
    }
    if let Some(markers) = beat_markers {
        points.extend(markers.iter().map(|m| m.time));
    }

    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup_by(|a, b| (*a - *b).abs() <= TIME_EPSILON);
    points
}

/// Snap a proposed clip placement to the nearest candidate within
/// `tolerance`. Both the clip's start and its end are checked against every
/// candidate and whichever edge lands closer wins; the returned value is the
/// adjusted start. Outside tolerance the proposal passes through unchanged.
pub fn resolve_snap(start: f64, duration: f64, snap_points: &[f64], tolerance: f64) -> f64 {
    let end = start + duration;
    let mut best = start;
    let mut best_dist = f64::INFINITY;

    for &point in snap_points {
        let start_dist = (point - start).abs();
        if start_dist < best_dist {
            best = point;
            best_dist = start_dist;
        }
        let end_dist = (point - end).abs();
        if end_dist < best_dist {
            best = point - duration;
            best_dist = end_dist;
        }
    }

    if best_dist <= tolerance + TIME_EPSILON {
        best
    } else {
        start
    }
}

/// Uniform snap grid derived from a known tempo: one point every `60/bpm`
/// seconds from 0 through `until`. Fallback for assets with a BPM but no
/// extracted beat markers.
pub fn beat_grid(bpm: f64, until: f64) -> Vec<f64> {
    if bpm <= 0.0 || until < 0.0 {
        return vec![];
    }
    let step = 60.0 / bpm;
    let count = (until / step).floor() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}

/// Estimate BPM from a beat marker series as `round(60 / median delta)`,
/// considering only consecutive deltas inside the plausible tempo window to
/// reject detection outliers. `None` when no usable deltas remain.
pub fn estimate_bpm(markers: &[BeatMarker]) -> Option<f64> {
    let mut deltas: Vec<f64> = markers
        .windows(2)
        .map(|w| w[1].time - w[0].time)
        .filter(|d| (MIN_BEAT_DELTA..=MAX_BEAT_DELTA).contains(d))
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_by(|a, b| a.total_cmp(b));
    let median = if deltas.len() % 2 == 1 {
        deltas[deltas.len() / 2]
    } else {
        (deltas[deltas.len() / 2 - 1] + deltas[deltas.len() / 2]) / 2.0
    };
    Some((60.0 / median).round())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
