use crate::types::{Sequence, TIME_EPSILON};
use std::collections::HashMap;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ClipInterval / TimeRange / CollisionReport
// ---------------------------------------------------------------------------

/// One clip's occupancy on a track, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInterval {
    pub clip_id: Uuid,
    pub start: f64,
    pub end: f64,
    /// Maximum `end` over this and every earlier interval on the track.
    /// Nondecreasing along the start-sorted list, so range queries stay
    /// binary-searchable even when clips on an overlap track nest.
    pub max_end: f64,
}

/// A half-open time interval `[start, end)`. `end` may be `f64::INFINITY`
/// for the unbounded trailing gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub has_collision: bool,
    pub colliding_clips: Vec<Uuid>,
    /// Merged union of the overlaps between the proposal and each colliding
    /// clip, sorted by start.
    pub collision_zones: Vec<TimeRange>,
}

impl CollisionReport {
    fn clear() -> Self {
        Self {
            has_collision: false,
            colliding_clips: vec![],
            collision_zones: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// IntervalIndex
// ---------------------------------------------------------------------------

/// Per-track sorted interval lists, rebuilt on demand from a sequence.
/// All queries are read-only and safe to call speculatively during drag
/// previews. Queries on an unknown track id behave as an empty track.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    tracks: HashMap<Uuid, Vec<ClipInterval>>,
}

impl IntervalIndex {
    /// Rebuild from the current sequence, O(n log n) in total clip count.
    pub fn from_sequence(sequence: &Sequence) -> Self {
        let mut tracks = HashMap::new();
        for track in &sequence.tracks {
            let mut intervals: Vec<ClipInterval> = track
                .clips
                .iter()
                .map(|c| ClipInterval {
                    clip_id: c.id,
                    start: c.start,
                    end: c.end(),
                    max_end: c.end(),
                })
                .collect();
            intervals.sort_by(|a, b| a.start.total_cmp(&b.start));
            let mut running = f64::NEG_INFINITY;
            for iv in &mut intervals {
                running = running.max(iv.end);
                iv.max_end = running;
            }
            tracks.insert(track.id, intervals);
        }
        Self { tracks }
    }

    fn intervals(&self, track_id: Uuid) -> &[ClipInterval] {
        self.tracks.get(&track_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Would a clip of `duration` placed at `proposed_start` overlap anything
    /// on the track? Binary search on the running maximum end for the first
    /// interval that could reach past the proposal, then scan forward while
    /// interval starts precede the proposal's end: O(log n + k) for k
    /// overlaps on a non-overlapping track.
    pub fn detect_collisions(
        &self,
        track_id: Uuid,
        proposed_start: f64,
        duration: f64,
        exclude_clip_id: Option<Uuid>,
    ) -> CollisionReport {
        let intervals = self.intervals(track_id);
        if intervals.is_empty() || duration <= 0.0 {
            return CollisionReport::clear();
        }
        let proposed_end = proposed_start + duration;

        let first = intervals.partition_point(|iv| iv.max_end <= proposed_start);

        let mut colliding = vec![];
        let mut zones: Vec<TimeRange> = vec![];
        for iv in &intervals[first..] {
            if iv.start >= proposed_end {
                break; // sorted by start, nothing further can overlap
            }
            if Some(iv.clip_id) == exclude_clip_id || iv.end <= proposed_start {
                continue;
            }
            colliding.push(iv.clip_id);
            zones.push(TimeRange {
                start: proposed_start.max(iv.start),
                end: proposed_end.min(iv.end),
            });
        }

        CollisionReport {
            has_collision: !colliding.is_empty(),
            colliding_clips: colliding,
            collision_zones: merge_ranges(zones),
        }
    }

    /// Nearest collision-free start for a clip of `duration` proposed at
    /// `proposed_start`. Returns the proposal unchanged (floored at 0) when
    /// it is already free; otherwise tries placing the clip flush after or
    /// flush before every interval on the track and picks the free candidate
    /// closest to the proposal (ties resolve to the earlier position).
    ///
    /// The search is discrete: it assumes the minimal-distance valid position
    /// touches an existing clip boundary, which holds for push-into-nearest-gap
    /// semantics but does not separately consider interior-gap placements.
    pub fn find_nearest_valid_position(
        &self,
        track_id: Uuid,
        proposed_start: f64,
        duration: f64,
        exclude_clip_id: Option<Uuid>,
    ) -> f64 {
        let proposed = proposed_start.max(0.0);
        if !self
            .detect_collisions(track_id, proposed, duration, exclude_clip_id)
            .has_collision
        {
            return proposed;
        }

        let mut best: Option<f64> = None;
        for iv in self.intervals(track_id) {
            if Some(iv.clip_id) == exclude_clip_id {
                continue;
            }
            for candidate in [iv.end, iv.start - duration] {
                if candidate < 0.0 {
                    continue;
                }
                if self
                    .detect_collisions(track_id, candidate, duration, exclude_clip_id)
                    .has_collision
                {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some(b) => {
                        let (dc, db) = ((candidate - proposed).abs(), (b - proposed).abs());
                        dc < db - TIME_EPSILON
                            || ((dc - db).abs() <= TIME_EPSILON && candidate < b)
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        best.unwrap_or(proposed)
    }

    /// Gaps able to hold a clip of `duration`: the gap before the first
    /// clip, each inter-clip gap, and the unbounded gap after the last clip
    /// (`end = f64::INFINITY`). The leading and interior gaps are subject to
    /// the same minimum-size filter; only the trailing gap is returned
    /// unconditionally.
    pub fn find_gaps(&self, track_id: Uuid, duration: f64) -> Vec<TimeRange> {
        let intervals = self.intervals(track_id);
        if intervals.is_empty() {
            return vec![TimeRange {
                start: 0.0,
                end: f64::INFINITY,
            }];
        }

        let mut gaps = vec![];
        let mut cursor = 0.0_f64;
        for iv in intervals {
            if iv.start - cursor >= duration - TIME_EPSILON && iv.start > cursor {
                gaps.push(TimeRange {
                    start: cursor,
                    end: iv.start,
                });
            }
            cursor = cursor.max(iv.end);
        }
        gaps.push(TimeRange {
            start: cursor,
            end: f64::INFINITY,
        });
        gaps
    }

    /// Ids of clips intersecting `[start, end)`, same binary-search-then-scan
    /// pattern as `detect_collisions`, without exclusion.
    pub fn clips_in_range(&self, track_id: Uuid, start: f64, end: f64) -> Vec<Uuid> {
        let intervals = self.intervals(track_id);
        let first = intervals.partition_point(|iv| iv.max_end <= start);
        intervals[first..]
            .iter()
            .take_while(|iv| iv.start < end)
            .filter(|iv| iv.end > start)
            .map(|iv| iv.clip_id)
            .collect()
    }
}

/// Merge overlapping or touching ranges into a minimal sorted union.
fn merge_ranges(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
    ranges.sort_by(|a, b| a.start.total_cmp(&b.start));
    let mut merged: Vec<TimeRange> = vec![];
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end + TIME_EPSILON => {
                last.end = last.end.max(r.end);
            }
            _ => merged.push(r),
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::preset_1080p;
    use crate::types::{Clip, ClipKind, Sequence, Track, TrackKind};

    /// Sequence with one video track holding clips at the given [start, end)
    /// ranges. Returns (sequence, track id, clip ids).
    fn make_sequence(ranges: &[(f64, f64)]) -> (Sequence, Uuid, Vec<Uuid>) {
        let mut seq = Sequence::new(preset_1080p());
        let mut track = Track::new(TrackKind::Video, 0);
        let track_id = track.id;
        let mut ids = vec![];
        for &(start, end) in ranges {
            let clip = Clip::new(Uuid::new_v4(), track_id, ClipKind::Video, start, end - start);
            ids.push(clip.id);
            track.clips.push(clip);
        }
        track.sort_clips();
        seq.tracks.push(track);
        seq.recompute_duration();
        (seq, track_id, ids)
    }

    // -----------------------------------------------------------------------
    // detect_collisions
    // -----------------------------------------------------------------------

    #[test]
    fn binary_search_finds_single_overlap() {
        let (seq, track_id, ids) = make_sequence(&[(0.0, 2.0), (5.0, 8.0), (10.0, 12.0)]);
        let index = IntervalIndex::from_sequence(&seq);

        let report = index.detect_collisions(track_id, 6.0, 3.0, None);
        assert!(report.has_collision);
        assert_eq!(report.colliding_clips, vec![ids[1]]);
        assert_eq!(
            report.collision_zones,
            vec![TimeRange { start: 6.0, end: 8.0 }]
        );
    }

    #[test]
    fn exact_gap_fit_is_collision_free() {
        let (seq, track_id, _) = make_sequence(&[(0.0, 2.0), (5.0, 8.0), (10.0, 12.0)]);
        let index = IntervalIndex::from_sequence(&seq);

        let report = index.detect_collisions(track_id, 2.0, 3.0, None);
        assert!(!report.has_collision);
        assert!(report.colliding_clips.is_empty());
    }

    #[test]
    fn proposal_spanning_several_clips_merges_zones() {
        let (seq, track_id, ids) = make_sequence(&[(0.0, 2.0), (5.0, 8.0), (10.0, 12.0)]);
        let index = IntervalIndex::from_sequence(&seq);

        let report = index.detect_collisions(track_id, 1.0, 10.0, None);
        assert_eq!(report.colliding_clips, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(
            report.collision_zones,
            vec![
                TimeRange { start: 1.0, end: 2.0 },
                TimeRange { start: 5.0, end: 8.0 },
                TimeRange { start: 10.0, end: 11.0 },
            ]
        );
    }

    #[test]
    fn excluded_clip_is_ignored() {
        let (seq, track_id, ids) = make_sequence(&[(0.0, 4.0)]);
        let index = IntervalIndex::from_sequence(&seq);

        let report = index.detect_collisions(track_id, 1.0, 2.0, Some(ids[0]));
        assert!(!report.has_collision);
    }

    #[test]
    fn collision_is_symmetric() {
        // A proposed at [3, 6) vs existing B [5, 8): both directions agree.
        let (seq_b, track_b, _) = make_sequence(&[(5.0, 8.0)]);
        let index_b = IntervalIndex::from_sequence(&seq_b);
        let a_vs_b = index_b.detect_collisions(track_b, 3.0, 3.0, None).has_collision;

        let (seq_a, track_a, _) = make_sequence(&[(3.0, 6.0)]);
        let index_a = IntervalIndex::from_sequence(&seq_a);
        let b_vs_a = index_a.detect_collisions(track_a, 5.0, 3.0, None).has_collision;

        assert_eq!(a_vs_b, b_vs_a);
        assert!(a_vs_b);
    }

    #[test]
    fn nested_interval_on_overlap_track_is_found() {
        // Audio tracks allow nesting: a short clip inside a long one makes
        // interval ends non-monotonic, which the running-max-end bound covers.
        let mut seq = Sequence::new(preset_1080p());
        let mut track = Track::new(TrackKind::Audio, 0);
        let track_id = track.id;
        let long = Clip::new(Uuid::new_v4(), track_id, ClipKind::Audio, 0.0, 10.0);
        let long_id = long.id;
        let short = Clip::new(Uuid::new_v4(), track_id, ClipKind::Audio, 2.0, 1.0);
        track.clips.push(long);
        track.clips.push(short);
        track.sort_clips();
        seq.tracks.push(track);
        let index = IntervalIndex::from_sequence(&seq);

        let report = index.detect_collisions(track_id, 5.0, 1.0, None);
        assert!(report.has_collision);
        assert_eq!(report.colliding_clips, vec![long_id]);
        assert_eq!(
            report.collision_zones,
            vec![TimeRange { start: 5.0, end: 6.0 }]
        );

        assert_eq!(index.clips_in_range(track_id, 5.0, 6.0), vec![long_id]);
    }

    #[test]
    fn unknown_track_reports_no_collision() {
        let (seq, _, _) = make_sequence(&[(0.0, 2.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        let report = index.detect_collisions(Uuid::new_v4(), 0.0, 10.0, None);
        assert!(!report.has_collision);
    }

    // -----------------------------------------------------------------------
    // find_nearest_valid_position
    // -----------------------------------------------------------------------

    #[test]
    fn free_proposal_passes_through() {
        let (seq, track_id, _) = make_sequence(&[(5.0, 10.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, 1.0, 2.0, None), 1.0);
    }

    #[test]
    fn negative_proposal_floors_at_zero() {
        let (seq, track_id, _) = make_sequence(&[(5.0, 10.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, -3.0, 2.0, None), 0.0);
    }

    #[test]
    fn blocked_proposal_picks_nearest_boundary() {
        // Single clip [5, 10), 2s clip proposed at 6: before-candidate 3 is
        // distance 3, after-candidate 10 is distance 4, so expect 3.
        let (seq, track_id, _) = make_sequence(&[(5.0, 10.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, 6.0, 2.0, None), 3.0);
    }

    #[test]
    fn blocked_proposal_prefers_after_when_closer() {
        let (seq, track_id, _) = make_sequence(&[(5.0, 10.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, 9.0, 2.0, None), 10.0);
    }

    #[test]
    fn before_candidate_must_not_underflow_zero() {
        // Clip [0, 4): placing a 2s clip before it would start at -2, so the
        // only valid boundary candidate is 4.
        let (seq, track_id, _) = make_sequence(&[(0.0, 4.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, 1.0, 2.0, None), 4.0);
    }

    #[test]
    fn candidate_colliding_with_other_clip_is_rejected() {
        // [0, 4) and [5, 9): a 2s clip proposed at 2 cannot sit flush after
        // the first clip (4..6 hits the second); nearest valid is 9.
        let (seq, track_id, _) = make_sequence(&[(0.0, 4.0), (5.0, 9.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        assert_eq!(index.find_nearest_valid_position(track_id, 2.0, 2.0, None), 9.0);
    }

    // -----------------------------------------------------------------------
    // find_gaps
    // -----------------------------------------------------------------------

    #[test]
    fn find_gaps_empty_track_is_one_unbounded_gap() {
        let (seq, _, _) = make_sequence(&[]);
        let index = IntervalIndex::from_sequence(&seq);
        let gaps = index.find_gaps(Uuid::new_v4(), 1.0);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, 0.0);
        assert!(gaps[0].end.is_infinite());
    }

    #[test]
    fn find_gaps_reports_leading_interior_and_trailing() {
        let (seq, track_id, _) = make_sequence(&[(2.0, 4.0), (7.0, 9.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        let gaps = index.find_gaps(track_id, 1.0);
        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[0], TimeRange { start: 0.0, end: 2.0 });
        assert_eq!(gaps[1], TimeRange { start: 4.0, end: 7.0 });
        assert_eq!(gaps[2].start, 9.0);
        assert!(gaps[2].end.is_infinite());
    }

    #[test]
    fn find_gaps_filters_too_small_interior_gaps() {
        let (seq, track_id, _) = make_sequence(&[(0.0, 4.0), (5.0, 9.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        let gaps = index.find_gaps(track_id, 2.0);
        // The 1s gap at [4, 5) is too small; only the trailing gap remains.
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, 9.0);
    }

    #[test]
    fn find_gaps_filters_too_small_leading_gap() {
        let (seq, track_id, _) = make_sequence(&[(1.0, 4.0)]);
        let index = IntervalIndex::from_sequence(&seq);
        let gaps = index.find_gaps(track_id, 2.0);
        // The 1s gap at [0, 1) cannot hold a 2s clip.
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, 4.0);
    }

    // -----------------------------------------------------------------------
    // clips_in_range
    // -----------------------------------------------------------------------

    #[test]
    fn clips_in_range_scans_sorted_intervals() {
        let (seq, track_id, ids) = make_sequence(&[(0.0, 2.0), (5.0, 8.0), (10.0, 12.0)]);
        let index = IntervalIndex::from_sequence(&seq);

        assert_eq!(index.clips_in_range(track_id, 1.0, 6.0), vec![ids[0], ids[1]]);
        assert_eq!(index.clips_in_range(track_id, 2.0, 5.0), Vec::<Uuid>::new());
        assert_eq!(index.clips_in_range(track_id, 11.0, 20.0), vec![ids[2]]);
    }

    // -----------------------------------------------------------------------
    // merge_ranges
    // -----------------------------------------------------------------------

    #[test]
    fn merge_ranges_unions_touching_and_overlapping() {
        let merged = merge_ranges(vec![
            TimeRange { start: 4.0, end: 6.0 },
            TimeRange { start: 0.0, end: 2.0 },
            TimeRange { start: 2.0, end: 3.0 },
            TimeRange { start: 5.0, end: 8.0 },
        ]);
        assert_eq!(
            merged,
            vec![
                TimeRange { start: 0.0, end: 3.0 },
                TimeRange { start: 4.0, end: 8.0 },
            ]
        );
    }
}
