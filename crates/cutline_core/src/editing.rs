//! Structural edit operations on a [`Sequence`].
//!
//! Every operation follows the same contract: out-of-bounds arguments are
//! clamped and impossible requests (unknown ids, locked tracks, split time
//! outside the clip) are silent no-ops, signalled through the return value.
//! Operations that change a track's clip set finish by re-sorting the track
//! and recomputing the sequence duration.

use crate::types::{Clip, ClipKind, Sequence, Track, TrackKind, MIN_CLIP_DURATION, TIME_EPSILON};
use uuid::Uuid;

impl Sequence {
    /// Relocate a clip, optionally across tracks. `new_start` is clamped at
    /// 0. Returns `false` when nothing changed (unknown ids, locked track,
    /// or the clip is already there).
    pub fn move_clip(&mut self, clip_id: Uuid, target_track_id: Uuid, new_start: f64) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        let Some(target_ti) = self.tracks.iter().position(|t| t.id == target_track_id) else {
            return false;
        };
        if self.tracks[ti].locked || self.tracks[target_ti].locked {
            return false;
        }
        let new_start = new_start.max(0.0);
        if ti == target_ti && (self.tracks[ti].clips[ci].start - new_start).abs() <= TIME_EPSILON {
            return false;
        }

        let mut clip = self.tracks[ti].clips.remove(ci);
        clip.start = new_start;
        clip.track_id = target_track_id;
        self.tracks[target_ti].clips.push(clip);
        self.tracks[target_ti].sort_clips();
        self.recompute_duration();
        true
    }

    /// Trim the clip's head and tail: `trim_start += d_start`,
    /// `trim_end += d_end`, `duration -= d_start + d_end`. The head trim
    /// moves `start` by the applied delta so the clip's end stays put.
    /// Deltas are clamped so trims stay non-negative, `start` stays
    /// non-negative and `duration` never drops below the minimum floor.
    pub fn trim_clip(&mut self, clip_id: Uuid, d_start: f64, d_end: f64) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let clip = &mut self.tracks[ti].clips[ci];

        let ds = d_start
            .min(clip.duration - MIN_CLIP_DURATION)
            .max((-clip.trim_start).max(-clip.start));
        let de = d_end
            .min(clip.duration - ds - MIN_CLIP_DURATION)
            .max(-clip.trim_end);
        if ds.abs() <= TIME_EPSILON && de.abs() <= TIME_EPSILON {
            return false;
        }

        clip.trim_start += ds;
        clip.trim_end += de;
        clip.duration -= ds + de;
        clip.start += ds;

        self.tracks[ti].sort_clips();
        self.recompute_duration();
        true
    }

    /// Like [`trim_clip`](Self::trim_clip) but the clip's `start` stays
    /// fixed (its end absorbs both deltas) and every clip at or past the
    /// trimmed clip's former end shifts by the net duration delta, so the
    /// gaps between subsequent clips are preserved.
    pub fn ripple_trim(&mut self, clip_id: Uuid, d_start: f64, d_end: f64) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let clip = &mut self.tracks[ti].clips[ci];

        let ds = d_start
            .min(clip.duration - MIN_CLIP_DURATION)
            .max(-clip.trim_start);
        let de = d_end
            .min(clip.duration - ds - MIN_CLIP_DURATION)
            .max(-clip.trim_end);
        if ds.abs() <= TIME_EPSILON && de.abs() <= TIME_EPSILON {
            return false;
        }

        let old_end = clip.end();
        clip.trim_start += ds;
        clip.trim_end += de;
        clip.duration -= ds + de;
        let delta = clip.end() - old_end;

        for other in &mut self.tracks[ti].clips {
            if other.id != clip_id && other.start >= old_end - TIME_EPSILON {
                other.start = (other.start + delta).max(0.0);
            }
        }

        self.tracks[ti].sort_clips();
        self.recompute_duration();
        true
    }

    /// Split a clip at timeline position `time`, which must fall strictly
    /// inside the clip. The left clip keeps the original id; the right clip
    /// starts at `time` with its `trim_start` advanced by the split offset.
    /// Returns the right clip's id, or `None` when `time` is outside the
    /// clip's open interval.
    pub fn split_clip_at_time(&mut self, clip_id: Uuid, time: f64) -> Option<Uuid> {
        let (ti, ci) = self.clip_location(clip_id)?;
        if self.tracks[ti].locked {
            return None;
        }
        let original = self.tracks[ti].clips[ci].clone();
        if time <= original.start + TIME_EPSILON || time >= original.end() - TIME_EPSILON {
            return None;
        }
        let offset = time - original.start;

        let mut left = original.clone();
        left.duration = offset;
        left.trim_end = original.trim_end + (original.duration - offset);

        let mut right = original.clone();
        right.id = Uuid::new_v4();
        right.start = time;
        right.duration = original.duration - offset;
        right.trim_start = original.trim_start + offset;
        right.linked_clip_id = None;
        let right_id = right.id;

        self.tracks[ti].clips[ci] = left;
        self.tracks[ti].clips.insert(ci + 1, right);
        self.tracks[ti].sort_clips();
        self.recompute_duration();
        Some(right_id)
    }

    /// Insert a copy of the clip immediately after the original, shifting
    /// every clip starting at or past the insertion point right by the
    /// duplicate's duration. Returns the duplicate's id.
    pub fn duplicate_clip(&mut self, clip_id: Uuid) -> Option<Uuid> {
        let (ti, ci) = self.clip_location(clip_id)?;
        if self.tracks[ti].locked {
            return None;
        }
        let mut dup = self.tracks[ti].clips[ci].clone();
        let insert_at = dup.end();
        dup.id = Uuid::new_v4();
        dup.start = insert_at;
        dup.linked_clip_id = None;
        let dup_id = dup.id;

        for clip in &mut self.tracks[ti].clips {
            if clip.start >= insert_at - TIME_EPSILON {
                clip.start += dup.duration;
            }
        }
        self.tracks[ti].clips.push(dup);
        self.tracks[ti].sort_clips();
        self.recompute_duration();
        Some(dup_id)
    }

    /// Remove the clip and shift every later clip on the same track left by
    /// its duration. Only the first track containing the id is affected.
    pub fn ripple_delete(&mut self, clip_id: Uuid) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let removed = self.tracks[ti].clips.remove(ci);
        self.clear_links_to(removed.id);

        for clip in &mut self.tracks[ti].clips {
            if clip.start >= removed.start - TIME_EPSILON {
                clip.start = (clip.start - removed.duration).max(0.0);
            }
        }
        self.tracks[ti].sort_clips();
        self.recompute_duration();
        true
    }

    /// Remove the clip without rippling. Clears the partner's link.
    pub fn delete_clip(&mut self, clip_id: Uuid) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let removed = self.tracks[ti].clips.remove(ci);
        self.clear_links_to(removed.id);
        self.recompute_duration();
        true
    }

    /// Shift which portion of the source the clip shows without moving it:
    /// `trim_start += delta`, `trim_end -= delta`, clamped so both trims
    /// stay non-negative and, when the source duration is known,
    /// `trim_start <= source_duration - duration`. Never errors.
    pub fn slip_edit(&mut self, clip_id: Uuid, delta: f64, source_duration: Option<f64>) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let clip = &mut self.tracks[ti].clips[ci];

        let mut upper = clip.trim_end;
        if let Some(src) = source_duration {
            let max_trim_start = (src - clip.duration).max(0.0);
            upper = upper.min(max_trim_start - clip.trim_start);
        }
        let d = delta.min(upper).max(-clip.trim_start);
        if d.abs() <= TIME_EPSILON {
            return false;
        }
        clip.trim_start += d;
        clip.trim_end -= d;
        true
    }

    /// Move a clip while pushing neighbors instead of colliding with them:
    /// an adjacent clip shifts only by the part of the delta its gap cannot
    /// absorb, and the push propagates transitively while a gap would
    /// otherwise invert. A leftward slide is clamped so the whole pushed
    /// chain still fits above 0: the clip never starts before the packed
    /// durations of the clips to its left.
    pub fn slide_edit(&mut self, clip_id: Uuid, new_start: f64) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        if self.tracks[ti].locked {
            return false;
        }
        let clips = &mut self.tracks[ti].clips;
        let mut new_start = new_start.max(0.0);
        if new_start < clips[ci].start {
            // The chain of left neighbors must still fit above 0 when packed
            // flush; a slide past that point clamps to it.
            let packed: f64 = clips[..ci].iter().map(|c| c.duration).sum();
            new_start = new_start.max(packed.min(clips[ci].start));
        }
        let delta = new_start - clips[ci].start;
        if delta.abs() <= TIME_EPSILON {
            return false;
        }
        clips[ci].start = new_start;

        if delta > 0.0 {
            let mut frontier = clips[ci].end();
            for j in ci + 1..clips.len() {
                if clips[j].start >= frontier - TIME_EPSILON {
                    break; // gap absorbed the push
                }
                clips[j].start = frontier;
                frontier = clips[j].end();
            }
        } else {
            let mut frontier = clips[ci].start;
            for j in (0..ci).rev() {
                if clips[j].end() <= frontier + TIME_EPSILON {
                    break;
                }
                clips[j].start = (frontier - clips[j].duration).max(0.0);
                frontier = clips[j].start;
            }
        }

        self.tracks[ti].sort_clips();
        self.recompute_duration();
        true
    }

    /// For a video clip, create a paired audio clip with matching position
    /// and trim on the first audio track (creating one when none exists) and
    /// link the two. No-op for non-video or already-linked clips. Returns
    /// the new audio clip's id.
    pub fn detach_audio(&mut self, clip_id: Uuid) -> Option<Uuid> {
        let (ti, ci) = self.clip_location(clip_id)?;
        if self.tracks[ti].locked {
            return None;
        }
        {
            let clip = &self.tracks[ti].clips[ci];
            if clip.kind != ClipKind::Video || clip.linked_clip_id.is_some() {
                return None;
            }
        }

        let audio_ti = match self
            .tracks
            .iter()
            .position(|t| t.kind == TrackKind::Audio && !t.locked)
        {
            Some(i) => i,
            None => {
                let z = self.tracks.iter().map(|t| t.z_index).max().map_or(0, |z| z + 1);
                self.tracks.push(Track::new(TrackKind::Audio, z));
                self.tracks.len() - 1
            }
        };
        let audio_track_id = self.tracks[audio_ti].id;

        let src = &self.tracks[ti].clips[ci];
        let mut audio = Clip::new(src.asset_id, audio_track_id, ClipKind::Audio, src.start, src.duration);
        audio.trim_start = src.trim_start;
        audio.trim_end = src.trim_end;
        audio.volume = src.volume;
        audio.speed_curve = src.speed_curve.clone();
        audio.linked_clip_id = Some(src.id);
        let audio_id = audio.id;

        self.tracks[ti].clips[ci].linked_clip_id = Some(audio_id);
        self.tracks[audio_ti].clips.push(audio);
        self.tracks[audio_ti].sort_clips();
        self.recompute_duration();
        Some(audio_id)
    }

    /// Pair two clips bidirectionally. No-op when either id is missing or
    /// they are the same clip.
    pub fn link_clips(&mut self, a: Uuid, b: Uuid) -> bool {
        if a == b || self.clip_location(a).is_none() || self.clip_location(b).is_none() {
            return false;
        }
        let (ta, ca) = self.clip_location(a).unwrap();
        self.tracks[ta].clips[ca].linked_clip_id = Some(b);
        let (tb, cb) = self.clip_location(b).unwrap();
        self.tracks[tb].clips[cb].linked_clip_id = Some(a);
        true
    }

    /// Clear the pairing on the clip and its partner. No-op when the id is
    /// missing or the clip has no partner.
    pub fn unlink_clip(&mut self, clip_id: Uuid) -> bool {
        let Some((ti, ci)) = self.clip_location(clip_id) else {
            return false;
        };
        let Some(partner) = self.tracks[ti].clips[ci].linked_clip_id.take() else {
            return false;
        };
        if let Some((tp, cp)) = self.clip_location(partner) {
            self.tracks[tp].clips[cp].linked_clip_id = None;
        }
        true
    }

    /// Place a clip on a track. The caller is responsible for collision
    /// policy (see the editor's command layer); this only clamps the basic
    /// per-clip invariants.
    pub fn add_clip(&mut self, track_id: Uuid, mut clip: Clip) -> Option<Uuid> {
        let ti = self.tracks.iter().position(|t| t.id == track_id)?;
        if self.tracks[ti].locked {
            return None;
        }
        clip.track_id = track_id;
        clip.start = clip.start.max(0.0);
        clip.duration = clip.duration.max(MIN_CLIP_DURATION);
        let id = clip.id;
        self.tracks[ti].clips.push(clip);
        self.tracks[ti].sort_clips();
        self.recompute_duration();
        Some(id)
    }

    /// Append a new empty track below the existing ones.
    pub fn add_track(&mut self, kind: TrackKind) -> Uuid {
        let z = self.tracks.iter().map(|t| t.z_index).max().map_or(0, |z| z + 1);
        let track = Track::new(kind, z);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Remove a track and all of its clips, clearing links from surviving
    /// clips to the removed ones.
    pub fn remove_track(&mut self, track_id: Uuid) -> bool {
        let Some(ti) = self.tracks.iter().position(|t| t.id == track_id) else {
            return false;
        };
        let removed = self.tracks.remove(ti);
        for clip in &removed.clips {
            self.clear_links_to(clip.id);
        }
        self.recompute_duration();
        true
    }

    fn clear_links_to(&mut self, clip_id: Uuid) {
        for track in &mut self.tracks {
            for clip in &mut track.clips {
                if clip.linked_clip_id == Some(clip_id) {
                    clip.linked_clip_id = None;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
