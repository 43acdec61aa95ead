//! The single-owner document handle: commands in, committed documents out.
//!
//! Every command clones the current project, mutates the clone, and commits
//! it only when something actually changed, pushing the pre-mutation snapshot
//! onto the history. Holders of older `Project` values are never invalidated.

use crate::collision::IntervalIndex;
use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::types::{Clip, Project, Sequence, TrackKind};
use tracing::{debug, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// EditCommand
// ---------------------------------------------------------------------------

/// The command surface consumed by the presentation layer. Arguments are
/// plain numbers and ids; gesture-to-delta translation happens upstream.
#[derive(Debug, Clone)]
pub enum EditCommand {
    MoveClip {
        clip_id: Uuid,
        target_track_id: Uuid,
        new_start: f64,
    },
    TrimClip {
        clip_id: Uuid,
        d_start: f64,
        d_end: f64,
    },
    RippleTrim {
        clip_id: Uuid,
        d_start: f64,
        d_end: f64,
    },
    SplitClipAtTime {
        clip_id: Uuid,
        time: f64,
    },
    DuplicateClip {
        clip_id: Uuid,
    },
    RippleDelete {
        clip_id: Uuid,
    },
    DeleteClip {
        clip_id: Uuid,
    },
    SlipEdit {
        clip_id: Uuid,
        delta: f64,
    },
    SlideEdit {
        clip_id: Uuid,
        new_start: f64,
    },
    DetachAudio {
        clip_id: Uuid,
    },
    LinkClips {
        a: Uuid,
        b: Uuid,
    },
    UnlinkClip {
        clip_id: Uuid,
    },
    AddClip {
        track_id: Uuid,
        clip: Clip,
    },
    AddTrack {
        kind: TrackKind,
    },
    RemoveTrack {
        track_id: Uuid,
    },
}

impl EditCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::MoveClip { .. } => "move_clip",
            Self::TrimClip { .. } => "trim_clip",
            Self::RippleTrim { .. } => "ripple_trim",
            Self::SplitClipAtTime { .. } => "split_clip_at_time",
            Self::DuplicateClip { .. } => "duplicate_clip",
            Self::RippleDelete { .. } => "ripple_delete",
            Self::DeleteClip { .. } => "delete_clip",
            Self::SlipEdit { .. } => "slip_edit",
            Self::SlideEdit { .. } => "slide_edit",
            Self::DetachAudio { .. } => "detach_audio",
            Self::LinkClips { .. } => "link_clips",
            Self::UnlinkClip { .. } => "unlink_clip",
            Self::AddClip { .. } => "add_clip",
            Self::AddTrack { .. } => "add_track",
            Self::RemoveTrack { .. } => "remove_track",
        }
    }
}

// ---------------------------------------------------------------------------
// EditOutcome
// ---------------------------------------------------------------------------

/// What a command did. `changed == false` means the command was a silent
/// no-op and the document was not replaced; callers wanting to surface that
/// to a user pre-check validity themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub changed: bool,
    /// The start the document actually committed, when a collision diverted
    /// a move or insertion away from the raw proposal.
    pub applied_start: Option<f64>,
    /// Id of a clip or track the command created.
    pub created_id: Option<Uuid>,
}

impl EditOutcome {
    fn noop() -> Self {
        Self {
            changed: false,
            applied_start: None,
            created_id: None,
        }
    }

    fn changed() -> Self {
        Self {
            changed: true,
            applied_start: None,
            created_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

pub struct Editor {
    project: Project,
    history: History,
}

impl Editor {
    pub fn new(project: Project) -> Self {
        Self::with_capacity(project, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(project: Project, history_capacity: usize) -> Self {
        Self {
            project,
            history: History::new(history_capacity),
        }
    }

    /// The current authoritative document.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the document wholesale (load), keeping history.
    pub fn replace_project(&mut self, project: Project) {
        self.history.record(std::mem::replace(&mut self.project, project));
    }

    pub fn active_sequence(&self) -> Option<&Sequence> {
        active_sequence(&self.project)
    }

    /// Fresh collision index over the active sequence, for speculative
    /// queries during drag previews.
    pub fn interval_index(&self) -> IntervalIndex {
        self.active_sequence()
            .map(IntervalIndex::from_sequence)
            .unwrap_or_default()
    }

    /// Execute a command against a clone of the document and commit the
    /// clone when it changed anything.
    pub fn apply(&mut self, command: EditCommand) -> EditOutcome {
        // Slip bounds need the source duration, read from the current
        // document before cloning.
        let slip_source_duration = match &command {
            EditCommand::SlipEdit { clip_id, .. } => self.source_duration_of(*clip_id),
            _ => None,
        };

        let mut next = self.project.clone();
        let Some(sequence) = active_sequence_mut(&mut next) else {
            return EditOutcome::noop();
        };

        let outcome = match &command {
            EditCommand::MoveClip {
                clip_id,
                target_track_id,
                new_start,
            } => {
                let duration = sequence.clip(*clip_id).map(|c| c.duration);
                let start = match duration {
                    Some(duration) => resolve_block_mode_start(
                        sequence,
                        Some(*clip_id),
                        *target_track_id,
                        *new_start,
                        duration,
                    ),
                    None => *new_start,
                };
                let changed = sequence.move_clip(*clip_id, *target_track_id, start);
                let mut outcome = flag(changed);
                outcome.applied_start = changed.then_some(start);
                outcome
            }
            EditCommand::TrimClip { clip_id, d_start, d_end } => {
                flag(sequence.trim_clip(*clip_id, *d_start, *d_end))
            }
            EditCommand::RippleTrim { clip_id, d_start, d_end } => {
                flag(sequence.ripple_trim(*clip_id, *d_start, *d_end))
            }
            EditCommand::SplitClipAtTime { clip_id, time } => {
                created(sequence.split_clip_at_time(*clip_id, *time))
            }
            EditCommand::DuplicateClip { clip_id } => created(sequence.duplicate_clip(*clip_id)),
            EditCommand::RippleDelete { clip_id } => flag(sequence.ripple_delete(*clip_id)),
            EditCommand::DeleteClip { clip_id } => flag(sequence.delete_clip(*clip_id)),
            EditCommand::SlipEdit { clip_id, delta } => {
                flag(sequence.slip_edit(*clip_id, *delta, slip_source_duration))
            }
            EditCommand::SlideEdit { clip_id, new_start } => {
                flag(sequence.slide_edit(*clip_id, *new_start))
            }
            EditCommand::DetachAudio { clip_id } => created(sequence.detach_audio(*clip_id)),
            EditCommand::LinkClips { a, b } => flag(sequence.link_clips(*a, *b)),
            EditCommand::UnlinkClip { clip_id } => flag(sequence.unlink_clip(*clip_id)),
            EditCommand::AddClip { track_id, clip } => {
                let start = resolve_block_mode_start(
                    sequence,
                    None,
                    *track_id,
                    clip.start,
                    clip.duration,
                );
                let mut clip = clip.clone();
                clip.start = start;
                match sequence.add_clip(*track_id, clip) {
                    Some(id) => EditOutcome {
                        changed: true,
                        applied_start: Some(start),
                        created_id: Some(id),
                    },
                    None => EditOutcome::noop(),
                }
            }
            EditCommand::AddTrack { kind } => {
                let id = sequence.add_track(*kind);
                EditOutcome {
                    created_id: Some(id),
                    ..EditOutcome::changed()
                }
            }
            EditCommand::RemoveTrack { track_id } => flag(sequence.remove_track(*track_id)),
        };

        if outcome.changed {
            debug!(command = command.name(), "commit edit");
            self.history.record(std::mem::replace(&mut self.project, next));
        }
        outcome
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.project.clone()) {
            Some(previous) => {
                debug!("undo");
                self.project = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.project.clone()) {
            Some(next) => {
                debug!("redo");
                self.project = next;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.past_len()
    }

    fn source_duration_of(&self, clip_id: Uuid) -> Option<f64> {
        let clip = self.active_sequence()?.clip(clip_id)?;
        self.project.media_assets.get(&clip.asset_id).map(|a| a.duration)
    }
}

fn flag(changed: bool) -> EditOutcome {
    if changed {
        EditOutcome::changed()
    } else {
        EditOutcome::noop()
    }
}

fn created(id: Option<Uuid>) -> EditOutcome {
    match id {
        Some(id) => EditOutcome {
            created_id: Some(id),
            ..EditOutcome::changed()
        },
        None => EditOutcome::noop(),
    }
}

fn active_sequence(project: &Project) -> Option<&Sequence> {
    match project.settings.active_sequence_id {
        Some(id) => project.sequences.iter().find(|s| s.id == id),
        None => project.sequences.first(),
    }
}

fn active_sequence_mut(project: &mut Project) -> Option<&mut Sequence> {
    match project.settings.active_sequence_id {
        Some(id) => project.sequences.iter_mut().find(|s| s.id == id),
        None => project.sequences.first_mut(),
    }
}

/// Placements on a block-mode (no-overlap) track are collision-checked up
/// front; a blocked proposal is diverted to the nearest valid position, which
/// the outcome reports back to the caller.
fn resolve_block_mode_start(
    sequence: &Sequence,
    exclude_clip_id: Option<Uuid>,
    target_track_id: Uuid,
    proposed_start: f64,
    duration: f64,
) -> f64 {
    let start = proposed_start.max(0.0);
    let blocks = sequence
        .track(target_track_id)
        .is_some_and(|t| !t.allow_overlap);
    if !blocks {
        return start;
    }
    let index = IntervalIndex::from_sequence(sequence);
    if index
        .detect_collisions(target_track_id, start, duration, exclude_clip_id)
        .has_collision
    {
        let suggested =
            index.find_nearest_valid_position(target_track_id, start, duration, exclude_clip_id);
        warn!(proposed = start, applied = suggested, "blocked placement diverted");
        suggested
    } else {
        start
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
