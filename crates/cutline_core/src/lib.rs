//! Timeline edit and collision/snap engine for a non-linear video/audio
//! editor: the authoritative tracks/clips model, structural edit operations,
//! per-track collision detection, magnetic/beat snapping, and a bounded
//! snapshot undo/redo history.

pub mod collision;
pub mod editing;
pub mod editor;
pub mod error;
pub mod history;
pub mod project;
pub mod snapping;
pub mod types;

pub use collision::{CollisionReport, IntervalIndex, TimeRange};
pub use editor::{EditCommand, EditOutcome, Editor};
pub use error::{CoreError, Result};
pub use history::History;
pub use types::{Clip, ClipKind, Project, Sequence, Track, TrackKind};
