use crate::error::Result;
use crate::types::{AssetMeta, ProjectSettings, Sequence, SequenceFormat};
use std::path::Path;
use uuid::Uuid;

pub use crate::types::Project;

impl Project {
    /// New project with a single empty sequence in the given format, set as
    /// the active sequence.
    pub fn new(title: impl Into<String>, format: SequenceFormat) -> Self {
        let sequence = Sequence::new(format);
        let settings = ProjectSettings {
            active_sequence_id: Some(sequence.id),
            ..ProjectSettings::default()
        };
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            sequences: vec![sequence],
            media_assets: std::collections::HashMap::new(),
            settings,
        }
    }

    /// Register a media asset, returning its id.
    pub fn add_asset(&mut self, meta: AssetMeta) -> Uuid {
        let id = Uuid::new_v4();
        self.media_assets.insert(id, meta);
        id
    }

    /// Save as pretty-printed JSON, appending the `.cutline` extension when
    /// missing.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a project from a JSON file, rejecting documents whose sequences
    /// break the structural invariants.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let project: Project = serde_json::from_str(&data)?;
        for sequence in &project.sequences {
            sequence.validate()?;
        }
        Ok(project)
    }
}

/// 1920x1080 30fps preset.
pub fn preset_1080p() -> SequenceFormat {
    SequenceFormat {
        width: 1920,
        height: 1080,
        fps: 30.0,
        sample_rate: 48000,
    }
}

/// 1080x1920 30fps (vertical/shorts) preset.
pub fn preset_shorts() -> SequenceFormat {
    SequenceFormat {
        width: 1080,
        height: 1920,
        fps: 30.0,
        sample_rate: 48000,
    }
}

/// 3840x2160 30fps (4K) preset.
pub fn preset_4k() -> SequenceFormat {
    SequenceFormat {
        width: 3840,
        height: 2160,
        fps: 30.0,
        sample_rate: 48000,
    }
}

fn ensure_extension(path: &Path) -> std::path::PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some("cutline") {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".cutline");
        p.set_file_name(name);
        p
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
