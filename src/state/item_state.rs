/// Outcome types for the per-item pipeline
use std::fmt;
use std::path::PathBuf;

/// Pipeline step at which an item stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStage {
    /// Fetching the detail page
    Detail,
    /// Extracting gid/uc/img from the detail page scripts
    Metadata,
    /// Calling the magnet resolver endpoint
    Resolve,
}

impl ItemStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detail => "detail",
            Self::Metadata => "metadata",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the cover download step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverStatus {
    /// Cover written to the given path
    Saved(PathBuf),
    /// Download failed; the magnet record is kept
    Failed(String),
}

/// Terminal outcome of one item pipeline
///
/// Persistence failures are not represented here; they abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Magnet record written, cover attempted
    Saved {
        item_id: String,
        hd: bool,
        cover: CoverStatus,
    },

    /// The resolver had no magnet for this item
    NoMagnet { item_id: String },

    /// The pipeline stopped early
    Failed {
        item_id: String,
        stage: ItemStage,
        reason: String,
    },
}

impl ItemOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            Self::Saved { item_id, .. }
            | Self::NoMagnet { item_id }
            | Self::Failed { item_id, .. } => item_id,
        }
    }

    /// Number of failures this outcome adds to the run total
    pub fn failure_count(&self) -> u64 {
        match self {
            Self::Saved {
                cover: CoverStatus::Failed(_),
                ..
            } => 1,
            Self::Saved { .. } | Self::NoMagnet { .. } => 0,
            Self::Failed { .. } => 1,
        }
    }
}
