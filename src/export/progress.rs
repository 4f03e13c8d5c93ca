//! Export progress reporting
//!
//! One-way notifications: the pipeline reports discrete steps, consumers
//! must not block it. No backpressure, no acknowledgment.

/// Progress callback type for export operations
pub type ExportProgressCallback<'a> = &'a (dyn Fn(&ExportProgress) + Sync + Send);

/// Phase of an export operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Compressing referenced textures
    CompressingTextures,
    /// Serializing the scene document
    SerializingDocument,
    /// Export complete
    Complete,
}

impl ExportPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompressingTextures => "Compressing textures",
            Self::SerializingDocument => "Serializing document",
            Self::Complete => "Complete",
        }
    }
}

/// Progress information emitted during an export
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current operation phase
    pub phase: ExportPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current file or item being processed (if applicable)
    pub detail: Option<String>,
}

impl ExportProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: ExportPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            detail: None,
        }
    }

    /// Create a progress update with an item name
    #[must_use]
    pub fn with_detail(
        phase: ExportPhase,
        current: usize,
        total: usize,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            detail: Some(detail.into()),
        }
    }

    /// Step description for display
    #[must_use]
    pub fn step(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {detail}", self.phase.as_str()),
            None => self.phase.as_str().to_string(),
        }
    }

    /// Integer progress percentage (0-100)
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            ((self.current * 100) / self.total).min(100) as u8
        }
    }
}
