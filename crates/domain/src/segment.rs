//! Segment (campaign) model.

use chrono::{DateTime, Utc};
use common::SegmentId;
use serde::{Deserialize, Serialize};

use crate::rules::SegmentRule;

/// Lifecycle status of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Draft,
    #[default]
    Active,
    Completed,
    Paused,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Draft => "draft",
            SegmentStatus::Active => "active",
            SegmentStatus::Completed => "completed",
            SegmentStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named audience definition plus its dispatch metadata.
///
/// `audience_size` is a point-in-time snapshot frozen by the delivery
/// orchestrator at dispatch time. It is not re-derived as customers
/// change unless the segment is dispatched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Unique segment ID.
    pub id: SegmentId,

    /// Segment name.
    pub name: String,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Ordered rule sequence; always non-empty for persisted segments.
    pub rules: Vec<SegmentRule>,

    /// Audience size captured at the most recent dispatch.
    pub audience_size: u64,

    /// Lifecycle status.
    pub status: SegmentStatus,

    /// When the segment was created.
    pub created_at: DateTime<Utc>,

    /// When the segment was last written.
    pub updated_at: DateTime<Utc>,
}

impl Segment {
    /// Creates a new active segment with an empty dispatch snapshot.
    pub fn new(name: impl Into<String>, rules: Vec<SegmentRule>) -> Self {
        let now = Utc::now();
        Self {
            id: SegmentId::new(),
            name: name.into(),
            description: None,
            rules,
            audience_size: 0,
            status: SegmentStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the record as written now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
