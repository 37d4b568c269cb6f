//! Core type definitions for the DAXCUR example store.
//!
//! Wire and disk formats share these types, so field names are camelCase.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CurationError;

// ---------------------------------------------------------------------------
// Model type
// ---------------------------------------------------------------------------

/// A source BI tool whose formulas are being migrated to DAX.
///
/// Partition key for example collections and routing key for chat endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ModelType {
    /// IBM Cognos report expressions.
    Cognos,
    /// MicroStrategy metric expressions.
    Microstrategy,
    /// Tableau calculated fields.
    Tableau,
}

impl ModelType {
    /// All supported model types, in display order.
    pub const ALL: [ModelType; 3] = [Self::Cognos, Self::Microstrategy, Self::Tableau];

    /// Lowercase key used in file names, URLs and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cognos => "cognos",
            Self::Microstrategy => "microstrategy",
            Self::Tableau => "tableau",
        }
    }

    /// Prefix for the static ids of built-in samples.
    #[must_use]
    pub fn seed_prefix(self) -> &'static str {
        match self {
            Self::Cognos => "cognos",
            Self::Microstrategy => "mstr",
            Self::Tableau => "tableau",
        }
    }

    /// Human-readable product name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cognos => "IBM Cognos",
            Self::Microstrategy => "MicroStrategy",
            Self::Tableau => "Tableau",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = CurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| {
                CurationError::Validation(format!(
                    "Invalid model type: {s}. Must be one of: cognos, microstrategy, tableau"
                ))
            })
    }
}

impl TryFrom<String> for ModelType {
    type Error = CurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Example
// ---------------------------------------------------------------------------

/// One curated source-expression → DAX-formula pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Unique within its model type's collection.
    pub id: String,
    /// Original BI-tool formula text.
    #[serde(default)]
    pub source_expression: String,
    /// The model's initial DAX conversion. Never rewritten.
    #[serde(default)]
    pub target_dax_formula: String,
    /// Approved correction; empty until one is applied.
    #[serde(default)]
    pub corrected_dax_formula: String,
    /// Value of `corrected_dax_formula` immediately before the last overwrite.
    #[serde(default)]
    pub previous_dax_formula: String,
    /// Confidence in [0, 1] from a structured correction service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    /// True only for records created through add-example.
    #[serde(default)]
    pub is_user_added: bool,
    /// When the record was added (informational; array order is authoritative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the correction was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Example {
    /// Build a static seed record with no correction applied.
    #[must_use]
    pub fn seed(
        id: impl Into<String>,
        source_expression: impl Into<String>,
        target_dax_formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_expression: source_expression.into(),
            target_dax_formula: target_dax_formula.into(),
            corrected_dax_formula: String::new(),
            previous_dax_formula: String::new(),
            confidence_score: None,
            is_user_added: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Replace the correction, keeping the old value one step back.
    ///
    /// `confidence` of `None` leaves the existing score untouched.
    pub fn apply_correction(&mut self, corrected: impl Into<String>, confidence: Option<f64>) {
        self.previous_dax_formula =
            std::mem::replace(&mut self.corrected_dax_formula, corrected.into());
        if let Some(score) = confidence.and_then(clamp_confidence) {
            self.confidence_score = Some(score);
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Clamp a confidence value into [0, 1]. NaN is discarded.
#[must_use]
pub fn clamp_confidence(score: f64) -> Option<f64> {
    if score.is_nan() {
        None
    } else {
        Some(score.clamp(0.0, 1.0))
    }
}

/// Caller-supplied fields for a new example.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExample {
    /// Original BI-tool formula text.
    #[serde(default)]
    pub source_expression: String,
    /// The model's initial DAX conversion.
    #[serde(default)]
    pub target_dax_formula: String,
}

impl NewExample {
    /// Create a new example payload.
    #[must_use]
    pub fn new(source_expression: impl Into<String>, target_dax_formula: impl Into<String>) -> Self {
        Self {
            source_expression: source_expression.into(),
            target_dax_formula: target_dax_formula.into(),
        }
    }
}

/// Result of listing a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleListing {
    /// Stored examples, or the built-in samples when nothing is stored.
    pub examples: Vec<Example>,
    /// True when `examples` is placeholder content.
    pub is_dummy_data: bool,
}

// ---------------------------------------------------------------------------
// Backups & health
// ---------------------------------------------------------------------------

/// A single snapshot of a collection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupHandle {
    /// File name inside the backup directory.
    pub file_name: String,
    /// Collection the snapshot belongs to.
    pub model_type: ModelType,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Snapshot size in bytes.
    pub size_bytes: u64,
    /// Collision counter appended when two snapshots share a timestamp.
    #[serde(skip)]
    pub sequence: u32,
    /// Full path on disk (empty for in-memory stores).
    #[serde(skip)]
    pub path: PathBuf,
}

/// Storage health probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    /// Storage location exists and is usable.
    pub ok: bool,
    /// A probe file could be created in the data directory.
    pub writable: bool,
    /// Collection directory.
    pub data_dir: PathBuf,
    /// Backup directory.
    pub backup_dir: PathBuf,
}
