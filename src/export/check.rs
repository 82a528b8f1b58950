//! Consistency checks over a written document.

use std::fmt;

use super::document::ModelDocument;
use crate::pipeline::OutputPoint;

/// A single problem found in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// A point outside the physically plausible ranges.
    ImplausiblePoint { depth: u32, index: usize, point: OutputPoint },
    /// `stats.count` disagrees with the number of points.
    CountMismatch { depth: u32, count: usize, points: usize },
    /// The map key and the `depth` field of an entry differ.
    DepthKeyMismatch { key: u32, depth: u32 },
    /// A depth listed in metadata has no entry, or vice versa.
    MetadataDepthMismatch { depth: u32 },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::ImplausiblePoint { depth, index, point } => write!(
                f,
                "depth {} point {}: implausible values (lat {}, lon {}, intensity {}, probability {}, chlorophyll {}, sst {})",
                depth, index, point.lat, point.lon, point.intensity, point.probability, point.chlorophyll, point.sst
            ),
            Issue::CountMismatch { depth, count, points } => {
                write!(f, "depth {}: stats.count is {} but {} points were written", depth, count, points)
            }
            Issue::DepthKeyMismatch { key, depth } => {
                write!(f, "entry \"{}\" carries depth {}", key, depth)
            }
            Issue::MetadataDepthMismatch { depth } => {
                write!(f, "depth {} is not listed consistently in metadata and depths", depth)
            }
        }
    }
}

/// Result of [`check_document`].
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub points_checked: usize,
    pub issues: Vec<Issue>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn implausible_points(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, Issue::ImplausiblePoint { .. }))
            .count()
    }
}

/// Checks every depth entry of `doc`.
pub fn check_document(doc: &ModelDocument) -> CheckReport {
    let mut report = CheckReport::default();

    for (&key, entry) in &doc.depths {
        if entry.depth != key {
            report.issues.push(Issue::DepthKeyMismatch { key, depth: entry.depth });
        }
        if entry.stats.count != entry.data.len() {
            report.issues.push(Issue::CountMismatch {
                depth: key,
                count: entry.stats.count,
                points: entry.data.len(),
            });
        }
        for (index, point) in entry.data.iter().enumerate() {
            if !point.is_plausible() {
                report.issues.push(Issue::ImplausiblePoint { depth: key, index, point: *point });
            }
        }
        report.points_checked += entry.data.len();
    }

    for &depth in &doc.metadata.depths {
        if !doc.depths.contains_key(&depth) {
            report.issues.push(Issue::MetadataDepthMismatch { depth });
        }
    }
    for &depth in doc.depths.keys() {
        if !doc.metadata.depths.contains(&depth) {
            report.issues.push(Issue::MetadataDepthMismatch { depth });
        }
    }

    report
}
