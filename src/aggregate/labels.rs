//! Labels Aggregator
//!
//! Builds the symmetric label co-occurrence matrix behind the chords card.
//! Open issues contribute their label sets; labels are ranked by how many
//! issues carry them, the long tail merges into an "other labels" bucket,
//! and colours come from the separately-loaded label definitions.

use std::collections::HashMap;

use super::Legend;
use crate::github::{IssueRecord, LabelRecord};

/// Labels kept individually before the tail merges into the bucket
const MAX_RANKED_LABELS: usize = 30;

const OTHER_LABELS: &str = "other labels";
const DEFAULT_COLOR: &str = "#fff";

/// Chart-ready output of the labels card: a square matrix with one row per
/// ranked label, plus the parallel legend
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatrix {
    pub names: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    pub legend: Vec<Legend>,
}

impl LabelMatrix {
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn size(&self) -> usize {
        self.matrix.len()
    }
}

/// Accumulates label definitions and issues, derives [`LabelMatrix`]
#[derive(Debug, Default)]
pub struct LabelsAggregator {
    definitions: Vec<LabelRecord>,
    issues: Vec<IssueRecord>,
}

impl LabelsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest_definitions(&mut self, records: Vec<LabelRecord>) {
        self.definitions.extend(records);
    }

    pub fn ingest_issues(&mut self, records: Vec<IssueRecord>) {
        self.issues.extend(records);
    }

    pub fn reset(&mut self) {
        self.definitions.clear();
        self.issues.clear();
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn derive(&self) -> LabelMatrix {
        // Deduplicated label sets of the open issues, plus per-label issue
        // counts in first-appearance order
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut issue_labels: Vec<Vec<String>> = Vec::new();

        for issue in self.issues.iter().filter(|issue| !issue.closed) {
            let mut seen: Vec<String> = Vec::new();
            for label in &issue.labels {
                if !seen.iter().any(|s| s == label) {
                    seen.push(label.clone());
                }
            }
            for label in &seen {
                if !counts.contains_key(label) {
                    order.push(label.clone());
                }
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
            issue_labels.push(seen);
        }

        // Rank by issue count descending; the stable sort keeps
        // first-appearance order between equal counts
        let mut ranked = order;
        ranked.sort_by(|a, b| {
            let ca = counts.get(a).copied().unwrap_or(0);
            let cb = counts.get(b).copied().unwrap_or(0);
            cb.cmp(&ca)
        });

        let bucketed = ranked.len() > MAX_RANKED_LABELS;
        if bucketed {
            ranked.truncate(MAX_RANKED_LABELS);
            ranked.push(OTHER_LABELS.to_string());
        }

        let index: HashMap<&str, usize> = ranked
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let bucket_index = ranked.len().saturating_sub(1);

        // Remap each issue's labels into ranked indices; merged labels all
        // collapse onto the bucket, deduplicated per issue
        let issue_sets: Vec<Vec<usize>> = issue_labels
            .iter()
            .map(|labels| {
                let mut indices: Vec<usize> = Vec::new();
                for label in labels {
                    let idx = index.get(label.as_str()).copied().unwrap_or(bucket_index);
                    if !indices.contains(&idx) {
                        indices.push(idx);
                    }
                }
                indices
            })
            .collect();

        let n = ranked.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for li in 0..n {
            for indices in &issue_sets {
                if !indices.contains(&li) {
                    continue;
                }
                let mut alone = true;
                for &other in indices.iter().filter(|&&other| other != li) {
                    matrix[li][other] += 1.0;
                    alone = false;
                }
                if alone {
                    matrix[li][li] += 1.0;
                }
            }
        }

        let legend = ranked
            .iter()
            .map(|name| Legend::new(name.clone(), self.color_of(name)))
            .collect();

        LabelMatrix { names: ranked, matrix, legend }
    }

    fn color_of(&self, name: &str) -> String {
        if name == OTHER_LABELS {
            return DEFAULT_COLOR.to_string();
        }
        self.definitions
            .iter()
            .find(|def| def.name == name)
            .and_then(|def| def.color.as_deref())
            .map(css_color)
            .unwrap_or_else(|| DEFAULT_COLOR.to_string())
    }
}

/// Normalise a label colour to CSS form; the backend sends bare hex digits
fn css_color(raw: &str) -> String {
    let is_bare_hex = (raw.len() == 3 || raw.len() == 6)
        && raw.chars().all(|c| c.is_ascii_hexdigit());
    if is_bare_hex {
        format!("#{raw}")
    } else {
        raw.to_string()
    }
}
