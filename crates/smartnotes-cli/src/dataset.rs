//! Annotated dataset loading
//!
//! Layout:
//!   <dir>/notes/<id>.txt
//!   <dir>/annotations/<name>.json  {"id", "ground_truth": {"definitions": [...], "concepts": [...]}}

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use smartnotes_core::Document;
use smartnotes_extractor::GoldTerm;

#[derive(Debug, Deserialize)]
struct Annotation {
    id: String,
    #[serde(default)]
    ground_truth: GroundTruth,
}

#[derive(Debug, Default, Deserialize)]
struct GroundTruth {
    #[serde(default)]
    definitions: Vec<GoldTerm>,
    #[serde(default)]
    concepts: Vec<String>,
}

/// A note paired with its gold terms and concepts
#[derive(Debug, Clone)]
pub struct Sample {
    pub document: Document,
    pub gold: Vec<GoldTerm>,
    pub concepts: Vec<String>,
}

impl Sample {
    /// Domain prefix of the note id ("bio" for "bio_001")
    pub fn domain(&self) -> &str {
        let id = self.document.id.as_str();
        id.split_once('_').map_or(id, |(prefix, _)| prefix)
    }
}

/// Load every annotated note under `dir`, ordered by note id.
///
/// Annotations whose note file is missing are skipped with a warning.
pub async fn load_dataset(dir: &Path) -> Result<Vec<Sample>> {
    let annotations_dir = dir.join("annotations");
    let notes_dir = dir.join("notes");

    let mut entries = tokio::fs::read_dir(&annotations_dir)
        .await
        .with_context(|| format!("Failed to read {}", annotations_dir.display()))?;

    let mut samples = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let annotation: Annotation = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid annotation file {}", path.display()))?;

        let note_path = notes_dir.join(format!("{}.txt", annotation.id));
        let text = match tokio::fs::read_to_string(&note_path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %note_path.display(), error = %e, "note missing, skipping");
                continue;
            }
        };

        samples.push(Sample {
            document: Document::new(annotation.id, text),
            gold: annotation.ground_truth.definitions,
            concepts: annotation.ground_truth.concepts,
        });
    }

    samples.sort_by(|a, b| a.document.id.cmp(&b.document.id));
    tracing::info!(notes = samples.len(), dir = %dir.display(), "dataset loaded");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_load_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        write(dir, "notes/bio_002.txt", "Osmosis is the movement of water.");
        write(dir, "notes/bio_001.txt", "Photosynthesis is how plants make food.");
        write(
            dir,
            "annotations/bio_002.json",
            r#"{"id": "bio_002", "ground_truth": {"definitions": [{"term": "Osmosis", "definition": "movement of water"}], "concepts": ["Osmosis", "water"]}}"#,
        );
        write(
            dir,
            "annotations/bio_001.json",
            r#"{"id": "bio_001", "ground_truth": {"definitions": [{"term": "Photosynthesis"}]}}"#,
        );
        write(dir, "annotations/README.md", "not an annotation");

        let samples = load_dataset(dir).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].document.id, "bio_001");
        assert_eq!(samples[0].gold[0].term, "Photosynthesis");
        assert_eq!(samples[0].gold[0].definition, "");
        assert_eq!(samples[1].gold[0].definition, "movement of water");
        assert!(samples[0].concepts.is_empty());
        assert_eq!(samples[1].concepts, vec!["Osmosis", "water"]);
    }

    #[tokio::test]
    async fn test_missing_note_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        write(dir, "notes/hist_001.txt", "The Bastille was a fortress.");
        write(dir, "annotations/hist_001.json", r#"{"id": "hist_001"}"#);
        write(dir, "annotations/hist_002.json", r#"{"id": "hist_002"}"#);

        let samples = load_dataset(dir).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].gold.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_annotation_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "annotations/bad.json", "{ not json");

        let err = load_dataset(tmp.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid annotation file"));
    }

    #[tokio::test]
    async fn test_missing_dataset_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_dataset(&tmp.path().join("absent")).await.is_err());
    }

    #[test]
    fn test_domain_prefix() {
        let sample = Sample {
            document: Document::new("hist_004", ""),
            gold: Vec::new(),
            concepts: Vec::new(),
        };
        assert_eq!(sample.domain(), "hist");

        let plain = Sample {
            document: Document::new("misc", ""),
            gold: Vec::new(),
            concepts: Vec::new(),
        };
        assert_eq!(plain.domain(), "misc");
    }
}
