//! Metadata sidecar: one record per index row, in row order

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{Result, TutorError};

/// Source location and text of one indexed chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub chunk_index: u32,
    pub chunk_text: String,
}

/// Load the JSON array sidecar
pub fn load_metadata(path: &Path) -> Result<Vec<ChunkMetadata>> {
    if !path.exists() {
        return Err(TutorError::MissingResource(path.display().to_string()));
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write the JSON array sidecar
pub fn save_metadata(path: &Path, records: &[ChunkMetadata]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sidecar() {
        let json = r#"[
            {"filename": "syllabus.pdf", "chunk_index": 0, "chunk_text": "Midterm is in week 7."},
            {"filename": "syllabus.pdf", "chunk_index": 1, "chunk_text": "Office hours Tuesday."}
        ]"#;
        let records: Vec<ChunkMetadata> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chunk_index, 1);
        assert_eq!(records[0].chunk_text, "Midterm is in week 7.");
    }

    #[test]
    fn test_rejects_negative_chunk_index() {
        let json = r#"[{"filename": "a.pdf", "chunk_index": -1, "chunk_text": "x"}]"#;
        assert!(serde_json::from_str::<Vec<ChunkMetadata>>(json).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faiss_metadata.json");
        let records = vec![ChunkMetadata {
            filename: "notes.docx".to_string(),
            chunk_index: 3,
            chunk_text: "Gradient descent updates weights.".to_string(),
        }];

        save_metadata(&path, &records).unwrap();
        assert_eq!(load_metadata(&path).unwrap(), records);
    }

    #[test]
    fn test_load_missing() {
        let result = load_metadata(Path::new("/nonexistent/faiss_metadata.json"));
        assert!(matches!(result, Err(TutorError::MissingResource(_))));
    }

    #[test]
    fn test_load_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faiss_metadata.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_metadata(&path),
            Err(TutorError::SerializationError(_))
        ));
    }
}
