//! JSONL passage loading.
//!
//! Each non-blank line of the file must be a single passage object:
//! ```jsonl
//! {"chunk_id": "r_0001", "text": "...", "section_type": "combat", "source_doc": "rule_book", "genre": "core_rules", "section_hierarchy": ["Combat", "Actions"]}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::{LorekeeperError, Result};
use crate::passage::source::SourceFilter;
use crate::passage::store::Passage;

/// Read passages from a JSONL file, keeping those accepted by `filter`.
pub fn load_passages<P: AsRef<Path>>(path: P, filter: &SourceFilter) -> Result<Vec<Passage>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let passages = read_passages(file, filter)?;

    debug!(
        path = %path.display(),
        passages = passages.len(),
        source = ?filter.source,
        "loaded passages"
    );
    Ok(passages)
}

/// Read passages from any JSONL reader, keeping those accepted by `filter`.
pub fn read_passages<R: Read>(reader: R, filter: &SourceFilter) -> Result<Vec<Passage>> {
    let reader = BufReader::new(reader);
    let mut passages = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let passage: Passage = serde_json::from_str(trimmed)
            .map_err(|e| LorekeeperError::parse(line_num + 1, e.to_string()))?;

        if filter.accepts(&passage) {
            passages.push(passage);
        }
    }

    Ok(passages)
}
