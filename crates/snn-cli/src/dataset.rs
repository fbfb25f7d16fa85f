//! Dataset manifest parsing: one `<seq_path> <target_id>` pair per line.
//!
//! This is CLI-only plumbing (spec.md §1 excludes "dataset manifest parsing"
//! from the core), built here because `snn train` needs some way to name a
//! batch of episodes on disk.

use std::path::Path;

use snn_core::persistence::seq_format;
use snn_core::{InputSequence, NeuronId};

use crate::error::{CliError, CliResult};

/// Load a manifest file into `(sequence, target_id)` episodes. Blank lines
/// and `#`-comments are skipped; a malformed line is a hard error, since an
/// unreadable dataset is a batch/epoch-level failure (spec.md §7).
pub fn load_manifest(path: impl AsRef<Path>) -> CliResult<Vec<(InputSequence, NeuronId)>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut episodes = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line_no = lineno + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (Some(seq_path), Some(target), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(CliError::manifest(line_no, format!("expected '<seq_path> <target_id>', got: {line}")));
        };
        let seq_text = std::fs::read_to_string(base.join(seq_path))
            .map_err(|_| CliError::manifest(line_no, format!("cannot open sequence file: {seq_path}")))?;
        let sequence = seq_format::parse(&seq_text);
        episodes.push((sequence, NeuronId::new(target)));
    }
    Ok(episodes)
}
