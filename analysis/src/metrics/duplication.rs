//! Duplicate-block detection over sliding line windows.
//!
//! Every window of `window` consecutive lines is trimmed, joined with `\n`
//! and hashed with BLAKE3. The same hash function serves the intra-file and
//! cross-file passes, so an identical window hashes identically in both.
//! Collisions would only surface as false positives.
//!
//! Windows made entirely of blank lines are ignored. Overlapping windows that
//! repeat in lockstep (every occurrence shifted by one line) are merged into a
//! single block.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One occurrence of a duplicated block (1-based, inclusive lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateLocation {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatedBlock {
    /// Hash of the first window in the block
    pub hash: String,
    pub lines: usize,
    pub locations: Vec<DuplicateLocation>,
}

impl DuplicatedBlock {
    pub fn distinct_files(&self) -> usize {
        self.locations
            .iter()
            .map(|l| &l.file)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Hash of a window of lines, as used by both detection passes.
pub fn window_hash<S: AsRef<str>>(lines: &[S]) -> String {
    let joined = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .collect::<Vec<_>>()
        .join("\n");
    blake3::hash(joined.as_bytes()).to_hex().to_string()
}

/// Blocks repeated at least twice inside one file.
pub fn find_intra_file_duplicates(
    path: &Path,
    source: &str,
    window: usize,
) -> Vec<DuplicatedBlock> {
    let files = [(path.to_path_buf(), source)];
    detect(&files, window, |occurrences| occurrences.len() >= 2)
}

/// Blocks whose occurrences span at least two distinct files.
///
/// A path listed more than once is scanned only at its first position.
pub fn find_cross_file_duplicates<S: AsRef<str>>(
    files: &[(PathBuf, S)],
    window: usize,
) -> Vec<DuplicatedBlock> {
    let mut seen = BTreeSet::new();
    let unique: Vec<(PathBuf, &str)> = files
        .iter()
        .filter(|(path, _)| seen.insert(path.as_path()))
        .map(|(path, source)| (path.clone(), source.as_ref()))
        .collect();

    detect(&unique, window, |occurrences| {
        occurrences
            .iter()
            .map(|(file, _)| *file)
            .collect::<BTreeSet<_>>()
            .len()
            >= 2
    })
}

/// (file index, 0-based start line)
type Occurrence = (usize, usize);

fn detect<S: AsRef<str>>(
    files: &[(PathBuf, S)],
    window: usize,
    keep: impl Fn(&[Occurrence]) -> bool,
) -> Vec<DuplicatedBlock> {
    if window == 0 {
        return Vec::new();
    }

    let mut by_hash: HashMap<String, Vec<Occurrence>> = HashMap::new();
    for (file_idx, (_, source)) in files.iter().enumerate() {
        let lines: Vec<&str> = source.as_ref().lines().collect();
        if lines.len() < window {
            continue;
        }
        for start in 0..=lines.len() - window {
            let slice = &lines[start..start + window];
            if slice.iter().all(|l| l.trim().is_empty()) {
                continue;
            }
            by_hash
                .entry(window_hash(slice))
                .or_default()
                .push((file_idx, start));
        }
    }

    let mut groups: Vec<(String, Vec<Occurrence>)> = by_hash
        .into_iter()
        .filter(|(_, occurrences)| keep(occurrences))
        .map(|(hash, mut occurrences)| {
            occurrences.sort_unstable();
            (hash, occurrences)
        })
        .collect();
    groups.sort_by(|a, b| a.1.cmp(&b.1));

    merge_lockstep(groups)
        .into_iter()
        .map(|run| DuplicatedBlock {
            hash: run.hash,
            lines: window + run.extension,
            locations: run
                .starts
                .iter()
                .map(|&(file_idx, start)| DuplicateLocation {
                    file: files[file_idx].0.clone(),
                    start_line: start + 1,
                    end_line: start + window + run.extension,
                })
                .collect(),
        })
        .collect()
}

struct Run {
    hash: String,
    starts: Vec<Occurrence>,
    /// Number of windows merged after the first
    extension: usize,
}

fn merge_lockstep(groups: Vec<(String, Vec<Occurrence>)>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    // Occurrence set expected for the next window of an open run → run index
    let mut expected: HashMap<Vec<Occurrence>, usize> = HashMap::new();

    for (hash, occurrences) in groups {
        let next: Vec<Occurrence> = occurrences.iter().map(|&(f, s)| (f, s + 1)).collect();
        match expected.remove(&occurrences) {
            Some(run_idx) => {
                runs[run_idx].extension += 1;
                expected.insert(next, run_idx);
            }
            None => {
                expected.insert(next, runs.len());
                runs.push(Run {
                    hash,
                    starts: occurrences,
                    extension: 0,
                });
            }
        }
    }

    runs
}
