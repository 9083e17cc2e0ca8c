use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub const DUP_SUFFIX: &str = "__dup";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedHeader {
    pub index: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupOutcome {
    pub headers: Vec<String>,
    pub renamed: Vec<RenamedHeader>,
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_string()
}

/// Make every header unique by suffixing repeats with `__dup1`, `__dup2`, …
///
/// The first occurrence keeps its name. Suffixes skip names already present
/// anywhere in the input, so the result is unique even when the sheet
/// already contains a `__dupN` header. Order and width are preserved.
pub fn dedup_headers(raw: &[String]) -> DedupOutcome {
    let trimmed: Vec<String> = raw.iter().map(|h| normalize_header(h)).collect();
    let mut occupied: HashSet<String> = trimmed.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = DedupOutcome { headers: Vec::with_capacity(trimmed.len()), renamed: Vec::new() };

    for (index, header) in trimmed.into_iter().enumerate() {
        if seen.insert(header.clone()) {
            out.headers.push(header);
            continue;
        }
        let n = counters.entry(header.clone()).or_insert(0);
        let candidate = loop {
            *n += 1;
            let candidate = format!("{header}{DUP_SUFFIX}{n}");
            if !occupied.contains(&candidate) {
                break candidate;
            }
        };
        occupied.insert(candidate.clone());
        seen.insert(candidate.clone());
        out.renamed.push(RenamedHeader { index, from: header, to: candidate.clone() });
        out.headers.push(candidate);
    }
    out
}

/// Strip a trailing `__dupN` or `.N` copy marker.
pub fn base_name(name: &str) -> &str {
    strip_copy_marker(name).unwrap_or(name)
}

fn strip_copy_marker(name: &str) -> Option<&str> {
    if let Some(pos) = name.rfind(DUP_SUFFIX) {
        let digits = &name[pos + DUP_SUFFIX.len()..];
        if pos > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Some(&name[..pos]);
        }
    }
    if let Some(pos) = name.rfind('.') {
        let digits = &name[pos + 1..];
        if pos > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Some(&name[..pos]);
        }
    }
    None
}

/// `column` is `alias` itself or one of its copies (`alias__dupN`, `alias.N`).
pub fn matches_alias(alias: &str, column: &str) -> bool {
    column == alias || strip_copy_marker(column) == Some(alias)
}
