// Report artifacts (JSON + optional Markdown)

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::IoError;

fn ensure_parent(path: &Path) -> Result<(), IoError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| IoError::Write { path: dir.to_path_buf(), source })
        }
        _ => Ok(()),
    }
}

/// Pretty-printed JSON with a trailing newline. Parent directories are created.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    ensure_parent(path)?;
    let write_err = |source| IoError::Write { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| IoError::Serialize { path: path.to_path_buf(), message: e.to_string() })?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)
}

pub fn write_text(path: &Path, text: &str) -> Result<(), IoError> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|source| IoError::Write { path: path.to_path_buf(), source })
}

/// Write `{stem}.json` and, when `markdown` is given, `{stem}.md` under `dir`.
/// Returns the written paths.
pub fn write_report<T: Serialize + ?Sized>(
    dir: &Path,
    stem: &str,
    value: &T,
    markdown: Option<&str>,
) -> Result<Vec<PathBuf>, IoError> {
    let json_path = dir.join(format!("{stem}.json"));
    write_json(&json_path, value)?;
    let mut written = vec![json_path];
    if let Some(md) = markdown {
        let md_path = dir.join(format!("{stem}.md"));
        write_text(&md_path, md)?;
        written.push(md_path);
    }
    for path in &written {
        log::info!("Wrote {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn report_pair_is_written_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("artifacts").join("nested");
        let value: BTreeMap<&str, usize> = [("rows", 3)].into_iter().collect();

        let written = write_report(&out, "ra_intersections", &value, Some("# Report\n")).unwrap();
        assert_eq!(written.len(), 2);

        let json = fs::read_to_string(out.join("ra_intersections.json")).unwrap();
        assert!(json.ends_with('\n'));
        let parsed: BTreeMap<String, usize> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["rows"], 3);
        assert_eq!(fs::read_to_string(out.join("ra_intersections.md")).unwrap(), "# Report\n");
    }

    #[test]
    fn markdown_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_report(dir.path(), "x", &[1, 2, 3], None).unwrap();
        assert_eq!(written, vec![dir.path().join("x.json")]);
    }
}
