use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::stats::ContributionRecord;

/// Replace `path` with the JSON array of `records`.
///
/// Data goes to a sibling temporary file first, so the target is either fully
/// rewritten or left as it was.
pub fn write_records(path: &Path, records: &[ContributionRecord]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", std::process::id()));

    let written = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(written?)
}
