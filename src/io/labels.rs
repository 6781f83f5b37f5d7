// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label file reading and writing.
//!
//! A label file sits next to its image with the same base name and a
//! `.txt` extension. Each line describes one box:
//!
//! ```text
//! <class index> <center x> <center y> <width> <height>
//! ```
//!
//! with the four geometry values given as fractions of the image size.

use crate::error::EditorError;
use crate::models::annotation::LabelRecord;
use crate::util::geometry::NormalizedRect;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Label file path for an image: same directory, same base name, `.txt`.
pub fn label_path_for_image(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Parse label file contents. Lines with fewer than five fields or with
/// unparseable numbers are skipped.
pub fn parse_labels(text: &str) -> Vec<LabelRecord> {
    text.lines()
        .enumerate()
        .filter_map(|(line_no, line)| {
            let record = parse_line(line);
            if record.is_none() && !line.trim().is_empty() {
                log::debug!("Skipping malformed label line {}: {:?}", line_no + 1, line);
            }
            record
        })
        .collect()
}

fn parse_line(line: &str) -> Option<LabelRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    let class_id = fields[0].parse::<usize>().ok()?;
    let mut values = [0.0f64; 4];
    for (value, field) in values.iter_mut().zip(&fields[1..5]) {
        *value = field.parse::<f64>().ok().filter(|v| v.is_finite())?;
    }
    let [cx, cy, w, h] = values;
    Some(LabelRecord {
        class_id,
        rect: NormalizedRect { cx, cy, w, h },
    })
}

/// Serialize records, one newline-terminated line each.
pub fn format_labels(records: &[LabelRecord]) -> String {
    let mut out = String::new();
    for r in records {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} {:.6} {:.6} {:.6} {:.6}",
            r.class_id, r.rect.cx, r.rect.cy, r.rect.w, r.rect.h
        );
    }
    out
}

/// Read and parse a label file.
pub fn read_label_file(path: &Path) -> Result<Vec<LabelRecord>, EditorError> {
    let text = std::fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
    Ok(parse_labels(&text))
}

/// Overwrite a label file with `records`.
pub fn write_label_file(path: &Path, records: &[LabelRecord]) -> Result<(), EditorError> {
    std::fs::write(path, format_labels(records)).map_err(|e| EditorError::io(path, e))
}
