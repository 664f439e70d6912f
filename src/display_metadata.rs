use crate::dicom::DicomMetadata;
use std::fmt::Write;

pub fn print_metadata(metadata: &DicomMetadata) {
    print!("{}", format_metadata(metadata));
}

/// One `label: value` line per present field, a blank line after each section
#[must_use]
pub fn format_metadata(metadata: &DicomMetadata) -> String {
    let mut out = String::new();

    for (_, fields) in metadata.sections() {
        for (name, value) in fields {
            let _ = writeln!(out, "{name:20}: {value}");
        }
        out.push('\n');
    }

    out
}
