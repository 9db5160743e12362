//! Common test fixtures.

use std::io::Write;

use tempfile::NamedTempFile;

/// Unit database with a couple of units missing from the built-in vocabulary.
pub const EXTRA_UNITS_YAML: &str = r#"units:
  - name: furlong
    definition: "201.168 m"
    aliases: [fur]
  - name: fortnight
    definition: "14 day"
"#;

/// Unit database whose definition does not parse.
pub const BROKEN_UNITS_YAML: &str = r#"units:
  - name: broken
    definition: "m ) s"
"#;

/// Writes `contents` to a temporary file with the given extension.
///
/// The file is removed when the returned handle is dropped.
pub fn temp_file_with(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("gridcore_")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .expect("Failed to create temporary test file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temporary test file");
    file
}

/// Common grid sizes for testing.
pub mod grid {
    /// HRRR CONUS grid (3km resolution)
    pub const HRRR_CONUS: (usize, usize) = (1799, 1059);

    /// GFS global grid (0.25 degree resolution)
    pub const GFS_GLOBAL: (usize, usize) = (1440, 721);
}
