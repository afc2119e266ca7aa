//! Temporary files for tests that read or write colormap `.lut` files.

use std::path::PathBuf;

/// Three-column float LUT: black, mid red, white.
pub const FLOAT_LUT: &str = "\
# simple float lut
0.0 0.0 0.0
0.5 0.0 0.0
1.0 1.0 1.0
";

/// Three-column integer LUT (values above 1 trigger /255 normalization).
pub const INT_LUT: &str = "\
; integer lut
0 0 0
255 128 0
255 255 255
";

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Writes `contents` to `<dir>/<file_name>` and returns the path.
pub fn write_test_file(dir: &tempfile::TempDir, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}
