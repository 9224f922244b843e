//! Utilities (reading local sources, file arguments, unicode helpers).

pub mod unicode;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};

/// Read a local script or data file as UTF-8 text.
pub fn read_source(file_path: &Path) -> Result<String> {
    if !file_path.exists() {
        bail!("File '{}' does not exist", file_path.display());
    }
    if !file_path.is_file() {
        bail!("'{}' is not a file", file_path.display());
    }
    fs::read_to_string(file_path)
        .map_err(|e| anyhow!("Failed to read file '{}': {}", file_path.display(), e))
}

/// Split a `NAME=PATH` argument. Without `=`, the name is the file stem.
pub fn parse_file_arg(arg: &str) -> Result<(String, PathBuf)> {
    if let Some((name, path)) = arg.split_once('=') {
        if name.trim().is_empty() || path.trim().is_empty() {
            bail!("Expected NAME=PATH, got '{}'", arg);
        }
        return Ok((name.trim().to_string(), PathBuf::from(path.trim())));
    }
    let path = PathBuf::from(arg);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Cannot derive a file name from '{}'", arg))?;
    Ok((name, path))
}

/// Load every `--file` argument as a (name, content) pair, in order.
pub fn load_files(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            let (name, path) = parse_file_arg(arg)?;
            Ok((name, read_source(&path)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn file_arg_with_explicit_name() {
        let (name, path) = parse_file_arg("iris=/tmp/iris.csv").unwrap();
        assert_eq!(name, "iris");
        assert_eq!(path, PathBuf::from("/tmp/iris.csv"));
    }

    #[test]
    fn file_arg_without_name_uses_stem() {
        let (name, _) = parse_file_arg("data/mtcars.csv").unwrap();
        assert_eq!(name, "mtcars");
        assert!(parse_file_arg("=x.csv").is_err());
        assert!(parse_file_arg("x=").is_err());
    }

    #[test]
    fn load_files_reads_contents() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "a,b\n1,2\n").unwrap();
        let arg = format!("tbl={}", tmp.path().display());
        let files = load_files(&[arg]).unwrap();
        assert_eq!(files, vec![("tbl".to_string(), "a,b\n1,2\n".to_string())]);
    }

    #[test]
    fn missing_source_is_an_error() {
        assert!(read_source(Path::new("does/not/exist.R")).is_err());
    }
}
