use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Snapshot file formats, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }

    /// Piped input has no extension: JSON documents open with `{` or `[`.
    fn sniff(contents: &str) -> Self {
        match contents.trim_start().chars().next() {
            Some('{') | Some('[') => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn parse<T: DeserializeOwned>(
        self,
        contents: &str,
        origin: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let parsed = match self {
            Format::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        };
        Ok(parsed.map_err(|e| format!("Failed to parse {}: {}", origin, e))?)
    }
}

/// Read a JSON or YAML file and deserialise into a typed struct.
///
/// `.yaml` and `.yml` files are parsed as YAML, everything else as JSON.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let format = Format::from_path(&canonical);
    log::debug!("reading {:?} input from {}", format, canonical.display());
    format.parse(&contents, &format!("'{}'", canonical.display()))
}

/// Read a snapshot piped on stdin, JSON or YAML.
///
/// Returns `None` when stdin is a terminal or carries nothing.
pub fn read_piped<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }

    let format = Format::sniff(&buffer);
    log::debug!("reading {:?} input from stdin ({} bytes)", format, buffer.len());
    format.parse(&buffer, "stdin").map(Some)
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
