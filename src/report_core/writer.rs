//! Report writer - ASCII-only pretty JSON, replaced atomically
//!
//! The report is serialized in memory, written to a temp file next to the
//! destination, synced and renamed over it. A reader of the destination sees
//! either the previous report or the new one, never a partial file.

use super::report::Report;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub enum WriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<std::io::Error> for WriterError {
    fn from(err: std::io::Error) -> Self {
        WriterError::Io(err)
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        WriterError::Serialization(err)
    }
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterError::Io(e) => write!(f, "IO error: {}", e),
            WriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for WriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Io(e) => Some(e),
            WriterError::Serialization(e) => Some(e),
        }
    }
}

/// Replace every non-ASCII char with `\uXXXX` (UTF-16 units, so astral
/// chars become a surrogate pair).
///
/// Only valid on serde_json output: there non-ASCII can appear inside string
/// literals alone, where the escape is equivalent.
pub fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units).iter() {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Two-space pretty JSON with non-ASCII escaped
pub fn to_ascii_pretty<T: Serialize>(value: &T) -> Result<String, WriterError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"  "));
    value.serialize(&mut ser)?;

    let pretty = String::from_utf8(buf)
        .map_err(|e| WriterError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok(escape_non_ascii(&pretty))
}

pub struct ReportWriter {
    output_path: PathBuf,
}

impl ReportWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Serialize and atomically replace the output file. Returns bytes written.
    pub fn write(&self, report: &Report) -> Result<usize, WriterError> {
        let mut body = to_ascii_pretty(report)?;
        body.push('\n');

        let dir = match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;

        // Temp files are created owner-only; the report is served to others
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))?;
        }

        tmp.persist(&self.output_path).map_err(|e| WriterError::Io(e.error))?;

        log::info!(
            "📝 Wrote report to {} ({} bytes)",
            self.output_path.display(),
            body.len()
        );
        Ok(body.len())
    }
}
