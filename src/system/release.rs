//! Host system release identification.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Reports the host's distribution identifier (e.g. `debian`, `alpine`).
pub trait ReleaseReader: Send + Sync {
    fn system_id(&self) -> io::Result<String>;
}

/// Reads the `ID` key from os-release(5).
#[derive(Debug, Clone)]
pub struct OsRelease {
    candidates: Vec<PathBuf>,
}

impl OsRelease {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl Default for OsRelease {
    fn default() -> Self {
        Self::new(vec![
            PathBuf::from("/etc/os-release"),
            PathBuf::from("/usr/lib/os-release"),
        ])
    }
}

impl ReleaseReader for OsRelease {
    fn system_id(&self) -> io::Result<String> {
        let mut last_err = None;
        for path in &self.candidates {
            match fs::read_to_string(path) {
                Ok(content) => {
                    return parse_id(&content).ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("no ID entry in {}", path.display()),
                        )
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no os-release file")))
    }
}

/// Extract the `ID` value, stripping optional quotes.
pub fn parse_id(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("ID=")?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_variants() {
        assert_eq!(parse_id("NAME=\"Alpine Linux\"\nID=alpine\nVERSION_ID=3.19\n").as_deref(), Some("alpine"));
        assert_eq!(parse_id("ID=\"ubuntu\"\nID_LIKE=debian\n").as_deref(), Some("ubuntu"));
        assert_eq!(parse_id("ID_LIKE=debian\n").as_deref(), None);
        assert_eq!(parse_id("ID=\n").as_deref(), None);
    }

    #[test]
    fn test_falls_back_to_second_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("os-release");
        fs::write(&second, "ID=debian\n").unwrap();

        let reader = OsRelease::new(vec![dir.path().join("missing"), second]);
        assert_eq!(reader.system_id().unwrap(), "debian");
    }

    #[test]
    fn test_no_candidates_readable() {
        let dir = tempfile::tempdir().unwrap();
        let reader = OsRelease::new(vec![dir.path().join("missing")]);
        assert_eq!(reader.system_id().unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
