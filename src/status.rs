//! Run-status channel.
//!
//! A single file the orchestrating layer polls: `WAITING` is written when a
//! run starts, `DONE` when it ends (normally or by abort). The handle is
//! passed explicitly, never ambient state.

use std::io;
use std::path::PathBuf;

pub const STATUS_FILE: &str = "status.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Waiting,
    Done,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Waiting => "WAITING",
            RunStatus::Done => "DONE",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "WAITING" => Some(RunStatus::Waiting),
            "DONE" => Some(RunStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, status: RunStatus) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{}\n", status.as_str()))
    }

    pub fn read(&self) -> io::Result<Option<RunStatus>> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(RunStatus::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_then_overwrites_status() {
        let dir = tempfile::tempdir().unwrap();
        let status = StatusFile::new(dir.path().join(STATUS_FILE));
        status.write(RunStatus::Waiting).unwrap();
        assert_eq!(status.read().unwrap(), Some(RunStatus::Waiting));
        status.write(RunStatus::Done).unwrap();
        assert_eq!(status.read().unwrap(), Some(RunStatus::Done));
    }

    #[test]
    fn garbage_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATUS_FILE);
        std::fs::write(&path, "???\n").unwrap();
        assert_eq!(StatusFile::new(path).read().unwrap(), None);
    }
}
