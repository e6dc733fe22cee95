//! Struct archiving functionality
//!
//! Archives are CSV files inside the session's archive directory, with one
//! row per serialised record.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write a record to the archive: {0}")]
    CsvError(csv::Error),

    #[error("The archiver has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        let session_path = session.arch_root.join(path);

        // Make sure the directory exists
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }

        // Create the file if it does not exist
        File::create(&session_path).map_err(ArchiveError::FileError)?;

        // Open the file in append mode
        let file = OpenOptions::new()
            .append(true)
            .open(session_path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::CsvError)?;
                w.flush().map_err(ArchiveError::FileError)?;
            }
            None => return Err(ArchiveError::NotInitialised),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        idx: usize,
        offset_m: f64,
    }

    #[test]
    fn test_archive_rows() {
        let dir = std::env::temp_dir().join("raceline_util_archive_test");
        let session = Session::new("arch", &dir).unwrap();

        let mut arch = Archiver::from_path(&session, "line/points.csv").unwrap();
        arch.serialise(Row {
            idx: 0,
            offset_m: -1.5,
        })
        .unwrap();
        arch.serialise(Row {
            idx: 1,
            offset_m: 0.25,
        })
        .unwrap();

        let written = std::fs::read_to_string(session.arch_root.join("line/points.csv")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["idx,offset_m", "0,-1.5", "1,0.25"]);

        let mut empty = Archiver::default();
        assert!(matches!(
            empty.serialise(Row {
                idx: 0,
                offset_m: 0.0
            }),
            Err(ArchiveError::NotInitialised)
        ));

        std::fs::remove_dir_all(&session.session_root).ok();
    }
}
