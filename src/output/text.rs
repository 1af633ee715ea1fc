//! Plain text report.
//!
//! ```text
//! duplicates of size 100
//! /data/a
//! /data/b
//! ```
//!
//! Groups are separated by their headers only; there is no trailing summary
//! on stdout.

use std::io::{self, Write};

use crate::duplicates::DuplicateGroup;

/// Text report writer.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> TextOutput<'a> {
    /// Create a text report over `groups`, printed in the given order.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups {
            writeln!(writer, "duplicates of size {}", group.size)?;
            for file in &group.files {
                writeln!(writer, "{}", file.path.display())?;
            }
        }
        writer.flush()
    }

    /// Render the report into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not valid UTF-8 (non-UTF-8 paths are
    /// displayed lossily, so this does not happen in practice).
    pub fn render(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
