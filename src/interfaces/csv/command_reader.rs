use crate::domain::command::Command;
use crate::error::{EngineError, Result};
use std::io::Read;

/// Reads operator commands from a CSV source.
///
/// Wraps `csv::Reader` and yields an iterator over `Result<Command>`,
/// trimming whitespace and tolerating rows without the trailing notes field.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g. File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes commands, streaming large files without
    /// loading them fully into memory.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(EngineError::from))
    }
}
