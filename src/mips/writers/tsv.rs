//! Defines the `TsvWriter` struct for writing tab-separated tables.

use crate::utils::Result;
use flate2::{write::GzEncoder, Compression};
use std::{
    fmt::Display,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Stdout(BufWriter<io::Stdout>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(writer) => writer.write(buf),
            Sink::Stdout(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(writer) => writer.flush(),
            Sink::Stdout(writer) => writer.flush(),
        }
    }
}

/// Structure for writing table rows, one per line, after a header line.
pub struct TsvWriter {
    sink: Sink,
    /// Used in error messages.
    name: String,
    rows: usize,
}

impl TsvWriter {
    /// Constructs a new `TsvWriter` instance.
    ///
    /// # Arguments
    /// * `path` - Path of the output file; gzip compressed if it ends in `.gz`.
    /// * `header` - Header line written before any row.
    ///
    /// # Returns
    /// Returns a `Result` with either a new `TsvWriter` instance or an error message.
    pub fn new(path: &Path, header: &str) -> Result<TsvWriter> {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        let buf = BufWriter::new(file);
        let sink = if path.extension().is_some_and(|ext| ext == "gz") {
            Sink::Gzip(GzEncoder::new(buf, Compression::default()))
        } else {
            Sink::Plain(buf)
        };
        Self::with_sink(sink, path.display().to_string(), header)
    }

    /// Constructs a `TsvWriter` that writes to standard output.
    pub fn stdout(header: &str) -> Result<TsvWriter> {
        let sink = Sink::Stdout(BufWriter::new(io::stdout()));
        Self::with_sink(sink, "standard output".to_string(), header)
    }

    fn with_sink(sink: Sink, name: String, header: &str) -> Result<TsvWriter> {
        let mut writer = TsvWriter {
            sink,
            name,
            rows: 0,
        };
        writeln!(writer.sink, "{}", header)
            .map_err(|e| format!("Failed to write to {}: {}", writer.name, e))?;
        Ok(writer)
    }

    pub fn write<T: Display>(&mut self, row: &T) -> Result<()> {
        writeln!(self.sink, "{}", row)
            .map_err(|e| format!("Failed to write to {}: {}", self.name, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes buffered rows and completes the gzip stream, returning the number of rows written.
    pub fn finish(self) -> Result<usize> {
        let name = self.name;
        let result = match self.sink {
            Sink::Plain(mut writer) => writer.flush(),
            Sink::Gzip(writer) => writer.finish().and_then(|mut buf| buf.flush()),
            Sink::Stdout(mut writer) => writer.flush(),
        };
        result.map_err(|e| format!("Failed to finish {}: {}", name, e))?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::open_text_reader;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_back(path: &Path) -> String {
        let mut contents = String::new();
        open_text_reader(path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[test]
    fn writes_plain_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.tsv");
        let mut writer = TsvWriter::new(&path, "A\tB").unwrap();
        writer.write(&"1\t2").unwrap();
        assert_eq!(writer.finish().unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A\tB\n1\t2\n");
    }

    #[test]
    fn writes_gzip_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.tsv.gz");
        let mut writer = TsvWriter::new(&path, "A\tB").unwrap();
        writer.write(&"1\t2").unwrap();
        writer.write(&"3\t4").unwrap();
        assert_eq!(writer.finish().unwrap(), 2);
        assert_eq!(read_back(&path), "A\tB\n1\t2\n3\t4\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tsv");
        assert!(TsvWriter::new(&path, "A").is_err());
    }
}
