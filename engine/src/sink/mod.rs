//! Persistence seam: where loaded records go.
//!
//! The loader only builds records; a [`RecordSink`] decides how to store
//! them. [`JsonSink`] writes them as a pretty-printed JSON array.

use serde::Serialize;
use std::io::Write;

/// Destination for a batch of records.
pub trait RecordSink<R> {
    type Error: std::error::Error;

    /// Store `records`, returning how many were written.
    fn persist(&mut self, records: &[R]) -> Result<usize, Self::Error>;
}

/// Writes records as a JSON array to any writer.
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<R: Serialize, W: Write> RecordSink<R> for JsonSink<W> {
    type Error = serde_json::Error;

    fn persist(&mut self, records: &[R]) -> Result<usize, Self::Error> {
        serde_json::to_writer_pretty(&mut self.writer, records)?;
        self.writer.write_all(b"\n").map_err(serde_json::Error::io)?;
        self.writer.flush().map_err(serde_json::Error::io)?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Apple {
        name: &'static str,
        year: u16,
    }

    #[test]
    fn test_json_sink() {
        let mut sink = JsonSink::new(Vec::new());
        let written = sink
            .persist(&[Apple { name: "Cox", year: 1998 }, Apple { name: "Gala", year: 1999 }])
            .unwrap();
        assert_eq!(written, 2);

        let out: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(out[1]["name"], "Gala");
        assert_eq!(out[0]["year"], 1998);
    }

    #[test]
    fn test_empty_batch() {
        let mut sink = JsonSink::new(Vec::new());
        let records: Vec<Apple> = Vec::new();
        assert_eq!(sink.persist(records.as_slice()).unwrap(), 0);
        assert_eq!(sink.into_inner(), b"[]\n");
    }
}
