//! Delimited source helpers: encoding detection, separator sniffing and
//! header reading.
//!
//! All functions take a `Read + Seek` source and rewind it before reading,
//! so the same open file can be sniffed, inspected and then loaded.

use csv::{ByteRecord, ReaderBuilder, Trim};
use std::io::{BufRead, BufReader, Cursor, Read, Seek};

use crate::coerce::valid_utf8;
use crate::error::{CsvError, CsvResult};

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to UTF-8 using an encoding label.
///
/// Labels follow the WHATWG names, so `iso-8859-1` and `latin1` decode as
/// windows-1252.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let codec = encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| CsvError::Encoding(encoding.to_string()))?;
    Ok(codec.decode(bytes).0.into_owned())
}

/// Decode with a detected label, falling back to lossy UTF-8 when the
/// label is unknown. Returns the text and the encoding used.
fn decode_detected(bytes: &[u8], detected: String) -> (String, String) {
    match decode_content(bytes, &detected) {
        Ok(content) => (content, detected),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), "utf-8".to_string()),
    }
}

/// Read the whole source and return it as UTF-8.
///
/// `encoding` is either `"auto"` or an encoding label. Returns the bytes
/// and the encoding that was used.
pub fn transcode<S: Read + Seek>(source: &mut S, encoding: &str) -> CsvResult<(Cursor<Vec<u8>>, String)> {
    source.rewind()?;
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;

    let (content, used) = if encoding.eq_ignore_ascii_case("auto") {
        decode_detected(&bytes, detect_encoding(&bytes))
    } else {
        (decode_content(&bytes, encoding)?, encoding.to_string())
    };
    Ok((Cursor::new(content.into_bytes()), used))
}

/// A csv reader over an already positioned source.
pub fn csv_reader<R: Read>(reader: R, delimiter: u8, flexible: bool, trim: bool) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(flexible)
        .trim(if trim { Trim::All } else { Trim::None })
        .from_reader(reader)
}

/// Guess the separator of a delimited source.
///
/// Candidates are tried in order. A candidate must appear in the first
/// line, and the first `sniff_lines` records must parse with a consistent
/// number of fields.
pub fn guess_separator<S: Read + Seek>(source: &mut S, candidates: &[u8], sniff_lines: usize) -> CsvResult<u8> {
    source.rewind()?;
    let mut first_line = Vec::new();
    BufReader::new(&mut *source).read_until(b'\n', &mut first_line)?;
    if first_line.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    for &sep in candidates {
        if !first_line.contains(&sep) {
            continue;
        }

        source.rewind()?;
        let mut reader = csv_reader(&mut *source, sep, false, false);
        let consistent = reader
            .byte_records()
            .take(sniff_lines)
            .all(|record| record.is_ok());
        if consistent {
            return Ok(sep);
        }
    }

    Err(CsvError::NoSeparator {
        candidates: candidates.iter().map(|&c| display_delimiter(c)).collect::<Vec<_>>().join(" "),
    })
}

/// Read the header row.
pub fn read_headers<S: Read + Seek>(source: &mut S, delimiter: u8) -> CsvResult<Vec<String>> {
    source.rewind()?;
    let mut reader = csv_reader(&mut *source, delimiter, true, false);
    let mut record = ByteRecord::new();
    if !reader.read_byte_record(&mut record)? {
        return Err(CsvError::NoHeaders);
    }
    Ok(record.iter().map(valid_utf8).collect())
}

/// Printable form of a delimiter.
pub fn display_delimiter(d: u8) -> String {
    match d {
        b'\t' => "TAB".to_string(),
        b' ' => "SPACE".to_string(),
        c => char::from(c).to_string(),
    }
}
