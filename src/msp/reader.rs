//! Line-oriented reader for spectral-text entries

use std::io::BufRead;

use log::{debug, warn};

use super::comment::parse_comment;
use super::MspError;
use crate::spectrum::PeakList;

/// One entry as it appears in the file, before interpretation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    /// Value of the `Name:` line
    pub name: String,
    /// Value of the `MW:` line
    pub mw: Option<f64>,
    /// Parsed `Comment:` pairs, in file order
    pub comment: Vec<(String, String)>,
    /// Declared `Num peaks:`
    pub num_peaks: Option<usize>,
    /// Other header lines, in file order
    pub headers: Vec<(String, String)>,
    /// Peaks in file order
    pub peaks: PeakList,
    /// Line number of the `Name:` line
    pub line: usize,
}

impl RawEntry {
    /// First comment value for `key`
    pub fn comment_value(&self, key: &str) -> Option<&str> {
        self.comment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First header value for `key`, case-insensitive
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Between,
    Headers,
    Peaks,
    /// Skipping the rest of a malformed entry
    Recovering,
    Done,
}

/// Reader yielding one [`RawEntry`] per entry.
///
/// A malformed entry yields an `Err` and the reader resumes at the next
/// `Name:` line.
pub struct MspReader<R: BufRead> {
    source: R,
    state: ParserState,
    line_number: usize,
    buffer: String,
    /// `Name:` line already consumed while ending the previous entry
    pending_name: Option<(String, usize)>,
}

impl<R: BufRead> MspReader<R> {
    /// Wrap a buffered source
    pub fn new(source: R) -> Self {
        Self {
            source,
            state: ParserState::Between,
            line_number: 0,
            buffer: String::new(),
            pending_name: None,
        }
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn read_line(&mut self) -> Result<Option<String>, MspError> {
        self.buffer.clear();
        let n = self.source.read_line(&mut self.buffer)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(
            self.buffer.trim_end_matches(['\r', '\n']).to_string(),
        ))
    }

    fn parse_header(&self, line: &str, entry: &mut RawEntry) -> Result<(), MspError> {
        let Some((key, value)) = line.split_once(':') else {
            return Err(MspError::MalformedHeader {
                line: self.line_number,
                message: format!("expected `Key: value`, found {:?}", line),
            });
        };
        let key = key.trim();
        let value = value.trim();
        match key.to_ascii_lowercase().as_str() {
            "mw" => {
                entry.mw = Some(value.parse::<f64>().map_err(|_| MspError::MalformedHeader {
                    line: self.line_number,
                    message: format!("invalid MW {:?}", value),
                })?);
            }
            "comment" => entry.comment.extend(parse_comment(value)),
            "num peaks" => {
                entry.num_peaks =
                    Some(value.parse::<usize>().map_err(|_| MspError::MalformedHeader {
                        line: self.line_number,
                        message: format!("invalid peak count {:?}", value),
                    })?);
            }
            _ => entry.headers.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn parse_peak(&self, line: &str, entry: &mut RawEntry) -> Result<(), MspError> {
        let malformed = || MspError::MalformedPeakLine {
            line: self.line_number,
            content: line.to_string(),
        };
        // A third column holds a quoted annotation and is ignored
        let mut tokens = line.split_whitespace();
        let mz = tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(malformed)?;
        let intensity = tokens
            .next()
            .and_then(|t| t.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(malformed)?;
        entry.peaks.push(mz, intensity);
        Ok(())
    }

    fn finish_entry(&self, entry: RawEntry) -> RawEntry {
        if let Some(declared) = entry.num_peaks {
            if declared != entry.peaks.len() {
                warn!(
                    "Entry {:?} at line {} declares {} peaks but has {}",
                    entry.name,
                    entry.line,
                    declared,
                    entry.peaks.len()
                );
            }
        }
        entry
    }

    /// Read the next entry
    pub fn read_next(&mut self) -> Option<Result<RawEntry, MspError>> {
        let mut entry = RawEntry::default();
        if let Some((name, line)) = self.pending_name.take() {
            entry.name = name;
            entry.line = line;
            self.state = ParserState::Headers;
        }

        loop {
            if self.state == ParserState::Done {
                return None;
            }
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    let state = self.state;
                    self.state = ParserState::Done;
                    return match state {
                        ParserState::Headers | ParserState::Peaks => {
                            Some(Ok(self.finish_entry(entry)))
                        }
                        _ => None,
                    };
                }
                Err(e) => {
                    self.state = ParserState::Done;
                    return Some(Err(e));
                }
            };
            let trimmed = line.trim();
            let name = name_value(trimmed);

            match self.state {
                ParserState::Between | ParserState::Recovering => {
                    if let Some(name) = name {
                        entry.name = name.to_string();
                        entry.line = self.line_number;
                        self.state = ParserState::Headers;
                    } else if self.state == ParserState::Between && !trimmed.is_empty() {
                        debug!("Skipping line {} outside an entry", self.line_number);
                    }
                }
                ParserState::Headers => {
                    if trimmed.is_empty() {
                        self.state = ParserState::Between;
                        return Some(Ok(self.finish_entry(entry)));
                    }
                    if let Some(name) = name {
                        self.pending_name = Some((name.to_string(), self.line_number));
                        self.state = ParserState::Between;
                        return Some(Ok(self.finish_entry(entry)));
                    }
                    if starts_with_number(trimmed) {
                        self.state = ParserState::Peaks;
                        if let Err(e) = self.parse_peak(trimmed, &mut entry) {
                            self.state = ParserState::Recovering;
                            return Some(Err(e));
                        }
                    } else if let Err(e) = self.parse_header(trimmed, &mut entry) {
                        self.state = ParserState::Recovering;
                        return Some(Err(e));
                    }
                }
                ParserState::Peaks => {
                    if trimmed.is_empty() {
                        self.state = ParserState::Between;
                        return Some(Ok(self.finish_entry(entry)));
                    }
                    if let Some(name) = name {
                        self.pending_name = Some((name.to_string(), self.line_number));
                        self.state = ParserState::Between;
                        return Some(Ok(self.finish_entry(entry)));
                    }
                    if let Err(e) = self.parse_peak(trimmed, &mut entry) {
                        self.state = ParserState::Recovering;
                        return Some(Err(e));
                    }
                }
                ParserState::Done => return None,
            }
        }
    }
}

impl<R: BufRead> Iterator for MspReader<R> {
    type Item = Result<RawEntry, MspError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}

fn name_value(line: &str) -> Option<&str> {
    let (key, value) = line.split_once(':')?;
    if key.trim().eq_ignore_ascii_case("name") {
        Some(value.trim())
    } else {
        None
    }
}

fn starts_with_number(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
}
