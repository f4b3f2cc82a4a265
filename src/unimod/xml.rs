//! Streaming reader for `unimod.xml`
//!
//! Only the `title` and `approved` attributes of each `<umod:mod>` and the
//! `mono_mass` of its `<umod:delta>` are extracted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{ModificationDbError, ModificationProvider, ModificationRecord};

/// Provider reading a Unimod XML file from disk
#[derive(Debug, Clone)]
pub struct UnimodXml {
    path: PathBuf,
}

impl UnimodXml {
    /// Create a provider for the given file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ModificationProvider for UnimodXml {
    fn records(&self) -> Result<Vec<ModificationRecord>, ModificationDbError> {
        let file = File::open(&self.path)?;
        let records = parse_unimod(BufReader::with_capacity(64 * 1024, file))?;
        if records.is_empty() {
            return Err(ModificationDbError::Empty(self.path.display().to_string()));
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse modification records from any buffered XML source
pub fn parse_unimod<R: BufRead>(source: R) -> Result<Vec<ModificationRecord>, ModificationDbError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut records = Vec::new();
    let mut current: Option<(String, bool)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"mod" => {
                    let title = get_attribute(e, "title")?;
                    let approved = get_attribute(e, "approved")?
                        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                        .unwrap_or(false);
                    current = title.map(|t| (t, approved));
                }
                b"delta" => {
                    if let Some((title, approved)) = current.take() {
                        match get_attribute(e, "mono_mass")?.map(|v| v.parse::<f64>()) {
                            Some(Ok(mass)) => {
                                records.push(ModificationRecord::new(title, mass, approved))
                            }
                            Some(Err(_)) | None => {
                                debug!("Skipping modification {} without a usable mono_mass", title)
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::End(ref e) if e.local_name().as_ref() == b"mod" => {
                current = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, ModificationDbError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ModificationDbError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(|e| ModificationDbError::InvalidAttributeValue(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
