//! # Spectral-text codec
//!
//! Reads and writes NIST-style MSP spectral libraries. An entry is four
//! header lines followed by the peak list and a blank line:
//!
//! ```text
//! Name: MLQGR/2_1(0,M,Oxidation)
//! MW: 605.2933
//! Comment: Parent=303.65390 Mods=1(0,M,Oxidation) Fullname=K.MLQGR.A/2
//! Num peaks: 2
//! 175.11900	10
//! 232.14000	20
//!
//! ```
//!
//! Reading is split in two steps: [`MspReader`] yields [`RawEntry`] values
//! holding the file's fields as text, and [`RawEntry::into_spectrum`]
//! interprets them. Modification positions in `Name:` and `Mods=` are
//! 0-based.

mod comment;
mod entry;
mod error;
mod reader;
mod writer;

pub use comment::{
    format_pair, format_proteins, format_quoted_pair, parse_comment, parse_proteins,
};
pub use entry::{EntryName, KNOWN_COMMENT_KEYS};
pub use error::MspError;
pub use reader::{MspReader, RawEntry};
pub use writer::{format_entry, MspWriter};

#[cfg(test)]
mod tests;
