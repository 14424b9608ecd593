//! Format parsers for the blockflow renderer.
//!
//! Parses Standard MIDI Files (formats 0, 1 and 2) into the IR.

mod smf;

pub use smf::parse_midi;

/// Error type for format parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    InvalidHeader,
    /// Unexpected end of file
    UnexpectedEof,
    /// SMF format number outside 0..=2
    UnsupportedFormat,
    /// SMPTE division is not supported, only ticks per quarter note
    UnsupportedDivision,
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FormatError::InvalidHeader => write!(f, "invalid file header"),
            FormatError::UnexpectedEof => write!(f, "unexpected end of file"),
            FormatError::UnsupportedFormat => write!(f, "unsupported SMF format"),
            FormatError::UnsupportedDivision => write!(f, "SMPTE division not supported"),
        }
    }
}

impl std::error::Error for FormatError {}
