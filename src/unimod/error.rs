/// Errors raised while loading modification records
#[derive(Debug, thiserror::Error)]
pub enum ModificationDbError {
    /// I/O error reading the provider source
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// XML parsing error
    #[cfg(feature = "unimod-xml")]
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Attribute value could not be decoded
    #[error("Invalid attribute value: {0}")]
    InvalidAttributeValue(String),

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Provider yielded no usable records
    #[error("No modification records found in {0}")]
    Empty(String),
}
