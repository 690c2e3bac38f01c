//! Limits consumed by the decoder.

use thiserror::Error;

/// Default limit of an initial line (and of a chunk size line).
pub const DEFAULT_MAX_INITIAL_LINE_LENGTH: usize = 4096;

/// Default limit of a header block.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8192;

/// Default limit of a single chunk.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 8192;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer: {value}")]
    NotPositive { name: &'static str, value: usize },
}

/// Size limits of [`IcapMessageDecoder`](crate::codec::IcapMessageDecoder).
///
/// Exceeding any of them is fatal for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_initial_line_length: usize,
    max_header_size: usize,
    max_chunk_size: usize,
}

impl DecoderConfig {
    pub fn new(max_initial_line_length: usize, max_header_size: usize, max_chunk_size: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            max_initial_line_length: positive("max_initial_line_length", max_initial_line_length)?,
            max_header_size: positive("max_header_size", max_header_size)?,
            max_chunk_size: positive("max_chunk_size", max_chunk_size)?,
        })
    }

    pub fn max_initial_line_length(&self) -> usize {
        self.max_initial_line_length
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn with_max_initial_line_length(mut self, value: usize) -> Result<Self, ConfigError> {
        self.max_initial_line_length = positive("max_initial_line_length", value)?;
        Ok(self)
    }

    pub fn with_max_header_size(mut self, value: usize) -> Result<Self, ConfigError> {
        self.max_header_size = positive("max_header_size", value)?;
        Ok(self)
    }

    pub fn with_max_chunk_size(mut self, value: usize) -> Result<Self, ConfigError> {
        self.max_chunk_size = positive("max_chunk_size", value)?;
        Ok(self)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_initial_line_length: DEFAULT_MAX_INITIAL_LINE_LENGTH,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

pub(crate) fn positive(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { name, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_initial_line_length(), 4096);
        assert_eq!(config.max_header_size(), 8192);
        assert_eq!(config.max_chunk_size(), 8192);
    }

    #[test]
    fn reject_zero_limits() {
        assert!(DecoderConfig::new(0, 1, 1).is_err());
        assert!(DecoderConfig::default().with_max_header_size(0).is_err());
        assert_eq!(DecoderConfig::default().with_max_chunk_size(16).unwrap().max_chunk_size(), 16);
    }
}
