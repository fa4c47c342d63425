use serde::Deserialize;

/// Default size of the input buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 65536;

/// Default upper bound for a single record or block
pub const DEFAULT_MAX_BLOCK_LEN: usize = 16 * 1024 * 1024;

/// Tunables of a capture parse
///
/// All fields have defaults, so a partial configuration (for ex. embedded in a JSON or TOML
/// document) can be deserialized.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Initial capacity of the input buffer. The buffer grows to fit the largest block read.
    pub buffer_capacity: usize,
    /// Largest record or block buffered. A larger legacy record ends the capture; a larger
    /// pcapng block is skipped.
    pub max_block_len: usize,
    /// Minimum change, in percent, between two decode progress notifications
    pub progress_step: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_block_len: DEFAULT_MAX_BLOCK_LEN,
            progress_step: 1,
        }
    }
}
