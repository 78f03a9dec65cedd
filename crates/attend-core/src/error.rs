use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttendError {
    #[error("invalid frame: {width}x{height} with {len} bytes (expected {expected})")]
    InvalidFrame {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
