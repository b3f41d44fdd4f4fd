use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model magic: expected 'XNET', got {0:?}")]
    InvalidMagic([u8; 4]),
    #[error("unsupported model format version: {0}")]
    UnsupportedVersion(u32),
    #[error("unknown node type: {0}")]
    UnknownNodeType(u32),
    #[error("unsupported tensor data type: {0}")]
    UnsupportedDataType(String),
    #[error("{node} node is missing its {param}")]
    MissingParameter {
        node: &'static str,
        param: &'static str,
    },
    #[error("tensor value count mismatch: shape holds {expected}, record has {got}")]
    ValueCount { expected: usize, got: usize },
    #[error("invalid UTF-8 in model string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("zero point {0} is outside [0, 255]")]
    ZeroPointOutOfRange(i32),
    #[error("cannot run forward on an empty network")]
    EmptyNetwork,
    #[error("tensor error: {0}")]
    TensorError(#[from] xn_tensor::TensorError),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
