use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the codestream codec behind the line exchange boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Htj2kError {
    #[error("Invalid data")]
    InvalidData = 1,
    #[error("Need more data")]
    NeedMoreData = 2,
    #[error("Invalid operation for the current codestream state")]
    InvalidOperation = 3,
    #[error("Invalid marker segment size")]
    InvalidMarkerSegmentSize = 4,
    #[error("Unexpected marker found")]
    UnexpectedMarker = 5,
    #[error("Start of codestream marker not found")]
    StartOfCodestreamNotFound = 6,
    #[error("End of codestream marker not found")]
    EndOfCodestreamNotFound = 7,
    #[error("Missing packet")]
    MissingPacket = 8,
    #[error("Duplicate packet")]
    DuplicatePacket = 9,
    #[error("Invalid packet")]
    InvalidPacket = 10,
    #[error("Writing to the output sink failed")]
    OutputWriteFailed = 11,
    #[error("Flush requested before all image lines were exchanged")]
    LinesNotExchanged = 12,
    #[error("Color transform requires three components of equal size")]
    ColorTransformNotSupported = 13,
    #[error("Not enough memory")]
    NotEnoughMemory = 14,

    #[error("Invalid parameter image extent")]
    InvalidParameterExtent = 20,
    #[error("Invalid parameter component count")]
    InvalidParameterComponentCount = 21,
    #[error("Invalid parameter bit depth")]
    InvalidParameterBitDepth = 22,
    #[error("Invalid parameter downsampling")]
    InvalidParameterDownsampling = 23,
    #[error("Invalid parameter decomposition levels")]
    InvalidParameterDecompositionLevels = 24,
    #[error("Invalid parameter code-block size")]
    InvalidParameterCodeblockSize = 25,
    #[error("Invalid parameter progression order")]
    InvalidParameterProgressionOrder = 26,
    #[error("Invalid parameter quantization step")]
    InvalidParameterQuantizationStep = 27,
    #[error("Invalid parameter resolution reduction")]
    InvalidParameterResolution = 28,
}

/// The bridge operation during which an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Decompress,
    CompressToFile,
    DecompressFromFile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Compress => "compression",
            Operation::Decompress => "decompression",
            Operation::CompressToFile => "file compression",
            Operation::DecompressFromFile => "file decompression",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    BufferTooSmall,
    CodecFailure,
    Unknown,
}

/// Errors returned by the public bridge entry points.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Recoverable: retry with a buffer of at least `required` bytes.
    #[error("Destination buffer too small: {required} bytes required")]
    BufferTooSmall { required: usize },

    #[error("HTJ2K {operation} error: {source}")]
    Codec {
        operation: Operation,
        #[source]
        source: Htj2kError,
    },

    #[error("HTJ2K {operation} error: line protocol violated: {detail}")]
    ProtocolViolation { operation: Operation, detail: String },

    #[error("HTJ2K {operation} error: {}: {source}", .path.display())]
    Io {
        operation: Operation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        BridgeError::InvalidParameter(message.into())
    }

    pub(crate) fn codec(operation: Operation) -> impl FnOnce(Htj2kError) -> Self {
        move |source| BridgeError::Codec { operation, source }
    }

    pub(crate) fn protocol(operation: Operation, detail: impl Into<String>) -> Self {
        BridgeError::ProtocolViolation {
            operation,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            BridgeError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            BridgeError::Codec { .. } | BridgeError::Io { .. } => ErrorKind::CodecFailure,
            BridgeError::ProtocolViolation { .. } => ErrorKind::Unknown,
        }
    }
}
