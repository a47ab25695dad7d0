use wirebind_codec::CodecError;
use wirebind_frame::FrameError;

/// Errors from decoding framed messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A frame was delimited but held no bytes for the record.
    #[error("frame carried no message body")]
    EmptyMessage,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Frame(FrameError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
