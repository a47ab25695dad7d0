use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::BytesMut;
use wirebind_codec::{AdapterRegistry, WireType};
use wirebind_frame::{FrameConfig, FrameDecoder};

use crate::error::{Error, Result};

/// Decodes a byte stream into records of type `T`.
///
/// Each frame emitted by the frame decoder is read as one `T` at a fixed
/// protocol version. Bytes left in a frame after the record are ignored.
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::BytesMut;
/// use wirebind::codec::{AdapterRegistry, FieldSpec, RecordSchema, WireType};
/// use wirebind::frame::{FrameConfig, Header};
/// use wirebind::MessageDecoder;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Reading {
///     channel: u8,
///     value: u16,
/// }
///
/// impl WireType for Reading {}
///
/// let mut builder = AdapterRegistry::builder();
/// builder
///     .register_record(
///         RecordSchema::<Reading>::new()
///             .field("channel", FieldSpec::new(), |r| &r.channel, |r, v| r.channel = v)
///             .field("value", FieldSpec::new().length(2).big_endian(), |r| &r.value, |r, v| r.value = v),
///     )
///     .unwrap();
///
/// let config = FrameConfig {
///     header: Header::One(0x68),
///     length_field_offset: 1,
///     length_field_length: 1,
///     initial_bytes_to_strip: 2,
///     ..FrameConfig::default()
/// };
/// let mut decoder = MessageDecoder::<Reading>::new(config, Arc::new(builder.build()), 1).unwrap();
///
/// let mut src = BytesMut::from(&[0xFF, 0x68, 0x03, 0x02, 0x01, 0x2C][..]);
/// let reading = decoder.decode_message(&mut src).unwrap();
/// assert_eq!(reading, Some(Reading { channel: 2, value: 300 }));
/// ```
pub struct MessageDecoder<T> {
    frames: FrameDecoder,
    registry: Arc<AdapterRegistry>,
    version: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: WireType> MessageDecoder<T> {
    /// Create a decoder reading records at protocol `version`.
    pub fn new(config: FrameConfig, registry: Arc<AdapterRegistry>, version: u32) -> Result<Self> {
        Ok(Self {
            frames: FrameDecoder::new(config)?,
            registry,
            version,
            _marker: PhantomData,
        })
    }

    /// Create a decoder at the registry's default version.
    pub fn with_default_version(config: FrameConfig, registry: Arc<AdapterRegistry>) -> Result<Self> {
        let version = registry.config().default_version;
        Self::new(config, registry, version)
    }

    /// Decode the next record from `src`.
    ///
    /// Returns `Ok(None)` when more input is needed.
    pub fn decode_message(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        let Some(mut frame) = self.frames.decode_frame(src)? else {
            return Ok(None);
        };
        if frame.is_empty() {
            return Err(Error::EmptyMessage);
        }
        let frame_len = frame.len();
        let record = self
            .registry
            .decode::<T>(&mut frame, self.version)?
            .ok_or(Error::EmptyMessage)?;
        if !frame.is_empty() {
            tracing::trace!(
                frame_len,
                unread = frame.len(),
                "trailing frame bytes ignored"
            );
        }
        Ok(Some(record))
    }

    /// Protocol version records are read at.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    /// The frame decoder driving this message decoder.
    pub fn frame_decoder(&self) -> &FrameDecoder {
        &self.frames
    }
}

impl<T> fmt::Debug for MessageDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDecoder")
            .field("frames", &self.frames)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "async")]
impl<T: WireType> tokio_util::codec::Decoder for MessageDecoder<T> {
    type Item = T;
    type Error = Error;

    /// Oversized frames are skipped so the stream keeps going.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        loop {
            match self.decode_message(src) {
                Err(Error::Frame(wirebind_frame::FrameError::TooLongFrame {
                    length, max, ..
                })) => {
                    tracing::debug!(length, max, "oversized frame skipped");
                }
                other => return other,
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        match tokio_util::codec::Decoder::decode(self, src)? {
            Some(record) => Ok(Some(record)),
            None if src.is_empty() || self.frames.is_discarding() => Ok(None),
            None => Err(Error::Frame(wirebind_frame::FrameError::ConnectionClosed)),
        }
    }
}
