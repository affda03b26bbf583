//! codec
//!
//! Array codecs: payload bytes to and from numeric arrays.
//!
//! # Architecture
//!
//! Every payload format implements [`Codec`]. The dataset layer never
//! touches a format directly; it picks a codec from the [`CodecRegistry`]
//! by [`Format`] tag (on write) or by payload file extension (on read).
//!
//! Built-in formats:
//!
//! - [`Format::Npy`] - NumPy `.npy`, any shape and dtype
//! - [`Format::Wav`] - RIFF/WAVE audio
//! - [`Format::Flac`] - lossless FLAC audio
//! - [`Format::Ogg`] - lossy Ogg Vorbis audio
//! - [`Format::Mat`] - MATLAB level 5 MAT-file
//!
//! Audio formats need a sample rate to encode and report the header's
//! sample rate on decode.
//!
//! # Example
//!
//! ```
//! use jbof::codec::{ArrayData, CodecRegistry, Format};
//!
//! let registry = CodecRegistry::builtin();
//! let codec = registry.get(Format::Npy).unwrap();
//! let data = ArrayData::from(vec![1.0f64, 2.0, 3.0]);
//! let bytes = codec.encode("ones", &data, None).unwrap();
//! assert_eq!(codec.decode("ones", &bytes).unwrap().data, data);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayD, Dimension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::errors::{JbofError, Result};
use crate::core::paths::extension_of;

/// Run `$body` with `$arr` bound to the typed array inside an
/// [`ArrayData`].
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            $crate::codec::ArrayData::Float64($arr) => $body,
            $crate::codec::ArrayData::Float32($arr) => $body,
            $crate::codec::ArrayData::Int64($arr) => $body,
            $crate::codec::ArrayData::Int32($arr) => $body,
            $crate::codec::ArrayData::Int16($arr) => $body,
            $crate::codec::ArrayData::UInt8($arr) => $body,
        }
    };
}
pub(crate) use with_array;

mod audio;
pub mod flac;
pub mod mat;
pub mod npy;
pub mod ogg;
pub mod wav;

/// A payload format tag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// NumPy array file
    #[default]
    Npy,
    /// RIFF/WAVE audio
    Wav,
    /// FLAC audio
    Flac,
    /// Ogg Vorbis audio
    Ogg,
    /// MATLAB level 5 MAT-file
    Mat,
}

impl Format {
    /// Every built-in format.
    pub const ALL: [Format; 5] = [
        Format::Npy,
        Format::Wav,
        Format::Flac,
        Format::Ogg,
        Format::Mat,
    ];

    /// The tag, which is also the payload file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Npy => "npy",
            Format::Wav => "wav",
            Format::Flac => "flac",
            Format::Ogg => "ogg",
            Format::Mat => "mat",
        }
    }

    /// Look a format up by file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`JbofError::UnsupportedFormat`] for an unknown extension.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let lower = ext.to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| JbofError::UnsupportedFormat(ext.to_string()))
    }

    /// The format of a payload file, from its extension.
    pub fn of_file(file_name: &str) -> Result<Self> {
        let ext = extension_of(file_name)
            .ok_or_else(|| JbofError::UnsupportedFormat(file_name.to_string()))?;
        Self::from_extension(&ext)
    }

    /// Whether the format stores audio and carries a sample rate.
    pub fn is_audio(self) -> bool {
        matches!(self, Format::Wav | Format::Flac | Format::Ogg)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = JbofError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
    }
}

/// Element type of an [`ArrayData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float64,
    Float32,
    Int64,
    Int32,
    Int16,
    UInt8,
}

impl DType {
    /// NumPy-style name.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::Int64 => "int64",
            DType::Int32 => "int32",
            DType::Int16 => "int16",
            DType::UInt8 => "uint8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An N-dimensional numeric array of one of the supported element types.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Float64(ArrayD<f64>),
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
    Int32(ArrayD<i32>),
    Int16(ArrayD<i16>),
    UInt8(ArrayD<u8>),
}

impl ArrayData {
    /// The element type.
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::UInt8(_) => DType::UInt8,
        }
    }

    /// The shape, outermost axis first.
    pub fn shape(&self) -> &[usize] {
        with_array!(self, arr => arr.shape())
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every element widened to `f64`, keeping the shape.
    pub fn to_f64(&self) -> ArrayD<f64> {
        with_array!(self, arr => arr.mapv(|v| v as f64))
    }
}

macro_rules! impl_array_data_from {
    ($ty:ty, $variant:ident, $as:ident) => {
        impl<D: Dimension> From<Array<$ty, D>> for ArrayData {
            fn from(arr: Array<$ty, D>) -> Self {
                ArrayData::$variant(arr.into_dyn())
            }
        }

        impl From<Vec<$ty>> for ArrayData {
            fn from(values: Vec<$ty>) -> Self {
                ArrayData::$variant(Array::from_vec(values).into_dyn())
            }
        }

        impl ArrayData {
            /// The typed array, if the element type matches.
            pub fn $as(&self) -> Option<&ArrayD<$ty>> {
                match self {
                    ArrayData::$variant(arr) => Some(arr),
                    _ => None,
                }
            }
        }
    };
}

impl_array_data_from!(f64, Float64, as_f64);
impl_array_data_from!(f32, Float32, as_f32);
impl_array_data_from!(i64, Int64, as_i64);
impl_array_data_from!(i32, Int32, as_i32);
impl_array_data_from!(i16, Int16, as_i16);
impl_array_data_from!(u8, UInt8, as_u8);

/// Errors raised by codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode {format}: {message}")]
    Encode { format: Format, message: String },

    #[error("failed to decode {format}: {message}")]
    Decode { format: Format, message: String },

    #[error("{format} cannot store {dtype} arrays")]
    UnsupportedDType { format: Format, dtype: DType },

    #[error("{format} cannot store an array of shape {shape:?}: {reason}")]
    InvalidShape {
        format: Format,
        shape: Vec<usize>,
        reason: &'static str,
    },
}

impl CodecError {
    pub(crate) fn encode(format: Format, message: impl fmt::Display) -> Self {
        CodecError::Encode {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(format: Format, message: impl fmt::Display) -> Self {
        CodecError::Decode {
            format,
            message: message.to_string(),
        }
    }
}

/// A decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The array values.
    pub data: ArrayData,
    /// Sample rate from the payload header (audio formats only).
    pub samplerate: Option<u32>,
}

impl Decoded {
    pub(crate) fn plain(data: ArrayData) -> Self {
        Self {
            data,
            samplerate: None,
        }
    }
}

/// One payload format.
pub trait Codec {
    /// The format this codec reads and writes.
    fn format(&self) -> Format;

    /// Encode `data` into payload bytes.
    ///
    /// `name` is the array name (some containers record it); `samplerate`
    /// is required by audio codecs.
    fn encode(
        &self,
        name: &str,
        data: &ArrayData,
        samplerate: Option<u32>,
    ) -> std::result::Result<Vec<u8>, CodecError>;

    /// Decode payload bytes.
    fn decode(&self, name: &str, bytes: &[u8]) -> std::result::Result<Decoded, CodecError>;
}

/// Format tag to codec lookup.
pub struct CodecRegistry {
    codecs: BTreeMap<Format, Box<dyn Codec>>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// A registry with every built-in codec.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(npy::NpyCodec));
        registry.register(Box::new(wav::WavCodec));
        registry.register(Box::new(flac::FlacCodec));
        registry.register(Box::new(ogg::OggCodec));
        registry.register(Box::new(mat::MatCodec));
        registry
    }

    /// Add or replace the codec for its format.
    pub fn register(&mut self, codec: Box<dyn Codec>) {
        self.codecs.insert(codec.format(), codec);
    }

    /// The codec for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`JbofError::UnsupportedFormat`] if none is registered.
    pub fn get(&self, format: Format) -> Result<&dyn Codec> {
        self.codecs
            .get(&format)
            .map(Box::as_ref)
            .ok_or_else(|| JbofError::UnsupportedFormat(format.to_string()))
    }

    /// The codec for a payload file, chosen by extension.
    pub fn for_file(&self, file_name: &str) -> Result<&dyn Codec> {
        self.get(Format::of_file(file_name)?)
    }

    /// Registered formats, in tag order.
    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.codecs.keys().copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array3};

    mod format {
        use super::*;

        #[test]
        fn parses_tags_case_insensitively() {
            assert_eq!("npy".parse::<Format>().unwrap(), Format::Npy);
            assert_eq!("FLAC".parse::<Format>().unwrap(), Format::Flac);
        }

        #[test]
        fn unknown_tag_is_unsupported() {
            assert!(matches!(
                "mp3".parse::<Format>(),
                Err(JbofError::UnsupportedFormat(tag)) if tag == "mp3"
            ));
        }

        #[test]
        fn file_extension_selects_format() {
            assert_eq!(Format::of_file("take.Wav").unwrap(), Format::Wav);
            assert!(Format::of_file("noext").is_err());
        }

        #[test]
        fn audio_formats() {
            let audio: Vec<_> = Format::ALL.into_iter().filter(|f| f.is_audio()).collect();
            assert_eq!(audio, vec![Format::Wav, Format::Flac, Format::Ogg]);
        }

        #[test]
        fn serde_uses_tag() {
            assert_eq!(serde_json::to_string(&Format::Ogg).unwrap(), "\"ogg\"");
        }
    }

    mod array_data {
        use super::*;

        #[test]
        fn from_vec_is_one_dimensional() {
            let data = ArrayData::from(vec![1i16, 2, 3]);
            assert_eq!(data.dtype(), DType::Int16);
            assert_eq!(data.shape(), &[3]);
            assert_eq!(data.as_i16().unwrap().len(), 3);
            assert!(data.as_f64().is_none());
        }

        #[test]
        fn from_fixed_dimension_array() {
            let data = ArrayData::from(arr2(&[[1u8, 2], [3, 4]]));
            assert_eq!(data.shape(), &[2, 2]);
            assert_eq!(data.ndim(), 2);
        }

        #[test]
        fn to_f64_keeps_shape() {
            let data = ArrayData::from(Array3::<i32>::ones((2, 3, 4)));
            let wide = data.to_f64();
            assert_eq!(wide.shape(), &[2, 3, 4]);
            assert!(wide.iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn builtin_registry_has_every_format() {
        let registry = CodecRegistry::builtin();
        assert_eq!(registry.formats().collect::<Vec<_>>(), Format::ALL.to_vec());
        assert_eq!(registry.for_file("x.mat").unwrap().format(), Format::Mat);
    }

    #[test]
    fn empty_registry_rejects_lookups() {
        let registry = CodecRegistry::new();
        assert!(matches!(
            registry.get(Format::Npy),
            Err(JbofError::UnsupportedFormat(_))
        ));
    }
}
