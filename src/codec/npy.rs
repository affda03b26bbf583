//! codec::npy
//!
//! NumPy `.npy` payloads through `ndarray-npy`. Every dtype and shape
//! round-trips exactly.

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadNpyExt, ReadableElement, WriteNpyExt};

use super::{ArrayData, Codec, CodecError, Decoded, Format};

/// The `.npy` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyCodec;

fn read<T: ReadableElement>(bytes: &[u8]) -> Result<ArrayD<T>, ReadNpyError> {
    ArrayD::<T>::read_npy(bytes)
}

impl Codec for NpyCodec {
    fn format(&self) -> Format {
        Format::Npy
    }

    fn encode(
        &self,
        _name: &str,
        data: &ArrayData,
        _samplerate: Option<u32>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        with_array!(data, arr => arr.write_npy(&mut bytes))
            .map_err(|e| CodecError::encode(Format::Npy, e))?;
        Ok(bytes)
    }

    fn decode(&self, _name: &str, bytes: &[u8]) -> Result<Decoded, CodecError> {
        // The header names the dtype; a mismatched read fails fast on it.
        let data = read::<f64>(bytes)
            .map(ArrayData::from)
            .or_else(|_| read::<f32>(bytes).map(ArrayData::from))
            .or_else(|_| read::<i64>(bytes).map(ArrayData::from))
            .or_else(|_| read::<i32>(bytes).map(ArrayData::from))
            .or_else(|_| read::<i16>(bytes).map(ArrayData::from))
            .or_else(|_| read::<u8>(bytes).map(ArrayData::from))
            .map_err(|e| {
                CodecError::decode(Format::Npy, format!("unsupported or malformed array: {}", e))
            })?;
        Ok(Decoded::plain(data))
    }
}
