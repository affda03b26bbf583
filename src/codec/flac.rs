//! codec::flac
//!
//! FLAC payloads: encoded with `flacenc`, decoded with `claxon`.
//!
//! | array dtype          | stored as              | decoded as |
//! |----------------------|------------------------|------------|
//! | `int16`              | 16 bits per sample      | `int16`    |
//! | `int32`              | 24 bits per sample      | `int32`    |
//! | `float32`, `float64` | quantized to 16 bits    | `int16`    |
//!
//! `int32` samples must fit in 24 bits. Floats are clamped to `[-1, 1]`
//! before quantization.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use super::audio::{self, deinterleave};
use super::{ArrayData, Codec, CodecError, Decoded, Format};

const MAX_CHANNELS: usize = 8;
const INT24_MAX: i32 = (1 << 23) - 1;
const INT24_MIN: i32 = -(1 << 23);

/// The `.flac` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlacCodec;

fn quantize(sample: f64) -> i32 {
    (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)).round() as i32
}

impl Codec for FlacCodec {
    fn format(&self) -> Format {
        Format::Flac
    }

    fn encode(
        &self,
        _name: &str,
        data: &ArrayData,
        samplerate: Option<u32>,
    ) -> Result<Vec<u8>, CodecError> {
        let sample_rate = audio::require_samplerate(Format::Flac, samplerate)?;
        let layout = audio::layout(Format::Flac, data.shape(), MAX_CHANNELS)?;

        let (samples, bits_per_sample): (Vec<i32>, usize) = match data {
            ArrayData::Int16(arr) => (arr.iter().map(|&s| i32::from(s)).collect(), 16),
            ArrayData::Int32(arr) => {
                if let Some(s) = arr.iter().find(|&&s| !(INT24_MIN..=INT24_MAX).contains(&s)) {
                    return Err(CodecError::encode(
                        Format::Flac,
                        format!("sample {} does not fit in 24 bits", s),
                    ));
                }
                (arr.iter().copied().collect(), 24)
            }
            ArrayData::Float32(arr) => (arr.iter().map(|&s| quantize(f64::from(s))).collect(), 16),
            ArrayData::Float64(arr) => (arr.iter().map(|&s| quantize(s)).collect(), 16),
            other => {
                return Err(CodecError::UnsupportedDType {
                    format: Format::Flac,
                    dtype: other.dtype(),
                })
            }
        };

        let config = flacenc::config::Encoder::default()
            .into_verified()
            .map_err(|_| CodecError::encode(Format::Flac, "invalid encoder configuration"))?;
        let source = MemSource::from_samples(
            &samples,
            layout.channels,
            bits_per_sample,
            sample_rate as usize,
        );
        let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|e| CodecError::encode(Format::Flac, format!("{:?}", e)))?;

        let mut sink = ByteSink::new();
        stream
            .write(&mut sink)
            .map_err(|_| CodecError::encode(Format::Flac, "failed to serialize stream"))?;
        Ok(sink.as_slice().to_vec())
    }

    fn decode(&self, _name: &str, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let mut reader =
            claxon::FlacReader::new(bytes).map_err(|e| CodecError::decode(Format::Flac, e))?;
        let info = reader.streaminfo();
        let channels = info.channels as usize;
        let samples = reader
            .samples()
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|e| CodecError::decode(Format::Flac, e))?;

        let data = if info.bits_per_sample <= 16 {
            let narrow: Vec<i16> = samples.into_iter().map(|s| s as i16).collect();
            ArrayData::from(deinterleave(Format::Flac, narrow, channels)?)
        } else {
            ArrayData::from(deinterleave(Format::Flac, samples, channels)?)
        };
        Ok(Decoded {
            data,
            samplerate: Some(info.sample_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn tone(frames: usize) -> Vec<i16> {
        (0..frames)
            .map(|i| ((i as f64 * 0.05).sin() * 12_000.0) as i16)
            .collect()
    }

    #[test]
    fn int16_mono_is_lossless() {
        let data = ArrayData::from(tone(4096));
        let bytes = FlacCodec.encode("a", &data, Some(16_000)).unwrap();
        let decoded = FlacCodec.decode("a", &bytes).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.samplerate, Some(16_000));
    }

    #[test]
    fn int32_stereo_is_lossless() {
        let samples: Vec<i32> = (0..2000).map(|i| (i * 997) % INT24_MAX - 4_000_000).collect();
        let data = ArrayData::from(Array2::from_shape_vec((1000, 2), samples).unwrap());
        let bytes = FlacCodec.encode("a", &data, Some(48_000)).unwrap();
        assert_eq!(FlacCodec.decode("a", &bytes).unwrap().data, data);
    }

    #[test]
    fn int32_out_of_range_fails() {
        let data = ArrayData::from(vec![i32::MAX]);
        assert!(FlacCodec.encode("a", &data, Some(8000)).is_err());
    }

    #[test]
    fn floats_are_quantized() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-2.0), -32767);
        assert_eq!(quantize(0.0), 0);
    }
}
