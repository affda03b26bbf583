//! codec::wav
//!
//! RIFF/WAVE payloads through `hound`.
//!
//! | array dtype          | stored as        | decoded as |
//! |----------------------|------------------|------------|
//! | `float32`, `float64` | 32-bit IEEE float | `float32` |
//! | `int16`              | 16-bit PCM       | `int16`    |
//! | `int32`              | 32-bit PCM       | `int32`    |

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::audio::{self, deinterleave};
use super::{ArrayData, Codec, CodecError, Decoded, Format};

/// The `.wav` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

fn write_samples<S: hound::Sample>(
    spec: WavSpec,
    samples: impl Iterator<Item = S>,
) -> Result<Vec<u8>, CodecError> {
    let encode_err = |e: hound::Error| CodecError::encode(Format::Wav, e);
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
        for sample in samples {
            writer.write_sample(sample).map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;
    }
    Ok(cursor.into_inner())
}

fn read_samples<S: hound::Sample>(reader: &mut WavReader<&[u8]>) -> Result<Vec<S>, CodecError> {
    reader
        .samples::<S>()
        .collect::<Result<Vec<S>, _>>()
        .map_err(|e| CodecError::decode(Format::Wav, e))
}

impl Codec for WavCodec {
    fn format(&self) -> Format {
        Format::Wav
    }

    fn encode(
        &self,
        _name: &str,
        data: &ArrayData,
        samplerate: Option<u32>,
    ) -> Result<Vec<u8>, CodecError> {
        let sample_rate = audio::require_samplerate(Format::Wav, samplerate)?;
        let layout = audio::layout(Format::Wav, data.shape(), usize::from(u16::MAX))?;
        let spec = |bits_per_sample, sample_format| WavSpec {
            channels: layout.channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format,
        };

        match data {
            ArrayData::Float32(arr) => {
                write_samples(spec(32, SampleFormat::Float), arr.iter().copied())
            }
            ArrayData::Float64(arr) => write_samples(
                spec(32, SampleFormat::Float),
                arr.iter().map(|&s| s as f32),
            ),
            ArrayData::Int16(arr) => write_samples(spec(16, SampleFormat::Int), arr.iter().copied()),
            ArrayData::Int32(arr) => write_samples(spec(32, SampleFormat::Int), arr.iter().copied()),
            other => Err(CodecError::UnsupportedDType {
                format: Format::Wav,
                dtype: other.dtype(),
            }),
        }
    }

    fn decode(&self, _name: &str, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let mut reader = WavReader::new(bytes).map_err(|e| CodecError::decode(Format::Wav, e))?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels);
        let data = match spec.sample_format {
            SampleFormat::Float => ArrayData::from(deinterleave(
                Format::Wav,
                read_samples::<f32>(&mut reader)?,
                channels,
            )?),
            SampleFormat::Int if spec.bits_per_sample <= 16 => ArrayData::from(deinterleave(
                Format::Wav,
                read_samples::<i16>(&mut reader)?,
                channels,
            )?),
            SampleFormat::Int => ArrayData::from(deinterleave(
                Format::Wav,
                read_samples::<i32>(&mut reader)?,
                channels,
            )?),
        };
        Ok(Decoded {
            data,
            samplerate: Some(spec.sample_rate),
        })
    }
}
