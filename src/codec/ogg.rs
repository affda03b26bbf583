//! codec::ogg
//!
//! Ogg Vorbis payloads through `vorbis_rs`.
//!
//! Vorbis is lossy: decoded samples approximate the input. Float input is
//! encoded as is; `int16` input is scaled to `[-1, 1)` first. Decoding
//! always yields `float32`.

use std::num::{NonZeroU32, NonZeroU8};

use vorbis_rs::{VorbisDecoder, VorbisEncoderBuilder};

use super::audio::{self, deinterleave};
use super::{ArrayData, Codec, CodecError, Decoded, Format};

/// Frames handed to the encoder per call.
const BLOCK_FRAMES: usize = 4096;

/// The `.ogg` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct OggCodec;

impl Codec for OggCodec {
    fn format(&self) -> Format {
        Format::Ogg
    }

    fn encode(
        &self,
        _name: &str,
        data: &ArrayData,
        samplerate: Option<u32>,
    ) -> Result<Vec<u8>, CodecError> {
        let encode_err = |e: vorbis_rs::VorbisError| CodecError::encode(Format::Ogg, e);
        let rate = audio::require_samplerate(Format::Ogg, samplerate)?;
        let layout = audio::layout(Format::Ogg, data.shape(), usize::from(u8::MAX))?;

        let interleaved: Vec<f32> = match data {
            ArrayData::Float32(arr) => arr.iter().copied().collect(),
            ArrayData::Float64(arr) => arr.iter().map(|&s| s as f32).collect(),
            ArrayData::Int16(arr) => arr.iter().map(|&s| f32::from(s) / 32768.0).collect(),
            other => {
                return Err(CodecError::UnsupportedDType {
                    format: Format::Ogg,
                    dtype: other.dtype(),
                })
            }
        };
        let planar = audio::planar(&interleaved, layout.channels);

        let sampling_frequency = NonZeroU32::new(rate)
            .ok_or_else(|| CodecError::encode(Format::Ogg, "sample rate must be positive"))?;
        let channels = u8::try_from(layout.channels)
            .ok()
            .and_then(NonZeroU8::new)
            .ok_or_else(|| CodecError::encode(Format::Ogg, "unsupported channel count"))?;

        let mut encoder = VorbisEncoderBuilder::new(sampling_frequency, channels, Vec::new())
            .map_err(encode_err)?
            .build()
            .map_err(encode_err)?;
        let mut start = 0;
        while start < layout.frames {
            let end = (start + BLOCK_FRAMES).min(layout.frames);
            let block: Vec<&[f32]> = planar.iter().map(|ch| &ch[start..end]).collect();
            encoder.encode_audio_block(&block).map_err(encode_err)?;
            start = end;
        }
        encoder.finish().map_err(encode_err)
    }

    fn decode(&self, _name: &str, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let decode_err = |e: vorbis_rs::VorbisError| CodecError::decode(Format::Ogg, e);
        let mut decoder = VorbisDecoder::<&[u8]>::new(bytes).map_err(decode_err)?;
        let channels = usize::from(decoder.channels().get());
        let samplerate = decoder.sampling_frequency().get();

        let mut planar: Vec<Vec<f32>> = vec![Vec::new(); channels];
        while let Some(block) = decoder.decode_audio_block().map_err(decode_err)? {
            for (channel, samples) in planar.iter_mut().zip(block.samples()) {
                channel.extend_from_slice(samples);
            }
        }

        let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
        let mut interleaved = Vec::with_capacity(frames * channels);
        for frame in 0..frames {
            interleaved.extend(planar.iter().map(|ch| ch[frame]));
        }
        Ok(Decoded {
            data: ArrayData::from(deinterleave(Format::Ogg, interleaved, channels)?),
            samplerate: Some(samplerate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 44_100.0).sin() * 0.5)
            .collect()
    }

    #[test]
    fn mono_roundtrip_keeps_rate_and_length() {
        let data = ArrayData::from(sine(44_100));
        let bytes = OggCodec.encode("a", &data, Some(44_100)).unwrap();
        let decoded = OggCodec.decode("a", &bytes).unwrap();

        assert_eq!(decoded.samplerate, Some(44_100));
        assert_eq!(decoded.data.dtype(), super::super::DType::Float32);
        assert_eq!(decoded.data.ndim(), 1);
        assert!(decoded.data.len().abs_diff(44_100) <= BLOCK_FRAMES);
    }

    #[test]
    fn int64_is_unsupported() {
        let data = ArrayData::from(vec![0i64; 8]);
        assert!(matches!(
            OggCodec.encode("a", &data, Some(8000)),
            Err(CodecError::UnsupportedDType { .. })
        ));
    }
}
