//! Shape rules shared by the audio codecs.
//!
//! A rank-1 array is mono. A rank-2 array is `(frames, channels)`, so the
//! row-major element order is already the interleaved sample order.

use ndarray::{Array, ArrayD, IxDyn};

use super::{CodecError, Format};

/// Frame and channel counts of an audio array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub frames: usize,
    pub channels: usize,
}

pub(crate) fn layout(
    format: Format,
    shape: &[usize],
    max_channels: usize,
) -> Result<Layout, CodecError> {
    let invalid = |reason| CodecError::InvalidShape {
        format,
        shape: shape.to_vec(),
        reason,
    };
    let layout = match *shape {
        [frames] => Layout {
            frames,
            channels: 1,
        },
        [frames, channels] => Layout { frames, channels },
        _ => return Err(invalid("audio must be 1-D or (frames, channels)")),
    };
    if layout.channels == 0 {
        return Err(invalid("audio needs at least one channel"));
    }
    if layout.channels > max_channels {
        return Err(invalid("too many channels"));
    }
    Ok(layout)
}

pub(crate) fn require_samplerate(
    format: Format,
    samplerate: Option<u32>,
) -> Result<u32, CodecError> {
    match samplerate {
        Some(rate) if rate > 0 => Ok(rate),
        Some(_) => Err(CodecError::encode(format, "sample rate must be positive")),
        None => Err(CodecError::encode(format, "missing sample rate")),
    }
}

/// Shape interleaved samples back into an audio array. Mono stays 1-D.
pub(crate) fn deinterleave<T>(
    format: Format,
    samples: Vec<T>,
    channels: usize,
) -> Result<ArrayD<T>, CodecError> {
    if channels == 1 {
        return Ok(Array::from_vec(samples).into_dyn());
    }
    if channels == 0 || samples.len() % channels != 0 {
        return Err(CodecError::decode(
            format,
            format!("{} samples do not fill {} channels", samples.len(), channels),
        ));
    }
    let frames = samples.len() / channels;
    ArrayD::from_shape_vec(IxDyn(&[frames, channels]), samples)
        .map_err(|e| CodecError::decode(format, e))
}

/// Split interleaved samples into one buffer per channel.
pub(crate) fn planar<T: Copy>(samples: &[T], channels: usize) -> Vec<Vec<T>> {
    (0..channels)
        .map(|c| samples.iter().skip(c).step_by(channels).copied().collect())
        .collect()
}
