/*!
    Decoded frame types.
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use static_assertions::assert_impl_all;

use crate::format::{
    ChromaSiting, ColorMatrix, ColorPrimaries, ColorRange, PixelFormat, SampleFormat,
    TransferFunction,
};
use crate::rational::Rational;
use crate::timestamp::Pts;

/**
    Shared, immutable frame bytes backed by an arbitrary owner.

    The owner is typically a locked transform buffer; dropping the
    last clone releases it. The bytes must stay valid and unchanged
    for the owner's whole lifetime.
*/
#[derive(Clone)]
pub struct SharedBytes(Arc<dyn AsRef<[u8]> + Send + Sync>);

impl SharedBytes {
    pub fn new(owner: Arc<dyn AsRef<[u8]> + Send + Sync>) -> Self {
        Self(owner)
    }

    pub fn bytes(&self) -> &[u8] {
        (*self.0).as_ref()
    }
}

impl fmt::Debug for SharedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedBytes({} bytes)", self.bytes().len())
    }
}

/**
    Payload storage of a decoded video frame.

    `Owned` holds a private copy; `Shared` borrows the decoder's own
    buffer for as long as the frame (or a clone) is alive.
*/
#[derive(Clone, Debug)]
pub enum FrameData {
    Owned(Vec<u8>),
    Shared(SharedBytes),
}

impl FrameData {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Owned(data) => data,
            Self::Shared(shared) => shared.bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

/**
    Optional colorimetry of a decoded video stream.

    Transforms report these piecemeal; any subset may be present.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Colorimetry {
    pub matrix: Option<ColorMatrix>,
    pub primaries: Option<ColorPrimaries>,
    pub transfer: Option<TransferFunction>,
    pub chroma_siting: Option<ChromaSiting>,
    pub range: Option<ColorRange>,
}

/**
    A decoded video frame.

    `width`/`height` are the display dimensions after cropping;
    `coded_width`/`coded_height` describe the buffer geometry the
    payload is laid out with.
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub data: FrameData,
    pub width: u32,
    pub height: u32,
    pub coded_width: u32,
    pub coded_height: u32,
    pub format: PixelFormat,
    pub sample_aspect_ratio: Rational,
    pub color: Colorimetry,
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl VideoFrame {
    /**
        Returns the presentation time as a `Duration`, or zero if the
        frame has no timestamp.
    */
    pub fn presentation_time(&self) -> Duration {
        match self.pts {
            Some(pts) => pts.to_duration(self.time_base),
            None => Duration::ZERO,
        }
    }
}

/**
    A decoded audio frame with interleaved samples.
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    /// Number of sample positions (per channel).
    pub samples: usize,
    pub sample_rate: u32,
    pub channels: u32,
    /// Speaker position bitmask, when the transform reported one.
    pub channel_mask: Option<u32>,
    pub format: SampleFormat,
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl AudioFrame {
    /**
        Returns the playback duration covered by this frame.
    */
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples as f64 / f64::from(self.sample_rate))
    }

    /**
        Returns the presentation time as a `Duration`, or zero if the
        frame has no timestamp.
    */
    pub fn presentation_time(&self) -> Duration {
        match self.pts {
            Some(pts) => pts.to_duration(self.time_base),
            None => Duration::ZERO,
        }
    }

    /**
        Returns the byte length implied by the frame's properties.
    */
    pub fn expected_data_len(&self) -> usize {
        self.samples * self.channels as usize * self.format.bytes_per_sample()
    }
}

/**
    Either kind of decoded frame.
*/
#[derive(Clone, Debug)]
pub enum DecodedFrame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

// Frames cross thread boundaries between the decoder and the host.
assert_impl_all!(VideoFrame: Send, Sync);
assert_impl_all!(AudioFrame: Send, Sync);
assert_impl_all!(DecodedFrame: Send, Sync);
