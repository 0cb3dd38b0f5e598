/*!
    Session configuration.
*/

use transform_types::{CodecId, Rational};

use crate::device::DeviceBinding;

/**
    Stream parameters of the encoded input, as reported by the
    container.

    Audio and video fields coexist; only the ones matching the codec
    kind are consulted. Zero means "unknown" for the numeric fields.
*/
#[derive(Clone, Debug)]
pub struct CodecParams {
    pub codec: CodecId,
    /// Container-level codec tag (FourCC), when present.
    pub codec_tag: Option<u32>,
    /// Codec configuration record / sequence headers.
    pub extradata: Vec<u8>,
    /// Time base of packet timestamps.
    pub time_base: Rational,

    // Audio
    pub sample_rate: u32,
    pub channels: u32,
    /// Preferred output channel count; 0 means use `channels`.
    pub requested_channels: u32,
    pub block_align: u32,
    pub bit_rate: u64,
    pub bits_per_coded_sample: u32,

    // Video
    pub width: u32,
    pub height: u32,
    pub sample_aspect_ratio: Option<Rational>,
}

impl CodecParams {
    /**
        Creates parameters for the given codec with everything else
        unknown.
    */
    pub fn new(codec: CodecId, time_base: Rational) -> Self {
        Self {
            codec,
            codec_tag: None,
            extradata: Vec::new(),
            time_base,
            sample_rate: 0,
            channels: 0,
            requested_channels: 0,
            block_align: 0,
            bit_rate: 0,
            bits_per_coded_sample: 0,
            width: 0,
            height: 0,
            sample_aspect_ratio: None,
        }
    }

    /**
        Returns the channel count output scoring should aim for.
    */
    pub fn target_channels(&self) -> u32 {
        if self.requested_channels > 0 {
            self.requested_channels
        } else {
            self.channels
        }
    }
}

/**
    Configuration for creating a decoder session.
*/
#[derive(Clone, Debug, Default)]
pub struct DecoderConfig {
    /// Demand a hardware-backed, asynchronous transform.
    pub require_hw: bool,
    /// Hand out frames that reference transform buffers instead of
    /// copying them.
    pub zero_copy: bool,
    /// Ask the transform to keep this many output samples in flight.
    pub min_output_samples: Option<u32>,
    /// Device to allocate hardware surfaces from.
    pub device: Option<DeviceBinding>,
}

impl DecoderConfig {
    /**
        Creates a default configuration: software decode, copied
        frames.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Enables hardware decoding with the given device.
    */
    pub fn with_hw_device(mut self, device: DeviceBinding) -> Self {
        self.require_hw = true;
        self.device = Some(device);
        self
    }

    /**
        Enables zero-copy frame delivery.
    */
    pub fn with_zero_copy(mut self) -> Self {
        self.zero_copy = true;
        self
    }

    /**
        Sets the minimum number of in-flight output samples.
    */
    pub fn with_min_output_samples(mut self, count: u32) -> Self {
        self.min_output_samples = Some(count);
        self
    }
}
