/*!
    Media type negotiation with the transform.

    Negotiation is a bounded fixed-point search: each direction
    enumerates the transform's offers, scores them, adjusts the best
    one with stream parameters, and commits it. A direction may refuse
    until the other is committed, so the whole dance runs for at most
    two rounds before giving up.
*/

use tracing::{debug, error, trace};
use transform_types::{
    AttrKey, ChromaSiting, Colorimetry, ColorMatrix, ColorPrimaries, ColorRange, DecodeError,
    MediaType, PixelFormat, Rational, Result, SampleFormat, Tag, TransferFunction, tags,
};

use crate::config::CodecParams;
use crate::mapping::{pixel_format_from_subtype, sample_format_from_type};
use crate::score::{audio_input_score, audio_output_score, video_input_score, video_output_score};
use crate::transform::{Transform, TypeCommit, TypeOffer};

/// Mixed interlaced-or-progressive content; lets the transform sort
/// out interlacing per frame.
const INTERLACE_MIXED: u32 = 7;

// Numeric codes of the optional colorimetry attributes.
const YUV_MATRIX_BT709: u32 = 1;
const YUV_MATRIX_BT601: u32 = 2;
const YUV_MATRIX_SMPTE240M: u32 = 3;

const PRIMARIES_BT709: u32 = 2;
const PRIMARIES_BT470_SYS_M: u32 = 4;
const PRIMARIES_BT470_SYS_BG: u32 = 5;
const PRIMARIES_SMPTE170M: u32 = 6;
const PRIMARIES_SMPTE240M: u32 = 7;

const TRANSFER_LINEAR: u32 = 1;
const TRANSFER_GAMMA22: u32 = 4;
const TRANSFER_BT709: u32 = 5;
const TRANSFER_SMPTE240M: u32 = 6;
const TRANSFER_SRGB: u32 = 7;
const TRANSFER_GAMMA28: u32 = 8;

const CHROMA_SITING_MPEG1: u32 = 1;
const CHROMA_SITING_MPEG2: u32 = 5;

const RANGE_FULL: u32 = 1;
const RANGE_LIMITED: u32 = 2;

/**
    Negotiated output properties of an audio stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioStreamParams {
    pub sample_rate: u32,
    pub channels: u32,
    pub channel_mask: Option<u32>,
    pub format: SampleFormat,
}

/**
    Negotiated output properties of a video stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoStreamParams {
    pub width: u32,
    pub height: u32,
    pub coded_width: u32,
    pub coded_height: u32,
    pub format: PixelFormat,
    pub sample_aspect_ratio: Rational,
    pub color: Colorimetry,
}

/**
    Negotiated output properties of either stream kind.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamParams {
    Audio(AudioStreamParams),
    Video(VideoStreamParams),
}

/**
    Packs a display aperture (crop rectangle) into the blob layout of
    the aperture attribute: four little-endian `u32` values, offset x,
    offset y, width, height.
*/
pub fn pack_display_aperture(x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
    let mut blob = Vec::with_capacity(16);
    for v in [x, y, width, height] {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

fn parse_display_aperture(blob: &[u8]) -> Option<(u32, u32, u32, u32)> {
    if blob.len() != 16 {
        return None;
    }
    let mut values = [0u32; 4];
    for (i, v) in values.iter_mut().enumerate() {
        *v = u32::from_le_bytes([
            blob[i * 4],
            blob[i * 4 + 1],
            blob[i * 4 + 2],
            blob[i * 4 + 3],
        ]);
    }
    Some((values[0], values[1], values[2], values[3]))
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read(&mut self, bits: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..bits {
            let byte = *self.data.get(self.pos / 8)?;
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.pos += 1;
        }
        Some(value)
    }
}

const AAC_SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];
const AAC_CHANNELS: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 8];

/**
    Extracts sample rate and channel count from an embedded AAC audio
    configuration, when parseable. The embedded values override the
    container's, which are wrong often enough to matter.
*/
fn parse_aac_audio_config(extradata: &[u8]) -> Option<(u32, u32)> {
    let mut reader = BitReader::new(extradata);
    let object_type = reader.read(5)?;
    if object_type == 31 {
        reader.read(6)?;
    }
    let freq_index = reader.read(4)? as usize;
    let sample_rate = if freq_index == 15 {
        reader.read(24)?
    } else {
        *AAC_SAMPLE_RATES.get(freq_index)?
    };
    let channel_config = reader.read(4)? as usize;
    let channels = *AAC_CHANNELS.get(channel_config)?;
    if sample_rate == 0 || channels == 0 {
        return None;
    }
    Some((sample_rate, channels))
}

/**
    Runs type negotiation for one transform stream pair.
*/
pub(crate) struct Negotiator<'a> {
    pub transform: &'a mut dyn Transform,
    pub params: &'a CodecParams,
    pub registered_subtype: Tag,
    pub in_stream: u32,
    pub out_stream: u32,
    /// Extradata is withheld from the input type when a bitstream
    /// filter re-inserts the parameter sets in band.
    pub bsf_active: bool,
}

impl Negotiator<'_> {
    /**
        Negotiates input and output types, in at most two rounds.
    */
    pub fn negotiate(&mut self) -> Result<()> {
        let mut input_done = false;
        let mut output_done = false;

        for round in 0..2 {
            trace!(round, input_done, output_done, "negotiation round");
            if !input_done {
                input_done = self.choose_input_type()?;
            }
            if !output_done {
                output_done = self.choose_output_type()?;
            }
            if input_done && output_done {
                return Ok(());
            }
        }

        error!(
            input_done,
            output_done, "could not negotiate transform media types"
        );
        Err(DecodeError::NegotiationFailed)
    }

    /**
        Selects and commits an input type. Returns false if the
        transform wants the output committed first.
    */
    pub fn choose_input_type(&mut self) -> Result<bool> {
        let mut best: Option<MediaType> = None;
        let mut best_score = -1i64;

        let mut index = 0;
        loop {
            match self.transform.input_available_type(self.in_stream, index)? {
                TypeOffer::NoMoreTypes => break,
                TypeOffer::OtherDirectionFirst => {
                    debug!("input type enumeration wants the output type set first");
                    return Ok(false);
                }
                TypeOffer::Type(candidate) => {
                    let score = if self.params.codec.is_audio() {
                        audio_input_score(&candidate, self.registered_subtype)
                    } else {
                        video_input_score(
                            &candidate,
                            self.registered_subtype,
                            self.params.codec_tag,
                        )
                    };
                    trace!(index, score, candidate = %candidate, "input type candidate");
                    if score > best_score {
                        best_score = score;
                        best = Some(candidate);
                    }
                    index += 1;
                }
            }
        }

        // Some transforms do not enumerate input at all; start from an
        // empty bag and let adjustment fill in the essentials.
        let mut media_type = best.unwrap_or_default();
        if self.params.codec.is_audio() {
            self.adjust_audio_input(&mut media_type);
        } else {
            self.adjust_video_input(&mut media_type);
        }
        debug!(input = %media_type, "committing input type");

        match self.transform.set_input_type(self.in_stream, &media_type)? {
            TypeCommit::Committed => Ok(true),
            TypeCommit::OtherDirectionFirst => {
                debug!("input type commit wants the output type set first");
                Ok(false)
            }
        }
    }

    /**
        Selects and commits an output type. Returns false if the
        transform wants the input committed first.
    */
    pub fn choose_output_type(&mut self) -> Result<bool> {
        let mut best: Option<MediaType> = None;
        let mut best_score = -1i64;

        let mut index = 0;
        loop {
            match self.transform.output_available_type(self.out_stream, index)? {
                TypeOffer::NoMoreTypes => break,
                TypeOffer::OtherDirectionFirst => {
                    debug!("output type enumeration wants the input type set first");
                    return Ok(false);
                }
                TypeOffer::Type(candidate) => {
                    let score = if self.params.codec.is_audio() {
                        audio_output_score(&candidate, self.params.target_channels())
                    } else {
                        video_output_score(&candidate, self.params.codec)
                    };
                    trace!(index, score, candidate = %candidate, "output type candidate");
                    if score > best_score {
                        best_score = score;
                        best = Some(candidate);
                    }
                    index += 1;
                }
            }
        }

        let mut media_type = best.unwrap_or_default();
        if self.params.codec.is_audio() {
            self.adjust_audio_output(&mut media_type);
        }
        debug!(output = %media_type, "committing output type");

        match self.transform.set_output_type(self.out_stream, &media_type)? {
            TypeCommit::Committed => Ok(true),
            TypeCommit::OtherDirectionFirst => {
                debug!("output type commit wants the input type set first");
                Ok(false)
            }
        }
    }

    fn adjust_audio_input(&self, media_type: &mut MediaType) {
        media_type.set_tag(AttrKey::MajorType, tags::MAJOR_AUDIO);
        media_type.set_tag(AttrKey::Subtype, self.registered_subtype);

        let mut sample_rate = self.params.sample_rate;
        let mut channels = self.params.channels;

        if self.params.codec == transform_types::CodecId::Aac {
            // 12-byte payload header, then the raw audio configuration.
            // Without extradata the stream is ADTS framed, flagged in
            // the header's first byte.
            let mut user_data = vec![0u8; 12];
            if self.params.extradata.is_empty() {
                user_data[0] = 1;
                media_type.set_u32(AttrKey::AacPayloadType, 1);
            } else {
                user_data.extend_from_slice(&self.params.extradata);
                if let Some((rate, ch)) = parse_aac_audio_config(&self.params.extradata) {
                    trace!(rate, channels = ch, "using embedded audio configuration");
                    sample_rate = rate;
                    channels = ch;
                }
            }
            media_type.set_blob(AttrKey::UserData, user_data);
        }

        media_type.set_u32(AttrKey::SampleRate, sample_rate);
        media_type.set_u32(AttrKey::ChannelCount, channels);
        if self.params.block_align > 0 {
            media_type.set_u32(AttrKey::BlockAlignment, self.params.block_align);
        }
        if self.params.bit_rate > 0 {
            media_type.set_u32(AttrKey::AvgBytesPerSecond, (self.params.bit_rate / 8) as u32);
        }
        if self.params.bits_per_coded_sample > 0 {
            media_type.set_u32(AttrKey::BitsPerSample, self.params.bits_per_coded_sample);
        }
        media_type.set_u32(AttrKey::PreferWaveFormat, 1);
    }

    fn adjust_video_input(&self, media_type: &mut MediaType) {
        media_type.set_tag(AttrKey::MajorType, tags::MAJOR_VIDEO);
        if media_type.subtype().is_none() {
            media_type.set_tag(AttrKey::Subtype, self.registered_subtype);
        }

        media_type.set_pair(AttrKey::FrameSize, self.params.width, self.params.height);
        media_type.set_u32(AttrKey::InterlaceMode, INTERLACE_MIXED);

        if let Some(sar) = self.params.sample_aspect_ratio {
            if sar.num > 0 && sar.den > 0 {
                media_type.set_pair(AttrKey::PixelAspectRatio, sar.num as u32, sar.den as u32);
            }
        }
        if self.params.bit_rate > 0 {
            media_type.set_u32(AttrKey::AvgBitrate, self.params.bit_rate as u32);
        }

        if !self.params.extradata.is_empty() && !self.bsf_active {
            let mpeg4_family = matches!(
                media_type.subtype(),
                Some(tags::VIDEO_MP4V | tags::VIDEO_MP43 | tags::VIDEO_MP42)
            );
            if mpeg4_family && !self.params.extradata.starts_with(&[0, 0, 1]) {
                debug!("dropping sequence headers without start codes");
            } else {
                media_type.set_blob(AttrKey::UserData, self.params.extradata.clone());
            }
        }
    }

    /// Some audio decoders enumerate no output types at all. Only in
    /// that case, propose float output built from the input stream.
    fn adjust_audio_output(&self, media_type: &mut MediaType) {
        if media_type.major_type().is_some() {
            return;
        }

        let block_align = self.params.channels * 4;
        media_type.set_tag(AttrKey::MajorType, tags::MAJOR_AUDIO);
        media_type.set_tag(AttrKey::Subtype, tags::AUDIO_FLOAT);
        media_type.set_u32(AttrKey::BitsPerSample, 32);
        media_type.set_u32(AttrKey::SampleRate, self.params.sample_rate);
        media_type.set_u32(AttrKey::ChannelCount, self.params.channels);
        media_type.set_u32(AttrKey::BlockAlignment, block_align);
        media_type.set_u32(AttrKey::AvgBytesPerSecond, self.params.sample_rate * block_align);
    }
}

/**
    Reads the committed output type back into host stream parameters.

    Fails with `External` when required attributes are missing or map
    onto nothing the host supports.
*/
pub(crate) fn read_output_params(
    transform: &mut dyn Transform,
    out_stream: u32,
    params: &CodecParams,
) -> Result<StreamParams> {
    let media_type = transform.output_current_type(out_stream)?;
    debug!(output = %media_type, "reading committed output type");

    if params.codec.is_audio() {
        read_audio_params(&media_type).map(StreamParams::Audio)
    } else {
        read_video_params(&media_type).map(StreamParams::Video)
    }
}

fn read_audio_params(media_type: &MediaType) -> Result<AudioStreamParams> {
    let channels = media_type
        .get_u32(AttrKey::ChannelCount)
        .filter(|c| *c > 0)
        .ok_or_else(|| DecodeError::external("output type reports no channels"))?;
    let sample_rate = media_type
        .get_u32(AttrKey::SampleRate)
        .filter(|r| *r > 0)
        .ok_or_else(|| DecodeError::external("output type reports no sample rate"))?;
    let format = sample_format_from_type(media_type)
        .ok_or_else(|| DecodeError::external("output type has an unsupported sample format"))?;

    Ok(AudioStreamParams {
        sample_rate,
        channels,
        channel_mask: media_type.get_u32(AttrKey::ChannelMask),
        format,
    })
}

fn read_video_params(media_type: &MediaType) -> Result<VideoStreamParams> {
    let subtype = media_type
        .subtype()
        .ok_or_else(|| DecodeError::external("output type has no subtype"))?;
    let format = pixel_format_from_subtype(subtype)
        .ok_or_else(|| DecodeError::external("output type has an unsupported pixel format"))?;
    let (coded_width, coded_height) = media_type
        .get_pair(AttrKey::FrameSize)
        .ok_or_else(|| DecodeError::external("output type has no frame size"))?;

    let mut width = coded_width;
    let mut height = coded_height;
    if let Some(blob) = media_type.get_blob(AttrKey::DisplayAperture) {
        if let Some((x, y, cx, cy)) = parse_display_aperture(blob) {
            let w = x + cx;
            let h = y + cy;
            if w > coded_width || h > coded_height {
                return Err(DecodeError::external(
                    "display aperture exceeds the coded frame size",
                ));
            }
            width = w;
            height = h;
        }
    }

    let sample_aspect_ratio = match media_type.get_pair(AttrKey::PixelAspectRatio) {
        Some((num, den)) if num > 0 && den > 0 => Rational::new(num as i32, den as i32),
        Some(_) => Rational::new(1, 1),
        None => return Err(DecodeError::external("output type has no pixel aspect ratio")),
    };

    let color = Colorimetry {
        matrix: media_type
            .get_u32(AttrKey::YuvMatrix)
            .and_then(|v| match v {
                YUV_MATRIX_BT709 => Some(ColorMatrix::Bt709),
                YUV_MATRIX_BT601 => Some(ColorMatrix::Bt470bg),
                YUV_MATRIX_SMPTE240M => Some(ColorMatrix::Smpte240m),
                _ => None,
            }),
        primaries: media_type
            .get_u32(AttrKey::ColorPrimaries)
            .and_then(|v| match v {
                PRIMARIES_BT709 => Some(ColorPrimaries::Bt709),
                PRIMARIES_BT470_SYS_M => Some(ColorPrimaries::Bt470m),
                PRIMARIES_BT470_SYS_BG => Some(ColorPrimaries::Bt470bg),
                PRIMARIES_SMPTE170M => Some(ColorPrimaries::Smpte170m),
                PRIMARIES_SMPTE240M => Some(ColorPrimaries::Smpte240m),
                _ => None,
            }),
        transfer: media_type
            .get_u32(AttrKey::TransferFunction)
            .and_then(|v| match v {
                TRANSFER_LINEAR => Some(TransferFunction::Linear),
                TRANSFER_GAMMA22 => Some(TransferFunction::Gamma22),
                TRANSFER_GAMMA28 => Some(TransferFunction::Gamma28),
                TRANSFER_BT709 => Some(TransferFunction::Bt709),
                TRANSFER_SMPTE240M => Some(TransferFunction::Smpte240m),
                TRANSFER_SRGB => Some(TransferFunction::Srgb),
                _ => None,
            }),
        chroma_siting: media_type
            .get_u32(AttrKey::ChromaSiting)
            .and_then(|v| match v {
                CHROMA_SITING_MPEG1 => Some(ChromaSiting::Center),
                CHROMA_SITING_MPEG2 => Some(ChromaSiting::Left),
                _ => None,
            }),
        range: media_type.get_u32(AttrKey::NominalRange).and_then(|v| match v {
            RANGE_FULL => Some(ColorRange::Full),
            RANGE_LIMITED => Some(ColorRange::Limited),
            _ => None,
        }),
    };

    Ok(VideoStreamParams {
        width,
        height,
        coded_width,
        coded_height,
        format,
        sample_aspect_ratio,
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aperture_round_trip() {
        let blob = pack_display_aperture(0, 0, 1920, 1080);
        assert_eq!(parse_display_aperture(&blob), Some((0, 0, 1920, 1080)));
        assert_eq!(parse_display_aperture(&blob[..12]), None);
    }

    #[test]
    fn aac_config_parsing() {
        // AAC-LC (2), 44.1 kHz (index 4), stereo (2):
        // 00010 0100 0010 ... -> 0x12 0x10
        assert_eq!(parse_aac_audio_config(&[0x12, 0x10]), Some((44100, 2)));
        // 48 kHz (index 3), 6 channels: 00010 0011 0110 -> 0x11 0xB0
        assert_eq!(parse_aac_audio_config(&[0x11, 0xB0]), Some((48000, 6)));
        // truncated
        assert_eq!(parse_aac_audio_config(&[0x12]), None);
        // reserved channel configuration (15 has no table entry)
        assert_eq!(parse_aac_audio_config(&[0x12, 0x1F]), None);
    }

    #[test]
    fn audio_params_require_essentials() {
        let mut ty = MediaType::new();
        ty.set_tag(AttrKey::Subtype, tags::AUDIO_PCM);
        ty.set_u32(AttrKey::BitsPerSample, 16);
        ty.set_u32(AttrKey::SampleRate, 48000);
        assert!(read_audio_params(&ty).is_err()); // no channels

        ty.set_u32(AttrKey::ChannelCount, 2);
        let params = read_audio_params(&ty).unwrap();
        assert_eq!(params.sample_rate, 48000);
        assert_eq!(params.channels, 2);
        assert_eq!(params.channel_mask, None);
        assert_eq!(params.format, SampleFormat::S16);

        ty.set_u32(AttrKey::ChannelMask, 0x3);
        assert_eq!(read_audio_params(&ty).unwrap().channel_mask, Some(0x3));
    }

    #[test]
    fn video_params_with_aperture_and_color() {
        let mut ty = MediaType::new();
        ty.set_tag(AttrKey::MajorType, tags::MAJOR_VIDEO);
        ty.set_tag(AttrKey::Subtype, tags::VIDEO_NV12);
        ty.set_pair(AttrKey::FrameSize, 1920, 1088);
        ty.set_pair(AttrKey::PixelAspectRatio, 1, 1);
        ty.set_blob(AttrKey::DisplayAperture, pack_display_aperture(0, 0, 1920, 1080));
        ty.set_u32(AttrKey::YuvMatrix, YUV_MATRIX_BT709);
        ty.set_u32(AttrKey::NominalRange, RANGE_LIMITED);

        let params = read_video_params(&ty).unwrap();
        assert_eq!(params.format, PixelFormat::Nv12);
        assert_eq!((params.coded_width, params.coded_height), (1920, 1088));
        assert_eq!((params.width, params.height), (1920, 1080));
        assert_eq!(params.sample_aspect_ratio, Rational::new(1, 1));
        assert_eq!(params.color.matrix, Some(ColorMatrix::Bt709));
        assert_eq!(params.color.range, Some(ColorRange::Limited));
        assert_eq!(params.color.primaries, None);
    }

    #[test]
    fn video_params_reject_oversized_aperture() {
        let mut ty = MediaType::new();
        ty.set_tag(AttrKey::Subtype, tags::VIDEO_NV12);
        ty.set_pair(AttrKey::FrameSize, 640, 480);
        ty.set_pair(AttrKey::PixelAspectRatio, 1, 1);
        ty.set_blob(AttrKey::DisplayAperture, pack_display_aperture(16, 0, 640, 480));
        assert!(read_video_params(&ty).is_err());
    }

    #[test]
    fn video_params_require_aspect_ratio() {
        let mut ty = MediaType::new();
        ty.set_tag(AttrKey::Subtype, tags::VIDEO_NV12);
        ty.set_pair(AttrKey::FrameSize, 640, 480);
        assert!(read_video_params(&ty).is_err());

        // a degenerate ratio falls back to square pixels
        ty.set_pair(AttrKey::PixelAspectRatio, 0, 0);
        let params = read_video_params(&ty).unwrap();
        assert_eq!(params.sample_aspect_ratio, Rational::new(1, 1));
    }
}
