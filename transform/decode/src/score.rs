/*!
    Candidate scoring for type negotiation.

    Pure functions ranking a transform's offered media types; the
    negotiator keeps the highest-scoring candidate and rejects
    anything scoring below zero.
*/

use transform_types::{AttrKey, CodecId, MediaType, Tag, tags};

use crate::mapping::{pixel_format_from_subtype, sample_format_from_type};

/**
    Scores an offered audio output type.

    Higher sample rates win; channel counts closest to (preferring at
    or above) `requested_channels` win; wider samples win; floating
    point beats integers of the same width. A candidate whose format
    cannot be represented on the host is disqualified with -1.

    The components pack into disjoint bit ranges of one value:
    sample rate in bits 0..20, channel closeness in 20..28, sample
    width in 28..32, floating point flag in bit 32.
*/
pub fn audio_output_score(media_type: &MediaType, requested_channels: u32) -> i64 {
    let mut score: i64 = 0;

    if let Some(rate) = media_type.get_u32(AttrKey::SampleRate) {
        score |= i64::from(rate);
    }

    if let Some(channels) = media_type.get_u32(AttrKey::ChannelCount) {
        let diff = i64::from(channels) - i64::from(requested_channels);
        let closeness = if diff >= 0 {
            // at least as many channels as requested; fewer extra is better
            (1 << 7) - diff
        } else {
            // too few channels; the closer the better, but always worse
            // than any at-or-above candidate
            (1 << 6) + diff
        };
        score |= closeness << 20;
    }

    match sample_format_from_type(media_type) {
        Some(format) => {
            score |= (format.bytes_per_sample() as i64) << 28;
            if format.is_float() {
                score |= 1 << 32;
            }
        }
        None => return -1,
    }

    score
}

/**
    Scores an offered video output type by layout family:
    packed > planar full range > planar limited range > 10-bit
    biplanar > 8-bit biplanar. For the H.264 family the 8-bit
    biplanar layout instead ranks above everything, matching the
    native output of its hardware paths. Subtypes with no host pixel
    format are disqualified with -1.
*/
pub fn video_output_score(media_type: &MediaType, codec: CodecId) -> i64 {
    let Some(subtype) = media_type.subtype() else {
        return -1;
    };
    if pixel_format_from_subtype(subtype).is_none() {
        return -1;
    }

    if codec == CodecId::H264 && subtype == tags::VIDEO_NV12 {
        return 6;
    }

    match subtype {
        tags::VIDEO_YUY2 => 5,
        tags::VIDEO_I420 => 4,
        tags::VIDEO_IYUV => 3,
        tags::VIDEO_P010 | tags::VIDEO_P016 => 2,
        tags::VIDEO_NV12 => 1,
        _ => -1,
    }
}

/**
    Scores an offered audio input type: the registered subtype for
    the codec is the only acceptable candidate.
*/
pub fn audio_input_score(media_type: &MediaType, registered_subtype: Tag) -> i64 {
    match media_type.subtype() {
        Some(subtype) if subtype == registered_subtype => 1,
        _ => -1,
    }
}

/**
    Scores an offered video input type. The registered subtype for
    the codec scores 1; a FourCC subtype matching the container's
    codec tag scores 2 and wins, which selects the right variant for
    families distinguished by codec tag.
*/
pub fn video_input_score(
    media_type: &MediaType,
    registered_subtype: Tag,
    codec_tag: Option<u32>,
) -> i64 {
    let Some(subtype) = media_type.subtype() else {
        return -1;
    };
    if let (Some(code), Some(tag)) = (subtype.as_fourcc(), codec_tag) {
        if code == tag {
            return 2;
        }
    }
    if subtype == registered_subtype {
        return 1;
    }
    -1
}
