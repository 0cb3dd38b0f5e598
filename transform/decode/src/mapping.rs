/*!
    Static tables between host formats and transform tags.
*/

use transform_types::{AttrKey, CodecId, MediaType, PixelFormat, SampleFormat, Tag, tags};

/**
    Returns the transform subtype registered for a codec, or `None`
    if no decoder transform exists for it.
*/
pub fn subtype_for_codec(codec: CodecId) -> Option<Tag> {
    match codec {
        CodecId::H264 => Some(tags::VIDEO_H264),
        CodecId::Hevc => Some(tags::VIDEO_HEVC),
        CodecId::Mpeg4 => Some(tags::VIDEO_MP4V),
        // MS-MPEG4v2 decodes through the MP42 transform
        CodecId::Msmpeg4v2 => Some(tags::VIDEO_MP42),
        CodecId::Aac => Some(tags::AUDIO_AAC),
        CodecId::Ac3 => Some(tags::AUDIO_AC3),
        CodecId::Mp3 => Some(tags::AUDIO_MP3),
        _ => None,
    }
}

/**
    Maps an uncompressed video subtype onto a host pixel format.
*/
pub fn pixel_format_from_subtype(subtype: Tag) -> Option<PixelFormat> {
    match subtype {
        tags::VIDEO_NV12 => Some(PixelFormat::Nv12),
        tags::VIDEO_P010 | tags::VIDEO_P016 => Some(PixelFormat::P010),
        tags::VIDEO_YUY2 => Some(PixelFormat::Yuyv422),
        tags::VIDEO_I420 | tags::VIDEO_IYUV => Some(PixelFormat::Yuv420p),
        _ => None,
    }
}

/**
    Derives the host sample format from an audio media type's subtype
    and bit depth.
*/
pub fn sample_format_from_type(media_type: &MediaType) -> Option<SampleFormat> {
    let bits = media_type.get_u32(AttrKey::BitsPerSample)?;
    match media_type.subtype()? {
        tags::AUDIO_PCM => match bits {
            8 => Some(SampleFormat::U8),
            16 => Some(SampleFormat::S16),
            32 => Some(SampleFormat::S32),
            _ => None,
        },
        tags::AUDIO_FLOAT => match bits {
            32 => Some(SampleFormat::F32),
            64 => Some(SampleFormat::F64),
            _ => None,
        },
        _ => None,
    }
}
