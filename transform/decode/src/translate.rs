/*!
    Translation between host packets/frames and transform samples.
*/

use tracing::warn;
use transform_types::{
    AudioFrame, DecodeError, FrameData, Packet, Pts, Rational, Result, VideoFrame, rescale,
};

use crate::bsf::BitstreamFilter;
use crate::device::DeviceBinding;
use crate::negotiate::{AudioStreamParams, VideoStreamParams};
use crate::sample::Sample;
use crate::transform::InputStreamInfo;

/// Time base all transform sample timestamps are expressed in
/// (100 nanosecond ticks).
pub const TRANSFORM_TIME_BASE: Rational = Rational::new(1, 10_000_000);

/**
    Rescales a host timestamp into transform ticks. `None` stays
    `None` (the transform-side "no timestamp" sentinel is the
    trait implementations' concern).
*/
pub fn time_to_transform(pts: Option<Pts>, time_base: Rational) -> Option<i64> {
    pts.map(|pts| rescale(pts.0, time_base, TRANSFORM_TIME_BASE))
}

/**
    Rescales a transform tick count into a host timestamp.
*/
pub fn time_from_transform(time: Option<i64>, time_base: Rational) -> Option<Pts> {
    time.map(|t| Pts(rescale(t, TRANSFORM_TIME_BASE, time_base)))
}

/**
    Converts one encoded packet into an input sample, routing it
    through the bitstream filter when one is installed.

    A filter emitting more than one packet breaks the 1:1
    packet/sample pairing this adapter is built around; the extra
    packets are logged and discarded.
*/
pub(crate) fn packet_to_sample(
    packet: &Packet,
    bsf: Option<&mut (dyn BitstreamFilter + 'static)>,
    info: &InputStreamInfo,
) -> Result<Sample> {
    let filtered;
    let packet = match bsf {
        Some(filter) => {
            filter.send(packet)?;
            filtered = filter
                .receive()?
                .ok_or_else(|| DecodeError::external("bitstream filter produced no packet"))?;

            let mut discarded = 0usize;
            while filter.receive()?.is_some() {
                discarded += 1;
            }
            if discarded > 0 {
                warn!(discarded, "discarding extra packets from bitstream filter");
            }
            &filtered
        }
        None => packet,
    };

    let mut sample = Sample::memory(Some(&packet.data), packet.data.len(), info.alignment)?;
    sample.set_time(time_to_transform(packet.effective_pts(), packet.time_base));
    if packet.is_keyframe {
        sample.set_keyframe(true);
    }
    Ok(sample)
}

/**
    Converts a decoded audio sample into a host frame, copying the
    payload out of the transform buffer.
*/
pub(crate) fn sample_to_audio_frame(
    mut sample: Sample,
    params: &AudioStreamParams,
    time_base: Rational,
) -> Result<AudioFrame> {
    let len = sample.len();
    let position_size = params.format.bytes_per_sample() * params.channels as usize;
    if position_size == 0 || len % position_size != 0 {
        return Err(DecodeError::external(
            "audio sample size is not a multiple of the sample position size",
        ));
    }
    let samples = len / position_size;
    let pts = time_from_transform(sample.time(), time_base);

    let data = {
        let slice = sample.lock()?;
        slice[..len].to_vec()
    };
    sample.unlock();

    Ok(AudioFrame {
        data,
        samples,
        sample_rate: params.sample_rate,
        channels: params.channels,
        channel_mask: params.channel_mask,
        format: params.format,
        pts,
        time_base,
    })
}

/**
    Converts a decoded video sample into a host frame.

    Copy mode crops each plane from the coded geometry into a private
    buffer laid out at display size and releases the sample. Zero-copy
    mode keeps the buffer locked behind the frame's shared payload
    instead, holding the device binding alongside.
*/
pub(crate) fn sample_to_video_frame(
    mut sample: Sample,
    params: &VideoStreamParams,
    time_base: Rational,
    zero_copy: bool,
    device: Option<DeviceBinding>,
) -> Result<VideoFrame> {
    let format = params.format;
    let coded_size = format.buffer_size(params.coded_width, params.coded_height);
    if sample.len() < coded_size {
        return Err(DecodeError::external(
            "video sample is smaller than the coded frame",
        ));
    }
    let pts = time_from_transform(sample.time(), time_base);

    let (data, coded_width, coded_height) = if zero_copy {
        let bytes = sample.into_shared_bytes(device)?;
        (
            FrameData::Shared(bytes),
            params.coded_width,
            params.coded_height,
        )
    } else {
        let mut out = vec![0u8; format.buffer_size(params.width, params.height)];
        {
            let src = sample.lock()?;
            for plane in 0..format.plane_count() {
                let src_offset = format.plane_offset(plane, params.coded_width, params.coded_height);
                let dst_offset = format.plane_offset(plane, params.width, params.height);
                let src_stride = format.row_bytes(plane, params.coded_width);
                let dst_stride = format.row_bytes(plane, params.width);
                for row in 0..format.plane_rows(plane, params.height) {
                    let src_row = src_offset + row * src_stride;
                    let dst_row = dst_offset + row * dst_stride;
                    out[dst_row..dst_row + dst_stride]
                        .copy_from_slice(&src[src_row..src_row + dst_stride]);
                }
            }
        }
        sample.unlock();
        // the private copy is laid out at display size
        (FrameData::Owned(out), params.width, params.height)
    };

    Ok(VideoFrame {
        data,
        width: params.width,
        height: params.height,
        coded_width,
        coded_height,
        format,
        sample_aspect_ratio: params.sample_aspect_ratio,
        color: params.color,
        pts,
        time_base,
    })
}
