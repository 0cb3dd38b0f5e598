/*!
    # Transform Decode

    A decoding session over external, asynchronous media transforms.

    A transform is an out-of-process-style decoder component: it
    negotiates media types as attribute bags, signals readiness
    through events, and exchanges data as timed samples. This crate
    adapts that protocol to a simple host model — push compressed
    packets in, receive decoded frames through a sink:

    - type negotiation with candidate scoring (audio and video);
    - an event pump turning edge-triggered readiness events into
      level state;
    - packet/sample and sample/frame translation, including
      bitstream reformatting for length-prefixed H.264/HEVC;
    - draining, flushing (seek support), and mid-stream output
      format changes;
    - optional zero-copy frame delivery backed by locked transform
      buffers and a shared hardware device binding.

    Implement [`Transform`] (and [`EventSource`] for asynchronous
    transforms) for the platform decoder, hand a [`TransformFactory`]
    and a [`FrameSink`] to [`DecoderSession::init`], then feed
    packets with [`DecoderSession::push_packet`].
*/

mod bsf;
mod config;
mod device;
mod events;
mod mapping;
mod negotiate;
mod sample;
mod score;
mod session;
mod transform;
mod translate;

pub use bsf::{BitstreamFilter, LengthPrefixedToStartCode};
pub use config::{CodecParams, DecoderConfig};
pub use device::{DeviceBinding, DeviceManager};
pub use events::ReadinessFlags;
pub use negotiate::{
    AudioStreamParams, StreamParams, VideoStreamParams, pack_display_aperture,
};
pub use sample::{MemoryBuffer, Sample, SampleBuffer};
pub use score::{audio_input_score, audio_output_score, video_input_score, video_output_score};
pub use session::{DecoderSession, FrameSink, TransformFactory};
pub use transform::{
    EventSource, InputStatus, InputStreamInfo, OutputStatus, OutputStreamInfo, Transform,
    TransformError, TransformEvent, TransformMessage, TypeCommit, TypeOffer,
};
pub use translate::{TRANSFORM_TIME_BASE, time_from_transform, time_to_transform};
