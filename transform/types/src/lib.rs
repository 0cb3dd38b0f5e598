/*!
    # Transform Types

    Shared types for the transform decoder crates.

    This crate provides the vocabulary used across the decoding
    pipeline: attribute bags and format tags for type negotiation,
    encoded packets, decoded frames, pixel and sample formats, codec
    identifiers, rational time bases, timestamps, and the common
    error type.

    It carries no decoding logic of its own.
*/

mod attr;
mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod timestamp;

pub use attr::{AttrKey, AttrValue, MediaType, Tag, tags};
pub use codec::CodecId;
pub use error::{DecodeError, Result};
pub use format::{
    ChromaSiting, ColorMatrix, ColorPrimaries, ColorRange, PixelFormat, SampleFormat,
    TransferFunction,
};
pub use frame::{AudioFrame, Colorimetry, DecodedFrame, FrameData, SharedBytes, VideoFrame};
pub use packet::Packet;
pub use rational::{Rational, rescale};
pub use timestamp::{MediaDuration, Pts};
