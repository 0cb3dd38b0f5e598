/*!
    The transform abstraction.

    A transform is an external decoder component with its own threads
    and buffer pools, reached through a narrow object-safe trait. The
    adapter never sees vendor specifics; everything it needs is
    expressed as media-type bags, samples, and a handful of protocol
    status codes.
*/

use std::fmt;

use transform_types::{AttrKey, AttrValue, MediaType};

use crate::device::DeviceBinding;
use crate::sample::Sample;

/**
    An error reported by a transform or its platform layer.

    Carries the diagnostic string verbatim; the session converts it
    into the host error taxonomy at the adapter boundary.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransformError {}

impl From<TransformError> for transform_types::DecodeError {
    fn from(err: TransformError) -> Self {
        Self::External {
            message: err.message,
        }
    }
}

/**
    One entry of a transform's preference-ordered type enumeration.
*/
#[derive(Clone, Debug)]
pub enum TypeOffer {
    /// A candidate media type at the queried index.
    Type(MediaType),
    /// The enumeration is exhausted.
    NoMoreTypes,
    /// The other direction must be committed before this one can be
    /// enumerated.
    OtherDirectionFirst,
}

/**
    Result of committing a media type to one direction.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeCommit {
    Committed,
    /// The other direction must be committed first; retry on the next
    /// negotiation round.
    OtherDirectionFirst,
}

/**
    Result of submitting an input sample.

    `NotAccepting` hands the sample back so the caller can retry it
    after the transform makes room.
*/
#[derive(Debug)]
pub enum InputStatus {
    Accepted,
    NotAccepting(Sample),
}

/**
    Result of requesting an output sample.
*/
#[derive(Debug)]
pub enum OutputStatus {
    /// A decoded sample. When the stream provides its own samples the
    /// buffer is transform-owned; otherwise it is the one passed in.
    Sample(Sample),
    /// No output is ready; feed more input (or, while draining, the
    /// drain has completed).
    NeedMoreInput,
    /// The output format changed mid-stream; the output type must be
    /// renegotiated before any further output.
    StreamChanged,
}

/**
    Events emitted by an asynchronous transform.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformEvent {
    /// The transform can accept one more input sample.
    NeedInput,
    /// A decoded sample is ready to be collected.
    HaveOutput,
    /// A previously requested drain has completed.
    DrainComplete,
    /// A previously queued marker came back around.
    Marker,
}

/**
    Control messages delivered to a transform out of band.
*/
#[derive(Clone, Debug)]
pub enum TransformMessage {
    /// Allocate streaming resources.
    BeginStreaming,
    /// A new segment of samples begins.
    StartOfStream,
    /// No more input will arrive for the current segment.
    EndOfStream,
    /// Emit all pending output, then signal drain completion.
    Drain,
    /// Discard all pending input and output.
    Flush,
    /// Attach a hardware device for surface allocation.
    SetDeviceManager(DeviceBinding),
}

/**
    Declared properties of a transform input stream.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct InputStreamInfo {
    /// Minimum buffer size in bytes the transform wants per sample.
    pub min_size: usize,
    /// Required buffer alignment in bytes (0 means no requirement).
    pub alignment: usize,
}

/**
    Declared properties of a transform output stream.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputStreamInfo {
    /// Minimum buffer size in bytes for one decoded sample.
    pub min_size: usize,
    /// Required buffer alignment in bytes (0 means no requirement).
    pub alignment: usize,
    /// True if the transform allocates output samples itself; the
    /// adapter must not provide buffers to `process_output`.
    pub provides_samples: bool,
}

/**
    A source of readiness events from an asynchronous transform.

    `next_event` blocks until the transform produces an event.
*/
pub trait EventSource: Send {
    fn next_event(&mut self) -> Result<TransformEvent, TransformError>;

    /**
        Queues a marker; the transform echoes it back as
        [`TransformEvent::Marker`] once everything queued before it has
        been processed.
    */
    fn queue_marker(&mut self) -> Result<(), TransformError>;
}

/**
    An external media transform (decoder).

    All methods are called from the session's thread; the transform
    may do its work on internal threads and report readiness through
    its [`EventSource`].
*/
pub trait Transform: Send {
    /**
        Returns a snapshot of the transform-level attribute bag.
    */
    fn attributes(&mut self) -> Result<MediaType, TransformError>;

    /**
        Sets one transform-level attribute.
    */
    fn set_attribute(&mut self, key: AttrKey, value: AttrValue) -> Result<(), TransformError>;

    /**
        Takes the transform's event source, if it has been switched
        into asynchronous mode. `None` means the transform operates
        synchronously.
    */
    fn event_source(&mut self) -> Result<Option<Box<dyn EventSource>>, TransformError>;

    /**
        Returns the (input, output) stream identifiers, or `None` if
        the transform does not implement the query, which means a
        single stream pair with ids (0, 0).
    */
    fn stream_ids(&mut self) -> Result<Option<(u32, u32)>, TransformError>;

    /**
        Enumerates the input types the transform can accept, in
        preference order.
    */
    fn input_available_type(
        &mut self,
        stream: u32,
        index: u32,
    ) -> Result<TypeOffer, TransformError>;

    /**
        Enumerates the output types the transform can produce, in
        preference order.
    */
    fn output_available_type(
        &mut self,
        stream: u32,
        index: u32,
    ) -> Result<TypeOffer, TransformError>;

    fn set_input_type(
        &mut self,
        stream: u32,
        media_type: &MediaType,
    ) -> Result<TypeCommit, TransformError>;

    fn set_output_type(
        &mut self,
        stream: u32,
        media_type: &MediaType,
    ) -> Result<TypeCommit, TransformError>;

    /**
        Returns the currently committed output type.
    */
    fn output_current_type(&mut self, stream: u32) -> Result<MediaType, TransformError>;

    fn input_stream_info(&mut self, stream: u32) -> Result<InputStreamInfo, TransformError>;

    fn output_stream_info(&mut self, stream: u32) -> Result<OutputStreamInfo, TransformError>;

    fn process_input(
        &mut self,
        stream: u32,
        sample: Sample,
    ) -> Result<InputStatus, TransformError>;

    /**
        Requests one decoded sample. `provided` must be `Some` exactly
        when the output stream does not provide its own samples.
    */
    fn process_output(
        &mut self,
        stream: u32,
        provided: Option<Sample>,
    ) -> Result<OutputStatus, TransformError>;

    fn process_message(&mut self, message: TransformMessage) -> Result<(), TransformError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use transform_types::DecodeError;

    #[test]
    fn transform_error_converts_to_external() {
        let err = TransformError::new("device lost");
        assert_eq!(format!("{err}"), "device lost");

        let converted: DecodeError = err.into();
        assert_eq!(converted, DecodeError::external("device lost"));
    }
}
