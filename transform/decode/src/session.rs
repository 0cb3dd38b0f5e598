/*!
    The decoding session.

    [`DecoderSession`] bridges the host's push/pull packet model to a
    transform's event-driven protocol: packets become timed input
    samples, readiness events gate every call, and decoded samples
    come back out as frames through a host-provided sink.
*/

use std::fmt;

use tracing::{debug, error, warn};
use transform_types::{
    AttrKey, AttrValue, CodecId, DecodedFrame, DecodeError, Packet, Pts, Rational, Result, Tag,
    rescale,
};

use crate::bsf::{BitstreamFilter, LengthPrefixedToStartCode};
use crate::config::{CodecParams, DecoderConfig};
use crate::device::{DeviceBinding, unlock_async};
use crate::events::{self, ReadinessFlags};
use crate::mapping::subtype_for_codec;
use crate::negotiate::{Negotiator, StreamParams, read_output_params};
use crate::sample::Sample;
use crate::transform::{
    EventSource, InputStatus, InputStreamInfo, OutputStatus, OutputStreamInfo, Transform,
    TransformError, TransformMessage,
};
use crate::translate;

/**
    Receiver of decoded frames.

    `None` marks the end of the stream: the final frame has been
    delivered and no more will follow until the session is flushed.
*/
pub trait FrameSink: Send {
    fn queue_frame(&mut self, frame: Option<DecodedFrame>) -> Result<()>;
}

/**
    Creates transforms for the session.

    The factory is the host's registry of available decoders; the
    session asks it for one matching the codec's registered subtype.
*/
pub trait TransformFactory {
    fn create_decoder(
        &self,
        codec: CodecId,
        subtype: Tag,
        hardware: bool,
    ) -> std::result::Result<Box<dyn Transform>, TransformError>;
}

enum PullStop {
    /// The transform has no output ready right now.
    Idle,
    /// Draining finished; the end-of-stream marker went to the sink.
    EndOfStream,
}

/**
    A decoding session over one transform.

    Push encoded packets with [`push_packet`](Self::push_packet);
    decoded frames arrive at the [`FrameSink`] as they become
    available. Push `None` to drain. Any fatal error latches: the
    session keeps returning it until torn down.
*/
pub struct DecoderSession {
    transform: Box<dyn Transform>,
    events: Option<Box<dyn EventSource>>,
    sink: Box<dyn FrameSink>,
    bsf: Option<Box<dyn BitstreamFilter>>,
    device: Option<DeviceBinding>,

    params: CodecParams,
    registered_subtype: Tag,
    in_stream: u32,
    out_stream: u32,
    in_info: InputStreamInfo,
    out_info: OutputStreamInfo,
    stream_params: StreamParams,
    zero_copy: bool,

    flags: ReadinessFlags,
    draining: bool,
    sample_sent: bool,
    /// Expected timestamp of the next audio frame, for streams whose
    /// transform drops timestamps.
    audio_next_pts: Option<Pts>,
    failure: Option<DecodeError>,
}

impl DecoderSession {
    /**
        Creates a session: resolves the codec's transform, switches it
        to asynchronous mode where possible, negotiates media types,
        and starts streaming.
    */
    pub fn init(
        factory: &dyn TransformFactory,
        params: CodecParams,
        config: DecoderConfig,
        sink: Box<dyn FrameSink>,
    ) -> Result<Self> {
        let registered_subtype = subtype_for_codec(params.codec).ok_or_else(|| {
            DecodeError::unsupported(format!("no transform registered for {:?}", params.codec))
        })?;

        let mut transform = factory.create_decoder(params.codec, registered_subtype, config.require_hw)?;
        let events = unlock_async(transform.as_mut(), config.require_hw)?;

        // Length-prefixed streams get rewritten to start codes; the
        // configuration record's leading version byte tells them apart
        // from streams already carrying start codes.
        let bsf: Option<Box<dyn BitstreamFilter>> = if params.extradata.first() == Some(&1) {
            match params.codec {
                CodecId::H264 => Some(Box::new(LengthPrefixedToStartCode::h264(&params.extradata)?)),
                CodecId::Hevc => Some(Box::new(LengthPrefixedToStartCode::hevc(&params.extradata)?)),
                _ => None,
            }
        } else {
            None
        };

        if let Some(device) = &config.device {
            transform.process_message(TransformMessage::SetDeviceManager(device.clone()))?;
        }
        if let Some(count) = config.min_output_samples {
            if let Err(err) = transform.set_attribute(AttrKey::MinOutputSampleCount, AttrValue::U32(count))
            {
                debug!(error = %err, "transform rejected the minimum output sample count");
            }
        }

        let (in_stream, out_stream) = transform.stream_ids()?.unwrap_or((0, 0));

        let mut negotiator = Negotiator {
            transform: transform.as_mut(),
            params: &params,
            registered_subtype,
            in_stream,
            out_stream,
            bsf_active: bsf.is_some(),
        };
        negotiator.negotiate()?;

        let in_info = transform.input_stream_info(in_stream)?;
        let out_info = transform.output_stream_info(out_stream)?;
        debug!(?in_info, ?out_info, "negotiated stream infos");
        let stream_params = read_output_params(transform.as_mut(), out_stream, &params)?;

        transform.process_message(TransformMessage::BeginStreaming)?;
        transform.process_message(TransformMessage::StartOfStream)?;

        Ok(Self {
            transform,
            events,
            sink,
            bsf,
            device: config.device,
            params,
            registered_subtype,
            in_stream,
            out_stream,
            in_info,
            out_info,
            stream_params,
            zero_copy: config.zero_copy,
            flags: ReadinessFlags::default(),
            draining: false,
            sample_sent: false,
            audio_next_pts: None,
            failure: None,
        })
    }

    /**
        Returns the negotiated output stream parameters.
    */
    pub fn stream_params(&self) -> StreamParams {
        self.stream_params
    }

    /**
        Pushes one encoded packet, or `None` to drain.

        Decoded frames go to the sink as they become available; a
        drain delivers all remaining frames followed by the sink's
        end-of-stream marker. A second `None` while draining returns
        [`DecodeError::EndOfStream`].
    */
    pub fn push_packet(&mut self, packet: Option<&Packet>) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let result = match packet {
            Some(packet) => self.push_encoded(packet),
            None => self.drain(),
        };
        if let Err(err) = &result {
            if err.is_fatal() {
                self.failure = Some(err.clone());
            }
        }
        result
    }

    /**
        Discards all queued data and resets the session for a seek.

        Failures along the way are logged; the session stays usable.
    */
    pub fn flush(&mut self) {
        if let Err(err) = self.transform.process_message(TransformMessage::Flush) {
            error!(error = %err, "failed to flush the transform");
        }
        if let Err(err) = self.transform.process_message(TransformMessage::EndOfStream) {
            error!(error = %err, "failed to signal end of stream");
        }

        // In async mode the command queue must settle before state can
        // be reset: queue a marker and swallow stale readiness events
        // until it comes back around.
        if let Some(events) = &mut self.events {
            match events.queue_marker() {
                Err(err) => error!(error = %err, "failed to queue a flush marker"),
                Ok(()) => {
                    while !self.flags.marker {
                        if events::pump(events.as_mut(), &mut self.flags, false).is_err() {
                            break;
                        }
                        self.flags.need_input = false;
                        self.flags.have_output = false;
                        self.flags.drain_done = false;
                    }
                }
            }
        }

        self.flags = ReadinessFlags::default();
        self.draining = false;
        self.sample_sent = false;
        self.audio_next_pts = None;

        if let Err(err) = self.transform.process_message(TransformMessage::StartOfStream) {
            error!(error = %err, "failed to restart the stream");
        }
    }

    /**
        Tears the session down. The device binding stays alive as long
        as any zero-copy frame still references it.
    */
    pub fn uninit(self) {}

    fn push_encoded(&mut self, packet: &Packet) -> Result<()> {
        let sample = translate::packet_to_sample(packet, self.bsf.as_deref_mut(), &self.in_info)?;

        let mut pending = Some(sample);
        while let Some(sample) = pending.take() {
            if let Some(returned) = self.try_send(sample)? {
                pending = Some(returned);
                // make room by collecting output, then retry
                let (_, delivered) = self.pull_to_sink()?;
                if delivered == 0 && self.events.is_none() {
                    return Err(DecodeError::external(
                        "transform accepts no input and produces no output",
                    ));
                }
            }
        }

        self.pull_to_sink()?;
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        if self.draining {
            return Err(DecodeError::EndOfStream);
        }
        if let Err(err) = self.transform.process_message(TransformMessage::Drain) {
            error!(error = %err, "failed to send the drain command");
        }
        self.draining = true;
        self.flags.need_input = false;

        loop {
            if let (PullStop::EndOfStream, _) = self.pull_to_sink()? {
                return Ok(());
            }
        }
    }

    /// Delivers available frames to the sink until the transform runs
    /// dry. Returns how it stopped and how many frames were delivered.
    fn pull_to_sink(&mut self) -> Result<(PullStop, usize)> {
        let mut delivered = 0;
        loop {
            match self.receive_sample() {
                Ok(sample) => {
                    let frame = self.sample_to_frame(sample)?;
                    self.sink.queue_frame(Some(frame))?;
                    delivered += 1;
                }
                Err(DecodeError::Again) => return Ok((PullStop::Idle, delivered)),
                Err(DecodeError::EndOfStream) => {
                    self.sink.queue_frame(None)?;
                    return Ok((PullStop::EndOfStream, delivered));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Submits one sample, pumping the readiness gate first in async
    /// mode. Hands the sample back when the transform is not ready.
    fn try_send(&mut self, mut sample: Sample) -> Result<Option<Sample>> {
        if self.events.is_some() {
            self.pump_events()?;
            if !self.flags.need_input {
                return Ok(Some(sample));
            }
        }

        if !self.sample_sent {
            sample.set_discontinuity(true);
            self.sample_sent = true;
        }

        match self.transform.process_input(self.in_stream, sample) {
            Ok(InputStatus::Accepted) => {
                self.flags.need_input = false;
                Ok(None)
            }
            Ok(InputStatus::NotAccepting(sample)) => Ok(Some(sample)),
            Err(err) => {
                error!(error = %err, "failed to process input");
                Err(err.into())
            }
        }
    }

    /// Collects one decoded sample, or `Again`/`EndOfStream` when
    /// there is nothing (more) to collect.
    fn receive_sample(&mut self) -> Result<Sample> {
        loop {
            if self.events.is_some() {
                self.pump_events()?;
                if !self.flags.have_output || self.flags.drain_done {
                    break;
                }
            }

            let provided = if self.out_info.provides_samples {
                None
            } else {
                Some(Sample::memory(None, self.out_info.min_size, self.out_info.alignment)?)
            };

            match self.transform.process_output(self.out_stream, provided) {
                Ok(OutputStatus::Sample(sample)) => {
                    self.flags.have_output = false;
                    return Ok(sample);
                }
                Ok(OutputStatus::NeedMoreInput) => {
                    if self.draining {
                        self.flags.drain_done = true;
                    }
                    break;
                }
                Ok(OutputStatus::StreamChanged) => {
                    warn!("transform output format changed mid-stream");
                    self.renegotiate_output()?;
                    self.flags.have_output = false;
                }
                Err(err) => {
                    error!(error = %err, "failed to process output");
                    return Err(err.into());
                }
            }
        }

        self.flags.have_output = false;
        if self.flags.drain_done {
            Err(DecodeError::EndOfStream)
        } else {
            Err(DecodeError::Again)
        }
    }

    /// A mid-stream format change renegotiates the output side only;
    /// a transform also wanting new input types gets a hard error.
    fn renegotiate_output(&mut self) -> Result<()> {
        let mut negotiator = Negotiator {
            transform: self.transform.as_mut(),
            params: &self.params,
            registered_subtype: self.registered_subtype,
            in_stream: self.in_stream,
            out_stream: self.out_stream,
            bsf_active: self.bsf.is_some(),
        };
        if !negotiator.choose_output_type()? {
            return Err(DecodeError::external(
                "transform requested input renegotiation mid-stream",
            ));
        }

        self.in_info = self.transform.input_stream_info(self.in_stream)?;
        self.out_info = self.transform.output_stream_info(self.out_stream)?;
        self.stream_params = read_output_params(self.transform.as_mut(), self.out_stream, &self.params)?;
        debug!(params = ?self.stream_params, "output renegotiated");
        Ok(())
    }

    fn sample_to_frame(&mut self, sample: Sample) -> Result<DecodedFrame> {
        match self.stream_params {
            StreamParams::Audio(params) => {
                let mut frame =
                    translate::sample_to_audio_frame(sample, &params, self.params.time_base)?;
                if frame.pts.is_none() {
                    frame.pts = self.audio_next_pts;
                }
                if let Some(pts) = frame.pts {
                    let advance = rescale(
                        frame.samples as i64,
                        Rational::new(1, params.sample_rate as i32),
                        self.params.time_base,
                    );
                    self.audio_next_pts = Some(Pts(pts.0 + advance));
                }
                Ok(DecodedFrame::Audio(frame))
            }
            StreamParams::Video(params) => {
                let frame = translate::sample_to_video_frame(
                    sample,
                    &params,
                    self.params.time_base,
                    self.zero_copy,
                    self.device.clone(),
                )?;
                Ok(DecodedFrame::Video(frame))
            }
        }
    }

    fn pump_events(&mut self) -> Result<()> {
        if let Some(events) = &mut self.events {
            events::pump(events.as_mut(), &mut self.flags, self.draining)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderSession")
            .field("codec", &self.params.codec)
            .field("async", &self.events.is_some())
            .field("stream_params", &self.stream_params)
            .field("draining", &self.draining)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
