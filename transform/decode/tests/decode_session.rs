/*!
    End-to-end decoding session tests against a scriptable mock
    transform.
*/

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use static_assertions::assert_impl_all;
use transform_decode::{
    CodecParams, DecoderConfig, DecoderSession, EventSource, FrameSink, InputStatus,
    InputStreamInfo, OutputStatus, OutputStreamInfo, Sample, StreamParams, Transform,
    TransformError, TransformEvent, TransformFactory, TransformMessage,
    TypeCommit, TypeOffer, pack_display_aperture,
};
use transform_types::{
    AttrKey, AttrValue, CodecId, DecodeError, DecodedFrame, MediaType, Packet, Pts, Rational, Tag,
    tags,
};

assert_impl_all!(DecoderSession: Send);

const HOST_TB: Rational = Rational::new(1, 1000);

// -------------------------------------------------------------------
// Mock transform
// -------------------------------------------------------------------

#[derive(Default)]
struct MockState {
    // scripting
    async_mode: bool,
    /// Buffer output internally without announcing it (greedy decoder).
    suppress_have_output: bool,
    fail_input: bool,
    /// Input commit refuses until the output type is committed.
    input_commit_requires_output: bool,
    refuse_all_commits: bool,
    input_offers: Vec<MediaType>,
    output_offers: Vec<MediaType>,
    /// Payload every decoded sample carries.
    output_payload: Vec<u8>,
    /// After this many inputs, signal a stream change and switch to
    /// `new_output_offers`.
    change_after_inputs: Option<usize>,
    new_output_offers: Vec<MediaType>,

    // observable state
    committed_input: Option<MediaType>,
    committed_output: Option<MediaType>,
    input_commits: usize,
    events: VecDeque<TransformEvent>,
    decoded: VecDeque<(Vec<u8>, Option<i64>)>,
    inputs: usize,
    change_pending: bool,
    received_input_data: Vec<Vec<u8>>,
    received_discontinuities: Vec<bool>,
    messages: Vec<&'static str>,
}

type Shared = Arc<Mutex<MockState>>;

struct MockTransform {
    state: Shared,
}

struct MockEvents {
    state: Shared,
}

impl EventSource for MockEvents {
    fn next_event(&mut self) -> Result<TransformEvent, TransformError> {
        self.state
            .lock()
            .unwrap()
            .events
            .pop_front()
            .ok_or_else(|| TransformError::new("mock event queue is empty"))
    }

    fn queue_marker(&mut self) -> Result<(), TransformError> {
        self.state
            .lock()
            .unwrap()
            .events
            .push_back(TransformEvent::Marker);
        Ok(())
    }
}

impl Transform for MockTransform {
    fn attributes(&mut self) -> Result<MediaType, TransformError> {
        let mut attrs = MediaType::new();
        if self.state.lock().unwrap().async_mode {
            attrs.set_u32(AttrKey::AsyncCapable, 1);
        }
        Ok(attrs)
    }

    fn set_attribute(&mut self, _key: AttrKey, _value: AttrValue) -> Result<(), TransformError> {
        Ok(())
    }

    fn event_source(&mut self) -> Result<Option<Box<dyn EventSource>>, TransformError> {
        if self.state.lock().unwrap().async_mode {
            Ok(Some(Box::new(MockEvents {
                state: self.state.clone(),
            })))
        } else {
            Ok(None)
        }
    }

    fn stream_ids(&mut self) -> Result<Option<(u32, u32)>, TransformError> {
        Ok(None)
    }

    fn input_available_type(
        &mut self,
        _stream: u32,
        index: u32,
    ) -> Result<TypeOffer, TransformError> {
        let state = self.state.lock().unwrap();
        Ok(match state.input_offers.get(index as usize) {
            Some(ty) => TypeOffer::Type(ty.clone()),
            None => TypeOffer::NoMoreTypes,
        })
    }

    fn output_available_type(
        &mut self,
        _stream: u32,
        index: u32,
    ) -> Result<TypeOffer, TransformError> {
        let state = self.state.lock().unwrap();
        Ok(match state.output_offers.get(index as usize) {
            Some(ty) => TypeOffer::Type(ty.clone()),
            None => TypeOffer::NoMoreTypes,
        })
    }

    fn set_input_type(
        &mut self,
        _stream: u32,
        media_type: &MediaType,
    ) -> Result<TypeCommit, TransformError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_all_commits
            || (state.input_commit_requires_output && state.committed_output.is_none())
        {
            return Ok(TypeCommit::OtherDirectionFirst);
        }
        assert!(media_type.major_type().is_some(), "input type has no major type");
        state.committed_input = Some(media_type.clone());
        state.input_commits += 1;
        Ok(TypeCommit::Committed)
    }

    fn set_output_type(
        &mut self,
        _stream: u32,
        media_type: &MediaType,
    ) -> Result<TypeCommit, TransformError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_all_commits {
            return Ok(TypeCommit::OtherDirectionFirst);
        }
        state.committed_output = Some(media_type.clone());
        Ok(TypeCommit::Committed)
    }

    fn output_current_type(&mut self, _stream: u32) -> Result<MediaType, TransformError> {
        self.state
            .lock()
            .unwrap()
            .committed_output
            .clone()
            .ok_or_else(|| TransformError::new("no output type committed"))
    }

    fn input_stream_info(&mut self, _stream: u32) -> Result<InputStreamInfo, TransformError> {
        Ok(InputStreamInfo {
            min_size: 0,
            alignment: 16,
        })
    }

    fn output_stream_info(&mut self, _stream: u32) -> Result<OutputStreamInfo, TransformError> {
        let state = self.state.lock().unwrap();
        Ok(OutputStreamInfo {
            min_size: state.output_payload.len(),
            alignment: 16,
            provides_samples: false,
        })
    }

    fn process_input(
        &mut self,
        _stream: u32,
        mut sample: Sample,
    ) -> Result<InputStatus, TransformError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_input {
            return Err(TransformError::new("decoder hardware fault"));
        }

        let len = sample.len();
        let data = sample.lock()?[..len].to_vec();
        sample.unlock();
        state.received_input_data.push(data);
        state.received_discontinuities.push(sample.is_discontinuity());

        let payload = state.output_payload.clone();
        let time = sample.time();
        state.decoded.push_back((payload, time));
        state.inputs += 1;

        if state.change_after_inputs == Some(state.inputs) {
            state.change_pending = true;
        }
        if state.async_mode {
            if !state.suppress_have_output {
                state.events.push_back(TransformEvent::HaveOutput);
            }
            state.events.push_back(TransformEvent::NeedInput);
        }
        Ok(InputStatus::Accepted)
    }

    fn process_output(
        &mut self,
        _stream: u32,
        provided: Option<Sample>,
    ) -> Result<OutputStatus, TransformError> {
        let mut state = self.state.lock().unwrap();

        if state.change_pending {
            state.change_pending = false;
            state.output_offers = state.new_output_offers.clone();
            state.committed_output = None;
            // the pending sample is still here; announce it again
            if state.async_mode {
                state.events.push_back(TransformEvent::HaveOutput);
            }
            return Ok(OutputStatus::StreamChanged);
        }

        match state.decoded.pop_front() {
            None => Ok(OutputStatus::NeedMoreInput),
            Some((payload, time)) => {
                let mut sample = provided
                    .ok_or_else(|| TransformError::new("expected a provided sample"))?;
                sample.lock()?[..payload.len()].copy_from_slice(&payload);
                sample.unlock();
                sample.set_len(payload.len());
                sample.set_time(time);
                Ok(OutputStatus::Sample(sample))
            }
        }
    }

    fn process_message(&mut self, message: TransformMessage) -> Result<(), TransformError> {
        let mut state = self.state.lock().unwrap();
        match message {
            TransformMessage::BeginStreaming => state.messages.push("begin_streaming"),
            TransformMessage::StartOfStream => {
                state.messages.push("start_of_stream");
                if state.async_mode {
                    state.events.push_back(TransformEvent::NeedInput);
                }
            }
            TransformMessage::EndOfStream => state.messages.push("end_of_stream"),
            TransformMessage::Drain => {
                state.messages.push("drain");
                if state.async_mode {
                    for _ in 0..state.decoded.len() {
                        state.events.push_back(TransformEvent::HaveOutput);
                    }
                    state.events.push_back(TransformEvent::DrainComplete);
                }
            }
            TransformMessage::Flush => {
                state.messages.push("flush");
                state.decoded.clear();
                state.events.clear();
            }
            TransformMessage::SetDeviceManager(_) => state.messages.push("set_device_manager"),
        }
        Ok(())
    }
}

struct MockFactory {
    state: Shared,
}

impl TransformFactory for MockFactory {
    fn create_decoder(
        &self,
        _codec: CodecId,
        _subtype: Tag,
        _hardware: bool,
    ) -> Result<Box<dyn Transform>, TransformError> {
        Ok(Box::new(MockTransform {
            state: self.state.clone(),
        }))
    }
}

// -------------------------------------------------------------------
// Harness
// -------------------------------------------------------------------

type FrameLog = Arc<Mutex<Vec<Option<DecodedFrame>>>>;

struct CollectSink {
    frames: FrameLog,
}

impl FrameSink for CollectSink {
    fn queue_frame(&mut self, frame: Option<DecodedFrame>) -> transform_types::Result<()> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}

fn audio_offer(subtype: Tag, bits: u32, rate: u32, channels: u32) -> MediaType {
    let mut ty = MediaType::new();
    ty.set_tag(AttrKey::MajorType, tags::MAJOR_AUDIO);
    ty.set_tag(AttrKey::Subtype, subtype);
    ty.set_u32(AttrKey::BitsPerSample, bits);
    ty.set_u32(AttrKey::SampleRate, rate);
    ty.set_u32(AttrKey::ChannelCount, channels);
    ty
}

fn aac_input_offer() -> MediaType {
    let mut ty = MediaType::new();
    ty.set_tag(AttrKey::MajorType, tags::MAJOR_AUDIO);
    ty.set_tag(AttrKey::Subtype, tags::AUDIO_AAC);
    ty
}

fn audio_state(async_mode: bool) -> MockState {
    MockState {
        async_mode,
        input_offers: vec![aac_input_offer()],
        output_offers: vec![
            audio_offer(tags::AUDIO_PCM, 16, 44100, 2),
            audio_offer(tags::AUDIO_FLOAT, 32, 44100, 2),
        ],
        // 441 sample positions of float stereo
        output_payload: vec![0u8; 441 * 8],
        ..Default::default()
    }
}

fn aac_params() -> CodecParams {
    let mut params = CodecParams::new(CodecId::Aac, HOST_TB);
    params.sample_rate = 44100;
    params.channels = 2;
    params
}

fn packet(pts: Option<i64>) -> Packet {
    let mut packet = Packet::new(vec![0xAB; 64], HOST_TB);
    packet.pts = pts.map(Pts);
    packet
}

struct Harness {
    session: DecoderSession,
    state: Shared,
    frames: FrameLog,
}

fn start(state: MockState, params: CodecParams, config: DecoderConfig) -> Harness {
    let state = Arc::new(Mutex::new(state));
    let frames: FrameLog = Arc::new(Mutex::new(Vec::new()));
    let factory = MockFactory {
        state: state.clone(),
    };
    let sink = Box::new(CollectSink {
        frames: frames.clone(),
    });
    let session = DecoderSession::init(&factory, params, config, sink).unwrap();
    Harness {
        session,
        state,
        frames,
    }
}

fn audio_frames(frames: &FrameLog) -> Vec<Option<(Option<i64>, u32)>> {
    frames
        .lock()
        .unwrap()
        .iter()
        .map(|f| match f {
            None => None,
            Some(DecodedFrame::Audio(a)) => Some((a.pts.map(|p| p.0), a.sample_rate)),
            Some(DecodedFrame::Video(_)) => panic!("unexpected video frame"),
        })
        .collect()
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------

#[test]
fn simple_stream_decodes_every_packet() {
    let mut h = start(audio_state(true), aac_params(), DecoderConfig::new());

    // negotiation picked float over 16-bit integer
    {
        let state = h.state.lock().unwrap();
        let out = state.committed_output.as_ref().unwrap();
        assert_eq!(out.subtype(), Some(tags::AUDIO_FLOAT));
        assert_eq!(state.input_commits, 1);
    }
    match h.session.stream_params() {
        StreamParams::Audio(params) => {
            assert_eq!(params.sample_rate, 44100);
            assert_eq!(params.channels, 2);
        }
        StreamParams::Video(_) => panic!("expected audio params"),
    }

    for pts in [0, 10, 20] {
        h.session.push_packet(Some(&packet(Some(pts)))).unwrap();
    }
    h.session.push_packet(None).unwrap();

    assert_eq!(
        audio_frames(&h.frames),
        vec![
            Some((Some(0), 44100)),
            Some((Some(10), 44100)),
            Some((Some(20), 44100)),
            None,
        ]
    );

    // only the very first sample carried the discontinuity marker
    let state = h.state.lock().unwrap();
    assert_eq!(state.received_discontinuities, vec![true, false, false]);
    assert!(state.messages.contains(&"begin_streaming"));
    assert!(state.messages.contains(&"drain"));
}

#[test]
fn synchronous_transform_decodes_without_events() {
    let mut h = start(audio_state(false), aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(Some(&packet(Some(10)))).unwrap();
    h.session.push_packet(None).unwrap();

    assert_eq!(
        audio_frames(&h.frames),
        vec![Some((Some(0), 44100)), Some((Some(10), 44100)), None]
    );
}

#[test]
fn missing_timestamps_are_carried_forward() {
    let mut h = start(audio_state(false), aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    // 441 samples at 44.1 kHz are exactly 10 ms in the host time base
    h.session.push_packet(Some(&packet(None))).unwrap();
    h.session.push_packet(Some(&packet(None))).unwrap();
    h.session.push_packet(Some(&packet(Some(100)))).unwrap();
    h.session.push_packet(Some(&packet(None))).unwrap();
    h.session.push_packet(None).unwrap();

    assert_eq!(
        audio_frames(&h.frames),
        vec![
            Some((Some(0), 44100)),
            Some((Some(10), 44100)),
            Some((Some(20), 44100)),
            // a timestamped frame resynchronizes the accumulator
            Some((Some(100), 44100)),
            Some((Some(110), 44100)),
            None,
        ]
    );
}

#[test]
fn second_drain_reports_end_of_stream() {
    let mut h = start(audio_state(true), aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(None).unwrap();
    assert_eq!(h.session.push_packet(None), Err(DecodeError::EndOfStream));
    // not fatal: the error does not latch
    assert_eq!(h.session.push_packet(None), Err(DecodeError::EndOfStream));
}

#[test]
fn mid_stream_format_change_renegotiates_output_only() {
    let mut state = audio_state(true);
    state.change_after_inputs = Some(2);
    state.new_output_offers = vec![audio_offer(tags::AUDIO_FLOAT, 32, 48000, 2)];
    let mut h = start(state, aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(Some(&packet(Some(10)))).unwrap();
    h.session.push_packet(Some(&packet(Some(20)))).unwrap();
    h.session.push_packet(None).unwrap();

    let frames = audio_frames(&h.frames);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0], Some((Some(0), 44100)));
    // everything after the change comes out with the new parameters
    assert_eq!(frames[1], Some((Some(10), 48000)));
    assert_eq!(frames[2], Some((Some(20), 48000)));
    assert_eq!(frames[3], None);

    match h.session.stream_params() {
        StreamParams::Audio(params) => assert_eq!(params.sample_rate, 48000),
        StreamParams::Video(_) => panic!("expected audio params"),
    }

    // the input side was never renegotiated
    assert_eq!(h.state.lock().unwrap().input_commits, 1);
}

#[test]
fn flush_discards_buffered_frames() {
    let mut state = audio_state(true);
    state.suppress_have_output = true;
    let mut h = start(state, aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(Some(&packet(Some(10)))).unwrap();
    assert!(h.frames.lock().unwrap().is_empty());

    h.session.flush();
    h.session.push_packet(None).unwrap();

    // nothing but the end-of-stream marker: the buffered frames died
    assert_eq!(audio_frames(&h.frames), vec![None]);
    let state = h.state.lock().unwrap();
    assert!(state.messages.contains(&"flush"));
    assert!(state.decoded.is_empty());
}

#[test]
fn flush_is_idempotent_and_resets_draining() {
    let mut h = start(audio_state(true), aac_params(), DecoderConfig::new());

    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(None).unwrap();

    h.session.flush();
    h.session.flush();

    // the session decodes again after the flush
    h.frames.lock().unwrap().clear();
    h.session.push_packet(Some(&packet(Some(0)))).unwrap();
    h.session.push_packet(None).unwrap();
    assert_eq!(
        audio_frames(&h.frames),
        vec![Some((Some(0), 44100)), None]
    );

    // the first sample after a flush is a discontinuity again
    let state = h.state.lock().unwrap();
    let last = *state.received_discontinuities.last().unwrap();
    assert!(last);
}

#[test]
fn negotiation_converges_in_two_rounds() {
    let mut state = audio_state(true);
    state.input_commit_requires_output = true;
    let h = start(state, aac_params(), DecoderConfig::new());

    let state = h.state.lock().unwrap();
    assert!(state.committed_input.is_some());
    assert!(state.committed_output.is_some());
    assert_eq!(state.input_commits, 1);
}

#[test]
fn negotiation_failure_is_reported() {
    let mut state = audio_state(true);
    state.refuse_all_commits = true;

    let state = Arc::new(Mutex::new(state));
    let factory = MockFactory {
        state: state.clone(),
    };
    let sink = Box::new(CollectSink {
        frames: Arc::new(Mutex::new(Vec::new())),
    });
    let err = DecoderSession::init(&factory, aac_params(), DecoderConfig::new(), sink).unwrap_err();
    assert_eq!(err, DecodeError::NegotiationFailed);
}

#[test]
fn unsupported_codec_is_rejected_before_transform_creation() {
    let state = Arc::new(Mutex::new(audio_state(true)));
    let factory = MockFactory {
        state: state.clone(),
    };
    let sink = Box::new(CollectSink {
        frames: Arc::new(Mutex::new(Vec::new())),
    });
    let params = CodecParams::new(CodecId::Vp9, HOST_TB);
    let err = DecoderSession::init(&factory, params, DecoderConfig::new(), sink).unwrap_err();
    assert!(matches!(err, DecodeError::Unsupported { .. }));
}

#[test]
fn fatal_errors_latch() {
    let mut state = audio_state(false);
    state.fail_input = true;
    let mut h = start(state, aac_params(), DecoderConfig::new());

    let err = h.session.push_packet(Some(&packet(Some(0)))).unwrap_err();
    assert!(err.is_fatal());

    // the second push fails identically without reaching the transform
    let again = h.session.push_packet(Some(&packet(Some(10)))).unwrap_err();
    assert_eq!(err, again);
    assert!(h.state.lock().unwrap().received_input_data.is_empty());
}

// -------------------------------------------------------------------
// Video
// -------------------------------------------------------------------

// version 1, 4-byte lengths, one SPS [0x67, 0x42], one PPS [0x68, 0xCE]
fn avc_record() -> Vec<u8> {
    vec![
        1, 0x42, 0xC0, 0x1E, 0xFF, 0xE1, 0x00, 0x02, 0x67, 0x42, 0x01, 0x00, 0x02, 0x68, 0xCE,
    ]
}

fn video_offer(subtype: Tag) -> MediaType {
    let mut ty = MediaType::new();
    ty.set_tag(AttrKey::MajorType, tags::MAJOR_VIDEO);
    ty.set_tag(AttrKey::Subtype, subtype);
    ty.set_pair(AttrKey::FrameSize, 4, 4);
    ty.set_pair(AttrKey::PixelAspectRatio, 1, 1);
    ty.set_blob(AttrKey::DisplayAperture, pack_display_aperture(0, 0, 4, 2));
    ty
}

fn h264_state() -> MockState {
    MockState {
        async_mode: true,
        // no input enumeration at all; the adapter must construct one
        input_offers: Vec::new(),
        output_offers: vec![
            video_offer(tags::VIDEO_YUY2),
            video_offer(tags::VIDEO_NV12),
        ],
        // NV12, 4x4 coded
        output_payload: (0u8..24).collect(),
        ..Default::default()
    }
}

fn h264_params() -> CodecParams {
    let mut params = CodecParams::new(CodecId::H264, HOST_TB);
    params.width = 4;
    params.height = 4;
    params.extradata = avc_record();
    params
}

#[test]
fn h264_session_prefers_nv12_and_reformats_packets() {
    let mut h = start(h264_state(), h264_params(), DecoderConfig::new());

    {
        let state = h.state.lock().unwrap();
        let out = state.committed_output.as_ref().unwrap();
        assert_eq!(out.subtype(), Some(tags::VIDEO_NV12));

        // the bitstream filter owns the parameter sets now
        let input = state.committed_input.as_ref().unwrap();
        assert_eq!(input.subtype(), Some(tags::VIDEO_H264));
        assert_eq!(input.get_blob(AttrKey::UserData), None);
        assert_eq!(input.get_pair(AttrKey::FrameSize), Some((4, 4)));
    }

    match h.session.stream_params() {
        StreamParams::Video(params) => {
            assert_eq!((params.coded_width, params.coded_height), (4, 4));
            // cropped by the display aperture
            assert_eq!((params.width, params.height), (4, 2));
        }
        StreamParams::Audio(_) => panic!("expected video params"),
    }

    // one keyframe packet: a single length-prefixed unit
    let mut keyframe = Packet::new(vec![0, 0, 0, 1, 0x65], HOST_TB);
    keyframe.pts = Some(Pts(0));
    keyframe.is_keyframe = true;
    h.session.push_packet(Some(&keyframe)).unwrap();
    h.session.push_packet(None).unwrap();

    // the transform saw start codes and the re-inserted parameter sets
    {
        let state = h.state.lock().unwrap();
        assert_eq!(
            state.received_input_data[0],
            vec![
                0, 0, 0, 1, 0x67, 0x42, // SPS
                0, 0, 0, 1, 0x68, 0xCE, // PPS
                0, 0, 0, 1, 0x65, // the keyframe unit
            ]
        );
    }

    let frames = h.frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    match frames[0].as_ref().unwrap() {
        DecodedFrame::Video(frame) => {
            assert!(!frame.data.is_shared());
            // copy mode lays the frame out at display size: 4x2 NV12
            assert_eq!((frame.width, frame.height), (4, 2));
            assert_eq!((frame.coded_width, frame.coded_height), (4, 2));
            // luma rows 0-1, then the first chroma row of the coded frame
            assert_eq!(
                frame.data.bytes(),
                &[0, 1, 2, 3, 4, 5, 6, 7, 16, 17, 18, 19]
            );
        }
        DecodedFrame::Audio(_) => panic!("expected a video frame"),
    }
    assert!(frames[1].is_none());
}

#[test]
fn zero_copy_frames_share_the_transform_buffer() {
    let mut h = start(
        h264_state(),
        h264_params(),
        DecoderConfig::new().with_zero_copy(),
    );

    let mut keyframe = Packet::new(vec![0, 0, 0, 1, 0x65], HOST_TB);
    keyframe.is_keyframe = true;
    h.session.push_packet(Some(&keyframe)).unwrap();

    let frames = h.frames.lock().unwrap();
    match frames[0].as_ref().unwrap() {
        DecodedFrame::Video(frame) => {
            assert!(frame.data.is_shared());
            // the shared payload keeps the coded geometry
            assert_eq!((frame.coded_width, frame.coded_height), (4, 4));
            assert_eq!((frame.width, frame.height), (4, 2));
            assert_eq!(frame.data.len(), 24);

            // clones keep the mapping alive independently
            let clone = frame.clone();
            assert_eq!(clone.data.bytes(), frame.data.bytes());
        }
        DecodedFrame::Audio(_) => panic!("expected a video frame"),
    }
}

#[test]
fn hardware_demand_requires_an_async_transform() {
    let state = Arc::new(Mutex::new(audio_state(false)));
    let factory = MockFactory {
        state: state.clone(),
    };
    let sink = Box::new(CollectSink {
        frames: Arc::new(Mutex::new(Vec::new())),
    });
    let mut config = DecoderConfig::new();
    config.require_hw = true;

    let err = DecoderSession::init(&factory, aac_params(), config, sink).unwrap_err();
    assert!(matches!(err, DecodeError::External { .. }));
}
