/*!
    Bitstream reformatting for length-prefixed H.264 and HEVC.

    Transforms expect start-code-delimited elementary streams, but
    packets demuxed from MP4-family containers carry length-prefixed
    units with the parameter sets tucked away in the codec
    configuration record. The filter here rewrites packets into
    start-code form and re-inserts the parameter sets ahead of
    keyframes.
*/

use std::collections::VecDeque;

use transform_types::{DecodeError, Packet, Result};

const START_CODE: [u8; 4] = [0, 0, 0, 1];

/**
    A packet-to-packet bitstream rewriting stage.

    Push with `send`, then drain with `receive` until it returns
    `None`. A filter may emit zero, one, or several packets per
    input.
*/
pub trait BitstreamFilter: Send {
    fn send(&mut self, packet: &Packet) -> Result<()>;

    fn receive(&mut self) -> Result<Option<Packet>>;
}

/**
    Rewrites length-prefixed H.264/HEVC packets into start-code form.

    Built from the stream's codec configuration record; emits exactly
    one packet per input packet.
*/
pub struct LengthPrefixedToStartCode {
    nal_length_size: usize,
    /// Parameter sets in start-code form, inserted before keyframes.
    parameter_sets: Vec<u8>,
    pending: VecDeque<Packet>,
}

fn read_u16(data: &[u8], at: usize) -> Result<usize> {
    match data.get(at..at + 2) {
        Some(b) => Ok(usize::from(u16::from_be_bytes([b[0], b[1]]))),
        None => Err(DecodeError::unsupported(
            "truncated codec configuration record",
        )),
    }
}

fn append_unit(out: &mut Vec<u8>, data: &[u8], at: usize, len: usize) -> Result<usize> {
    let unit = data.get(at..at + len).ok_or_else(|| {
        DecodeError::unsupported("truncated codec configuration record")
    })?;
    out.extend_from_slice(&START_CODE);
    out.extend_from_slice(unit);
    Ok(at + len)
}

impl LengthPrefixedToStartCode {
    /**
        Builds a filter from an H.264 configuration record (the kind
        whose first byte is 1).
    */
    pub fn h264(extradata: &[u8]) -> Result<Self> {
        if extradata.len() < 7 || extradata[0] != 1 {
            return Err(DecodeError::unsupported(
                "malformed H.264 configuration record",
            ));
        }

        let nal_length_size = usize::from(extradata[4] & 0x3) + 1;
        let mut parameter_sets = Vec::new();

        let mut cursor = 6;
        let sps_count = usize::from(extradata[5] & 0x1F);
        for _ in 0..sps_count {
            let len = read_u16(extradata, cursor)?;
            cursor = append_unit(&mut parameter_sets, extradata, cursor + 2, len)?;
        }

        let pps_count = usize::from(*extradata.get(cursor).ok_or_else(|| {
            DecodeError::unsupported("malformed H.264 configuration record")
        })?);
        cursor += 1;
        for _ in 0..pps_count {
            let len = read_u16(extradata, cursor)?;
            cursor = append_unit(&mut parameter_sets, extradata, cursor + 2, len)?;
        }

        Ok(Self {
            nal_length_size,
            parameter_sets,
            pending: VecDeque::new(),
        })
    }

    /**
        Builds a filter from an HEVC configuration record.
    */
    pub fn hevc(extradata: &[u8]) -> Result<Self> {
        if extradata.len() < 23 || extradata[0] != 1 {
            return Err(DecodeError::unsupported(
                "malformed HEVC configuration record",
            ));
        }

        let nal_length_size = usize::from(extradata[21] & 0x3) + 1;
        let mut parameter_sets = Vec::new();

        let mut cursor = 23;
        let array_count = usize::from(extradata[22]);
        for _ in 0..array_count {
            // one byte of array type flags, then a unit count
            let unit_count = read_u16(extradata, cursor + 1)?;
            cursor += 3;
            for _ in 0..unit_count {
                let len = read_u16(extradata, cursor)?;
                cursor = append_unit(&mut parameter_sets, extradata, cursor + 2, len)?;
            }
        }

        Ok(Self {
            nal_length_size,
            parameter_sets,
            pending: VecDeque::new(),
        })
    }

    fn rewrite(&self, packet: &Packet) -> Result<Vec<u8>> {
        let data = &packet.data;
        let mut out = Vec::with_capacity(
            data.len() + if packet.is_keyframe { self.parameter_sets.len() } else { 0 },
        );

        if packet.is_keyframe {
            out.extend_from_slice(&self.parameter_sets);
        }

        let mut cursor = 0;
        while cursor < data.len() {
            let prefix = data.get(cursor..cursor + self.nal_length_size).ok_or_else(
                || DecodeError::external("truncated length-prefixed unit"),
            )?;
            let mut len = 0usize;
            for &b in prefix {
                len = (len << 8) | usize::from(b);
            }
            cursor = append_unit(&mut out, data, cursor + self.nal_length_size, len)
                .map_err(|_| DecodeError::external("truncated length-prefixed unit"))?;
        }

        Ok(out)
    }
}

impl BitstreamFilter for LengthPrefixedToStartCode {
    fn send(&mut self, packet: &Packet) -> Result<()> {
        let data = self.rewrite(packet)?;
        let mut out = packet.clone();
        out.data = data;
        self.pending.push_back(out);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Packet>> {
        Ok(self.pending.pop_front())
    }
}
