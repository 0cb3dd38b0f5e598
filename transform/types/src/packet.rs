/*!
    Encoded packet type.
*/

use crate::rational::Rational;
use crate::timestamp::{MediaDuration, Pts};

/**
    An encoded (compressed) packet of audio or video data.

    One packet normally carries one access unit. Timestamps are in
    units of `time_base`.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Compressed payload.
    pub data: Vec<u8>,
    /// Presentation timestamp, if known.
    pub pts: Option<Pts>,
    /// Decode timestamp, if known.
    pub dts: Option<Pts>,
    /// Playback duration of the payload.
    pub duration: MediaDuration,
    /// Time base for `pts`, `dts` and `duration`.
    pub time_base: Rational,
    /// True if the payload starts at a random access point.
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Creates a packet with the given payload and time base, with no
        timestamps and no keyframe marking.
    */
    pub fn new(data: Vec<u8>, time_base: Rational) -> Self {
        Self {
            data,
            pts: None,
            dts: None,
            duration: MediaDuration(0),
            time_base,
            is_keyframe: false,
        }
    }

    /**
        Returns the presentation timestamp, substituting the decode
        timestamp when the presentation timestamp is missing.
    */
    pub fn effective_pts(&self) -> Option<Pts> {
        self.pts.or(self.dts)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
