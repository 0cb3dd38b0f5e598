/*!
    Timestamp types for media playback.
*/

use std::time::Duration;

use crate::rational::{Rational, rescale};

/**
    A presentation timestamp, expressed in units of some time base.

    The wrapped value is only meaningful together with a `Rational`
    time base; conversion helpers take the time base explicitly.
    An absent timestamp is `Option::<Pts>::None`, never a sentinel
    value.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Converts this timestamp into another time base, rounding to the
        nearest unit with ties away from zero.
    */
    pub fn rescale(self, from: Rational, to: Rational) -> Self {
        Self(rescale(self.0, from, to))
    }

    /**
        Converts this timestamp to a `Duration` using the given time base.

        Negative timestamps clamp to zero.
    */
    pub fn to_duration(self, time_base: Rational) -> Duration {
        if self.0 <= 0 || !time_base.is_valid() {
            return Duration::ZERO;
        }
        let seconds = self.0 as f64 * time_base.to_f64();
        Duration::from_secs_f64(seconds)
    }
}

/**
    A media duration, expressed in units of some time base.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    /**
        Converts this duration to a `Duration` using the given time base.

        Negative durations clamp to zero.
    */
    pub fn to_duration(self, time_base: Rational) -> Duration {
        Pts(self.0).to_duration(time_base)
    }
}
