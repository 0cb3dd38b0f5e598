/*!
    Readiness flags and the event pump for asynchronous transforms.
*/

use tracing::error;
use transform_types::{DecodeError, Result};

use crate::transform::{EventSource, TransformEvent};

/**
    Sticky readiness state accumulated from transform events.

    Events are edge-triggered; these flags turn them into level
    state the decode pump can consult. A flag stays set until the
    action it permits is performed (or the session is flushed).
    `drain_done` persists until the next flush.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadinessFlags {
    pub need_input: bool,
    pub have_output: bool,
    pub drain_done: bool,
    pub marker: bool,
}

impl ReadinessFlags {
    /**
        Returns true if any flag is set, meaning the pump has
        something to report.
    */
    pub fn any(self) -> bool {
        self.need_input || self.have_output || self.drain_done || self.marker
    }
}

/**
    Drains events until at least one readiness flag is set.

    Returns immediately when a flag is already set. While `draining`,
    need-input events are swallowed: the transform must not be fed
    during a drain, and reporting readiness for input would invite
    exactly that.

    A failing event fetch is fatal to the session.
*/
pub fn pump(
    events: &mut dyn EventSource,
    flags: &mut ReadinessFlags,
    draining: bool,
) -> Result<()> {
    while !flags.any() {
        let event = events.next_event().map_err(|err| {
            error!(error = %err, "failed to get transform event");
            DecodeError::from(err)
        })?;
        match event {
            TransformEvent::NeedInput => {
                if !draining {
                    flags.need_input = true;
                }
            }
            TransformEvent::HaveOutput => flags.have_output = true,
            TransformEvent::DrainComplete => flags.drain_done = true,
            TransformEvent::Marker => flags.marker = true,
        }
    }
    Ok(())
}
