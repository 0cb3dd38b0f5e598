/*!
    Hardware device binding and the async unlock handshake.
*/

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use transform_types::{AttrKey, AttrValue, DecodeError, Result};

use crate::transform::{EventSource, Transform};

/**
    A host-provided hardware device used for surface allocation.

    The adapter never interprets the device; it only hands it to the
    transform and keeps it alive for as long as anything may still
    reference its surfaces.
*/
pub trait DeviceManager: Send + Sync {
    /// Short human-readable name for log messages.
    fn name(&self) -> &str {
        "device"
    }
}

/**
    A shared handle to a [`DeviceManager`].

    Cloned into every zero-copy frame and held by the session until
    the transform is dropped, so the device outlives all surfaces
    allocated from it.
*/
#[derive(Clone)]
pub struct DeviceBinding(Arc<dyn DeviceManager>);

impl DeviceBinding {
    pub fn new(manager: Arc<dyn DeviceManager>) -> Self {
        Self(manager)
    }

    pub fn manager(&self) -> &Arc<dyn DeviceManager> {
        &self.0
    }
}

impl fmt::Debug for DeviceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceBinding({})", self.0.name())
    }
}

/**
    Switches an async-capable transform into asynchronous mode and
    takes its event source.

    Returns `None` for transforms without async support, which then
    run synchronously. When `require_async` is set (hardware decode
    was demanded), a non-async transform is an error instead.
*/
pub fn unlock_async(
    transform: &mut dyn Transform,
    require_async: bool,
) -> Result<Option<Box<dyn EventSource>>> {
    let attributes = transform.attributes()?;

    if attributes.get_u32(AttrKey::AsyncCapable) != Some(1) {
        if require_async {
            return Err(DecodeError::external(
                "hardware transform is not asynchronous",
            ));
        }
        debug!("transform is not async capable, using synchronous mode");
        return Ok(None);
    }

    transform.set_attribute(AttrKey::AsyncUnlock, AttrValue::U32(1))?;

    match transform.event_source()? {
        Some(events) => Ok(Some(events)),
        None => Err(DecodeError::external(
            "async transform did not provide an event source",
        )),
    }
}
