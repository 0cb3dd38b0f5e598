/*!
    Transform samples and their buffers.

    A sample is the unit of data exchanged with a transform: one
    buffer plus timing and framing metadata. Buffers are locked for
    access and must be unlocked before they travel; [`MappedSample`]
    keeps a buffer locked for the lifetime of a zero-copy frame.
*/

use std::ptr::NonNull;
use std::sync::Arc;

use transform_types::{DecodeError, Result, SharedBytes};

use crate::device::DeviceBinding;
use crate::transform::TransformError;

/// Minimum alignment applied to every memory buffer.
const MIN_ALIGNMENT: usize = 16;

/**
    Backing storage of a sample.

    `lock` exposes the full capacity for reading and writing;
    `current_len` says how many leading bytes hold valid data. The
    storage must not move while locked, and implementations are heap
    backed, so the pointer returned by `lock` stays valid even if the
    owning [`Sample`] is moved.
*/
pub trait SampleBuffer: Send {
    fn lock(&mut self) -> std::result::Result<&mut [u8], TransformError>;

    fn unlock(&mut self);

    fn capacity(&self) -> usize;

    fn current_len(&self) -> usize;

    fn set_current_len(&mut self, len: usize);
}

/**
    A plain system-memory buffer with an alignment guarantee.
*/
pub struct MemoryBuffer {
    data: Vec<u8>,
    start: usize,
    capacity: usize,
    len: usize,
}

impl MemoryBuffer {
    /**
        Allocates a zeroed buffer of at least `size` bytes whose start
        address is a multiple of `align`. Alignment is clamped to at
        least 16 bytes and capacity is rounded up to a whole number of
        alignment units.
    */
    pub fn new(size: usize, align: usize) -> Result<Self> {
        let align = align.max(MIN_ALIGNMENT);
        let capacity = size.div_ceil(align) * align;

        let mut data = Vec::new();
        data.try_reserve_exact(capacity + align)
            .map_err(|_| DecodeError::OutOfMemory)?;
        data.resize(capacity + align, 0);

        let start = data.as_ptr().align_offset(align);
        Ok(Self {
            data,
            start,
            capacity,
            len: 0,
        })
    }
}

impl SampleBuffer for MemoryBuffer {
    fn lock(&mut self) -> std::result::Result<&mut [u8], TransformError> {
        let start = self.start;
        Ok(&mut self.data[start..start + self.capacity])
    }

    fn unlock(&mut self) {}

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn current_len(&self) -> usize {
        self.len
    }

    fn set_current_len(&mut self, len: usize) {
        self.len = len.min(self.capacity);
    }
}

/**
    One unit of data exchanged with a transform.
*/
pub struct Sample {
    buffer: Box<dyn SampleBuffer>,
    /// Presentation time in transform time base units.
    time: Option<i64>,
    /// Duration in transform time base units.
    duration: Option<i64>,
    keyframe: bool,
    discontinuity: bool,
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("len", &self.buffer.current_len())
            .field("capacity", &self.buffer.capacity())
            .field("time", &self.time)
            .field("duration", &self.duration)
            .field("keyframe", &self.keyframe)
            .field("discontinuity", &self.discontinuity)
            .finish()
    }
}

impl Sample {
    /**
        Wraps an existing buffer in a sample with no metadata.
    */
    pub fn from_buffer(buffer: Box<dyn SampleBuffer>) -> Self {
        Self {
            buffer,
            time: None,
            duration: None,
            keyframe: false,
            discontinuity: false,
        }
    }

    /**
        Creates a memory-backed sample.

        With `fill` the payload is copied in and the current length
        set to match; without it the buffer stays zero-length, which
        is what transforms expect of provided output buffers.
    */
    pub fn memory(fill: Option<&[u8]>, size: usize, align: usize) -> Result<Self> {
        let size = size.max(fill.map_or(0, <[u8]>::len));
        let mut buffer = MemoryBuffer::new(size, align)?;
        if let Some(payload) = fill {
            let slice = buffer
                .lock()
                .map_err(transform_types::DecodeError::from)?;
            slice[..payload.len()].copy_from_slice(payload);
            buffer.unlock();
            buffer.set_current_len(payload.len());
        }
        Ok(Self::from_buffer(Box::new(buffer)))
    }

    pub fn time(&self) -> Option<i64> {
        self.time
    }

    pub fn set_time(&mut self, time: Option<i64>) {
        self.time = time;
    }

    pub fn duration(&self) -> Option<i64> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Option<i64>) {
        self.duration = duration;
    }

    pub fn is_keyframe(&self) -> bool {
        self.keyframe
    }

    pub fn set_keyframe(&mut self, keyframe: bool) {
        self.keyframe = keyframe;
    }

    pub fn is_discontinuity(&self) -> bool {
        self.discontinuity
    }

    pub fn set_discontinuity(&mut self, discontinuity: bool) {
        self.discontinuity = discontinuity;
    }

    /**
        Returns the number of valid payload bytes.
    */
    pub fn len(&self) -> usize {
        self.buffer.current_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn set_len(&mut self, len: usize) {
        self.buffer.set_current_len(len);
    }

    /**
        Locks the buffer for access. Must be paired with
        [`Sample::unlock`].
    */
    pub fn lock(&mut self) -> std::result::Result<&mut [u8], TransformError> {
        self.buffer.lock()
    }

    pub fn unlock(&mut self) {
        self.buffer.unlock();
    }

    /**
        Consumes the sample into shared frame bytes, keeping the
        buffer locked until the last clone of the returned handle is
        dropped. The optional device binding is held alongside so
        hardware surfaces outlive the mapping.
    */
    pub fn into_shared_bytes(
        mut self,
        device: Option<DeviceBinding>,
    ) -> std::result::Result<SharedBytes, TransformError> {
        let current = self.buffer.current_len();
        let (ptr, len) = {
            let slice = self.buffer.lock()?;
            let len = current.min(slice.len());
            match NonNull::new(slice.as_mut_ptr()) {
                Some(ptr) => (ptr, len),
                None => return Err(TransformError::new("buffer lock returned null")),
            }
        };

        let mapped = MappedSample {
            ptr,
            len,
            sample: self,
            _device: device,
        };
        Ok(SharedBytes::new(Arc::new(mapped)))
    }
}

/**
    A sample whose buffer stays locked while frames reference it.

    Dropping the mapping unlocks and releases the sample exactly
    once, after the last frame clone is gone.
*/
struct MappedSample {
    ptr: NonNull<u8>,
    len: usize,
    sample: Sample,
    _device: Option<DeviceBinding>,
}

// SAFETY: `ptr` points into heap storage owned by `sample`, which is
// stored right next to it and outlives every dereference. Access
// through the mapping is read-only and nothing mutates the buffer
// while it stays locked.
unsafe impl Send for MappedSample {}
unsafe impl Sync for MappedSample {}

impl AsRef<[u8]> for MappedSample {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: see the Send/Sync rationale above; `len` was clamped
        // to the locked slice length at construction.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for MappedSample {
    fn drop(&mut self) {
        self.sample.buffer.unlock();
    }
}
