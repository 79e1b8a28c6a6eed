//! Host-side element buffers.
//!
//! A [`HostBuffer`] is either *direct*, an exclusively owned fixed-size allocation that can be
//! handed to the driver as-is, or *managed*, a growable `Vec` wrapped around caller data.
//! Mesh mutation only accepts direct buffers.

use crate::error::{GraphicsError, GraphicsResult};
use bytemuck::Pod;
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Clone)]
enum Storage<T> {
    Direct(Box<[T]>),
    Managed(Vec<T>),
}

/// Owning buffer of plain-old-data elements.
#[derive(Clone)]
pub struct HostBuffer<T: Pod> {
    storage: Storage<T>,
}

impl<T: Pod> HostBuffer<T> {
    /// Allocate a direct buffer of `len` zeroed elements.
    pub fn zeroed(len: usize) -> Self {
        Self {
            storage: Storage::Direct(vec![T::zeroed(); len].into_boxed_slice()),
        }
    }

    /// Allocate a direct buffer holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            storage: Storage::Direct(data.into()),
        }
    }

    /// An empty direct buffer.
    pub fn empty() -> Self {
        Self::zeroed(0)
    }

    /// Wrap caller-owned data without copying. The result is managed.
    pub fn wrap(data: Vec<T>) -> Self {
        Self {
            storage: Storage::Managed(data),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.storage, Storage::Direct(_))
    }

    /// Copy a managed buffer into direct storage. Direct buffers are returned unchanged.
    pub fn into_direct(self) -> Self {
        match self.storage {
            Storage::Direct(_) => self,
            Storage::Managed(data) => Self {
                storage: Storage::Direct(data.into_boxed_slice()),
            },
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Direct(data) => data,
            Storage::Managed(data) => data,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.storage {
            Storage::Direct(data) => data,
            Storage::Managed(data) => data,
        }
    }

    /// View the elements as raw bytes, as uploaded to the driver.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T: Pod> Deref for HostBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for HostBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Pod + PartialEq> PartialEq for HostBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Pod> Default for HostBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for HostBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuffer")
            .field("direct", &self.is_direct())
            .field("len", &self.len())
            .finish()
    }
}

/// Reject managed buffers where the driver needs direct memory.
pub fn require_direct<T: Pod>(buffer: &HostBuffer<T>) -> GraphicsResult<()> {
    if buffer.is_direct() {
        Ok(())
    } else {
        Err(GraphicsError::IndirectBuffer)
    }
}
