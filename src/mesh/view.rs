//! Scoped views over mesh storage.

use crate::error::{GraphicsError, GraphicsResult};
use crate::mesh::ReadPolicy;
use crate::objects::MappedRange;
use bytemuck::Pod;
use std::cell::{Ref, RefMut};
use std::fmt;
use std::ops::Deref;

enum ViewSource<'a, T: Pod> {
    /// Zero-length views never reach the driver.
    Empty,
    Mapped(MappedRange<'a, T>),
    Shared(Ref<'a, [T]>),
    Exclusive(RefMut<'a, [T]>),
}

/// A bounds-checked window over a mesh's vertex or index storage.
///
/// GPU-backed views hold a buffer mapping that is released by [`MeshView::release`] or, failing
/// that, when the view is dropped. Host-backed views borrow the mesh's memory directly and
/// release is a no-op. The borrow of the mesh keeps it from being closed while a view is open.
pub struct MeshView<'a, T: Pod> {
    policy: ReadPolicy,
    source: ViewSource<'a, T>,
}

impl<'a, T: Pod> MeshView<'a, T> {
    pub(crate) fn empty(policy: ReadPolicy) -> Self {
        Self {
            policy,
            source: ViewSource::Empty,
        }
    }

    pub(crate) fn mapped(policy: ReadPolicy, range: MappedRange<'a, T>) -> Self {
        Self {
            policy,
            source: ViewSource::Mapped(range),
        }
    }

    pub(crate) fn shared(policy: ReadPolicy, data: Ref<'a, [T]>) -> Self {
        Self {
            policy,
            source: ViewSource::Shared(data),
        }
    }

    pub(crate) fn exclusive(policy: ReadPolicy, data: RefMut<'a, [T]>) -> Self {
        Self {
            policy,
            source: ViewSource::Exclusive(data),
        }
    }

    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Whether this view holds a driver mapping.
    pub fn is_mapped(&self) -> bool {
        matches!(self.source, ViewSource::Mapped(_))
    }

    pub fn data(&self) -> &[T] {
        match &self.source {
            ViewSource::Empty => &[],
            ViewSource::Mapped(range) => range.as_slice(),
            ViewSource::Shared(data) => data,
            ViewSource::Exclusive(data) => data,
        }
    }

    /// Writable access; fails on views opened with [`ReadPolicy::Read`].
    pub fn data_mut(&mut self) -> GraphicsResult<&mut [T]> {
        if !self.policy.is_writable() {
            return Err(GraphicsError::ReadOnlyView);
        }
        match &mut self.source {
            ViewSource::Empty => Ok(&mut []),
            ViewSource::Mapped(range) => range.as_mut_slice(),
            ViewSource::Shared(_) => Err(GraphicsError::ReadOnlyView),
            ViewSource::Exclusive(data) => Ok(data),
        }
    }

    /// Release the view, unmapping GPU storage.
    pub fn release(self) -> GraphicsResult<()> {
        match self.source {
            ViewSource::Mapped(range) => range.unmap(),
            ViewSource::Empty | ViewSource::Shared(_) | ViewSource::Exclusive(_) => Ok(()),
        }
    }
}

impl<T: Pod> fmt::Debug for MeshView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshView")
            .field("policy", &self.policy)
            .field("len", &self.data().len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

impl<T: Pod> Deref for MeshView<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_debug_reports_shape() {
        let empty = MeshView::<f32>::empty(ReadPolicy::Read);
        assert_eq!(
            format!("{empty:?}"),
            "MeshView { policy: Read, len: 0, mapped: false }"
        );

        let stored = RefCell::new(vec![1u32, 2, 3]);
        let view = MeshView::shared(ReadPolicy::Read, Ref::map(stored.borrow(), |v| v.as_slice()));
        assert_eq!(
            format!("{view:?}"),
            "MeshView { policy: Read, len: 3, mapped: false }"
        );
    }
}
