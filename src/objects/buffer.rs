//! Buffer objects and scoped mappings.

use crate::backend::{BufferHandle, BufferTarget, BufferUsage, GraphicsBackend, MapAccess};
use crate::error::{GraphicsError, GraphicsResult};
use bytemuck::Pod;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;

/// An owned GL buffer object bound to a fixed target.
pub struct Buffer {
    backend: Rc<dyn GraphicsBackend>,
    handle: Option<BufferHandle>,
    target: BufferTarget,
    byte_len: usize,
}

impl Buffer {
    pub fn new(backend: &Rc<dyn GraphicsBackend>, target: BufferTarget) -> GraphicsResult<Self> {
        let handle = backend.create_buffer()?;
        log::debug!("Created {target:?} buffer {handle:?}");
        Ok(Self {
            backend: Rc::clone(backend),
            handle: Some(handle),
            target,
            byte_len: 0,
        })
    }

    /// The driver handle, or [`GraphicsError::Closed`] once the buffer was closed.
    pub fn handle(&self) -> GraphicsResult<BufferHandle> {
        self.handle.ok_or(GraphicsError::Closed("buffer"))
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Size of the data store in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn backend(&self) -> &Rc<dyn GraphicsBackend> {
        &self.backend
    }

    pub fn bind(&self) -> GraphicsResult<()> {
        self.backend.bind_buffer(self.target, Some(self.handle()?));
        Ok(())
    }

    pub fn unbind(&self) {
        self.backend.bind_buffer(self.target, None);
    }

    /// Bind to an indexed binding point of the buffer's target (uniform or storage blocks).
    pub fn bind_base(&self, index: u32) -> GraphicsResult<()> {
        self.backend
            .bind_buffer_base(self.target, index, Some(self.handle()?));
        Ok(())
    }

    /// Replace the data store with a copy of `data`.
    pub fn data<T: Pod>(&mut self, data: &[T], usage: BufferUsage) -> GraphicsResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.backend
            .buffer_data(self.target, self.handle()?, bytes, usage)?;
        self.byte_len = bytes.len();
        Ok(())
    }

    /// Reallocate the data store to `byte_len` bytes of undefined contents.
    pub fn allocate(&mut self, byte_len: usize, usage: BufferUsage) -> GraphicsResult<()> {
        self.backend
            .buffer_storage(self.target, self.handle()?, byte_len, usage)?;
        self.byte_len = byte_len;
        Ok(())
    }

    /// Overwrite part of the data store, `offset` counted in elements of `T`.
    pub fn sub_data<T: Pod>(&self, offset: usize, data: &[T]) -> GraphicsResult<()> {
        let handle = self.handle()?;
        let size = std::mem::size_of::<T>();
        check_byte_range(offset * size, data.len() * size, self.byte_len, size)?;
        self.backend
            .buffer_sub_data(self.target, handle, offset * size, bytemuck::cast_slice(data))
    }

    /// Map `len` elements of `T` starting at element `offset`.
    ///
    /// The mapping is released when the returned guard is dropped or explicitly unmapped.
    pub fn map_range<T: Pod>(
        &self,
        offset: usize,
        len: usize,
        access: MapAccess,
    ) -> GraphicsResult<MappedRange<'_, T>> {
        let handle = self.handle()?;
        let size = std::mem::size_of::<T>();
        check_byte_range(offset * size, len * size, self.byte_len, size)?;

        let ptr = self
            .backend
            .map_buffer_range(self.target, handle, offset * size, len * size, access)?;
        let range = MappedRange {
            buffer: self,
            handle,
            ptr: ptr.cast::<T>(),
            len,
            access,
            mapped: true,
            _marker: PhantomData,
        };
        if ptr.as_ptr().align_offset(std::mem::align_of::<T>()) != 0 {
            range.unmap()?;
            return Err(GraphicsError::MisalignedMapping(std::any::type_name::<T>()));
        }
        Ok(range)
    }

    /// Delete the buffer object. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Deleting {:?} buffer {handle:?}", self.target);
            self.backend.delete_buffer(handle);
            self.byte_len = 0;
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("byte_len", &self.byte_len)
            .finish()
    }
}

fn check_byte_range(offset: usize, len: usize, size: usize, element: usize) -> GraphicsResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(GraphicsError::OutOfBounds {
            offset: offset / element,
            len: len / element,
            size: size / element,
        }),
    }
}

/// A live mapping of part of a [`Buffer`], unmapped on drop.
pub struct MappedRange<'a, T: Pod> {
    buffer: &'a Buffer,
    handle: BufferHandle,
    ptr: NonNull<T>,
    len: usize,
    access: MapAccess,
    mapped: bool,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T: Pod> MappedRange<'a, T> {
    pub fn access(&self) -> MapAccess {
        self.access
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The mapped elements. Contents of a write-only mapping are undefined until written.
    pub fn as_slice(&self) -> &[T] {
        // The driver keeps `len` elements valid at `ptr` until unmapped, and the borrow of the
        // parent buffer prevents it from being respecified or deleted meanwhile.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> GraphicsResult<&mut [T]> {
        if !self.access.contains(MapAccess::WRITE) {
            return Err(GraphicsError::ReadOnlyView);
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) })
    }

    /// Release the mapping, reporting driver failure.
    pub fn unmap(mut self) -> GraphicsResult<()> {
        self.mapped = false;
        self.buffer
            .backend
            .unmap_buffer(self.buffer.target, self.handle)
    }
}

impl<T: Pod> Drop for MappedRange<'_, T> {
    fn drop(&mut self) {
        if self.mapped {
            if let Err(err) = self
                .buffer
                .backend
                .unmap_buffer(self.buffer.target, self.handle)
            {
                log::warn!("Failed to unmap buffer {:?}: {err}", self.handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn setup() -> (Rc<HeadlessBackend>, Rc<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, backend)
    }

    #[test]
    fn test_data_and_sub_data() {
        let (headless, backend) = setup();
        let mut buffer = Buffer::new(&backend, BufferTarget::Array).unwrap();
        buffer
            .data(&[1.0f32, 2.0, 3.0, 4.0], BufferUsage::StaticDraw)
            .unwrap();
        buffer.sub_data(2, &[9.0f32]).unwrap();

        assert_eq!(buffer.byte_len(), 16);
        assert_eq!(
            headless.buffer_contents::<f32>(buffer.handle().unwrap()),
            Some(vec![1.0, 2.0, 9.0, 4.0])
        );
    }

    #[test]
    fn test_sub_data_out_of_bounds() {
        let (_headless, backend) = setup();
        let mut buffer = Buffer::new(&backend, BufferTarget::Array).unwrap();
        buffer.data(&[0u32; 4], BufferUsage::StaticDraw).unwrap();

        let err = buffer.sub_data(3, &[1u32, 2]).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::OutOfBounds {
                offset: 3,
                len: 2,
                size: 4
            }
        ));
    }

    #[test]
    fn test_mapping_unmaps_on_drop() {
        let (headless, backend) = setup();
        let mut buffer = Buffer::new(&backend, BufferTarget::Array).unwrap();
        buffer.data(&[5u32, 6, 7], BufferUsage::DynamicDraw).unwrap();
        let handle = buffer.handle().unwrap();

        {
            let mut range = buffer.map_range::<u32>(1, 2, MapAccess::READ_WRITE).unwrap();
            assert!(headless.is_mapped(handle));
            assert_eq!(range.as_slice(), &[6, 7]);
            range.as_mut_slice().unwrap()[0] = 60;
        }

        assert!(!headless.is_mapped(handle));
        assert_eq!(headless.buffer_contents::<u32>(handle), Some(vec![5, 60, 7]));
    }

    #[test]
    fn test_read_mapping_is_not_writable() {
        let (_headless, backend) = setup();
        let mut buffer = Buffer::new(&backend, BufferTarget::Array).unwrap();
        buffer.data(&[1u32], BufferUsage::DynamicDraw).unwrap();

        let mut range = buffer.map_range::<u32>(0, 1, MapAccess::READ).unwrap();
        assert!(matches!(
            range.as_mut_slice(),
            Err(GraphicsError::ReadOnlyView)
        ));
        range.unmap().unwrap();
    }

    #[test]
    fn test_close_twice() {
        let (headless, backend) = setup();
        let mut buffer = Buffer::new(&backend, BufferTarget::ElementArray).unwrap();
        buffer.close();
        buffer.close();
        drop(buffer);

        assert_eq!(headless.live_buffers(), 0);
        assert_eq!(headless.stale_deletes(), 0);
    }
}
