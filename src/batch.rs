//! Mesh concatenation.
//!
//! Several meshes are merged into one vertex stream and one index stream so they can be
//! drawn with a single call. Vertices are appended unchanged. Indices are shifted so each
//! source keeps addressing its own vertices: after a source is appended, the running offset
//! grows by that source's highest index plus one (a source without indices adds nothing).
//! The offset therefore follows the indices a source references, not its vertex count.

use crate::error::{GraphicsError, GraphicsResult};
use crate::memory::HostBuffer;
use crate::mesh::{MeshStorage, NativeMesh, ReadPolicy};

/// Total element count across `parts`.
pub fn combined_len<T, P: AsRef<[T]>>(parts: &[P]) -> usize {
    parts.iter().map(|p| p.as_ref().len()).sum()
}

/// Append vertex streams into one direct buffer.
pub fn batch_vertex_buffers<P: AsRef<[f32]>>(parts: &[P]) -> HostBuffer<f32> {
    let mut merged = HostBuffer::zeroed(combined_len(parts));
    let mut position = 0;
    for part in parts {
        let part = part.as_ref();
        merged[position..position + part.len()].copy_from_slice(part);
        position += part.len();
    }
    merged
}

/// Append index streams into one direct buffer, shifting each by the running offset.
pub fn batch_index_buffers<P: AsRef<[u32]>>(parts: &[P]) -> GraphicsResult<HostBuffer<u32>> {
    let mut merged = HostBuffer::zeroed(combined_len(parts));
    let mut position = 0;
    // Widened so advancing past the last part cannot overflow; only emitted indices must fit.
    let mut offset: u64 = 0;
    for part in parts {
        let part = part.as_ref();
        for (slot, &index) in merged[position..position + part.len()].iter_mut().zip(part) {
            *slot = u32::try_from(u64::from(index) + offset)
                .map_err(|_| GraphicsError::IndexOverflow { index, offset })?;
        }
        position += part.len();

        if let Some(&highest) = part.iter().max() {
            offset += u64::from(highest) + 1;
        }
    }
    Ok(merged)
}

/// Indices `0..len`, for drawing unindexed geometry through an element buffer.
pub fn default_index_buffer(len: u32) -> HostBuffer<u32> {
    let mut indices = HostBuffer::zeroed(len as usize);
    for (slot, index) in indices.iter_mut().zip(0..) {
        *slot = index;
    }
    indices
}

/// Copy both streams of every source out through read views.
fn read_sources<S: MeshStorage + ?Sized>(
    sources: &[&S],
) -> GraphicsResult<(Vec<Vec<f32>>, Vec<Vec<u32>>)> {
    let mut vertices = Vec::with_capacity(sources.len());
    let mut indices = Vec::with_capacity(sources.len());
    for (position, mesh) in sources.iter().enumerate() {
        let read = || -> GraphicsResult<(Vec<f32>, Vec<u32>)> {
            let view = mesh.vertices(ReadPolicy::Read)?;
            let vertex_data = view.data().to_vec();
            view.release()?;
            let view = mesh.indices(ReadPolicy::Read)?;
            let index_data = view.data().to_vec();
            view.release()?;
            Ok((vertex_data, index_data))
        };
        let (vertex_data, index_data) = read().map_err(|e| e.at_source(position))?;
        vertices.push(vertex_data);
        indices.push(index_data);
    }
    Ok((vertices, indices))
}

/// Merge `sources` into `destination` and return it.
///
/// Nothing is written to `destination` unless every source could be read.
pub fn concatenate_into<'d, D, S>(
    destination: &'d mut D,
    sources: &[&S],
) -> GraphicsResult<&'d mut D>
where
    D: MeshStorage + ?Sized,
    S: MeshStorage + ?Sized,
{
    let (vertices, indices) = read_sources(sources)?;
    let merged_vertices = batch_vertex_buffers(&vertices);
    let merged_indices = batch_index_buffers(&indices)?;
    log::trace!(
        "Batched {} meshes into {} vertex components and {} indices",
        sources.len(),
        merged_vertices.len(),
        merged_indices.len()
    );
    destination.set_vertices(merged_vertices)?;
    destination.set_indices(merged_indices)?;
    Ok(destination)
}

/// Merge `sources` into a new host-resident mesh.
pub fn batch_meshes<S: MeshStorage + ?Sized>(sources: &[&S]) -> GraphicsResult<NativeMesh> {
    let mut mesh = NativeMesh::new();
    concatenate_into(&mut mesh, sources)?;
    Ok(mesh)
}
