//! Lifecycle of the three intermediate occlusion buffers.

use occlusion_core::{BufferDescriptor, BufferSlot, OcclusionBackend};

struct Allocated<T> {
    texture: T,
    descriptor: BufferDescriptor,
}

/// Owns the final, raw and temp buffers of one camera.
///
/// Buffers are reallocated only when the requested descriptor differs in
/// size, format, sample count or depth bits from the one they were
/// allocated with.
pub struct RenderTargetManager<T> {
    final_buffer: Option<Allocated<T>>,
    raw: Option<Allocated<T>>,
    temp: Option<Allocated<T>>,
    allocations: u64,
}

impl<T> RenderTargetManager<T> {
    pub fn new() -> Self {
        Self {
            final_buffer: None,
            raw: None,
            temp: None,
            allocations: 0,
        }
    }

    fn slot(&self, slot: BufferSlot) -> Option<&Allocated<T>> {
        match slot {
            BufferSlot::Final => self.final_buffer.as_ref(),
            BufferSlot::Raw => self.raw.as_ref(),
            BufferSlot::Temp => self.temp.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: BufferSlot) -> &mut Option<Allocated<T>> {
        match slot {
            BufferSlot::Final => &mut self.final_buffer,
            BufferSlot::Raw => &mut self.raw,
            BufferSlot::Temp => &mut self.temp,
        }
    }

    /// Makes all three buffers match `descriptor`.
    pub fn ensure<B>(&mut self, descriptor: &BufferDescriptor, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        for slot in BufferSlot::ALL {
            let entry = self.slot_mut(slot);
            let stale = entry
                .as_ref()
                .map_or(true, |a| a.descriptor.requires_reallocation(descriptor));

            if stale {
                if let Some(old) = entry.take() {
                    backend.release_texture(old.texture);
                }
                log::debug!(
                    "allocating {} at {}x{}",
                    slot.label(),
                    descriptor.width,
                    descriptor.height
                );
                *entry = Some(Allocated {
                    texture: backend.allocate_texture(descriptor, slot),
                    descriptor: *descriptor,
                });
                self.allocations += 1;
            } else if let Some(allocated) = entry.as_mut() {
                // Sampler state only.
                allocated.descriptor.filter = descriptor.filter;
            }
        }
    }

    /// Frees every owned buffer.
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        let mut released = 0;
        for slot in BufferSlot::ALL {
            if let Some(old) = self.slot_mut(slot).take() {
                backend.release_texture(old.texture);
                released += 1;
            }
        }
        if released > 0 {
            log::debug!("released {released} occlusion buffers");
        }
    }

    /// The buffer in `slot`, if allocated.
    pub fn get(&self, slot: BufferSlot) -> Option<&T> {
        self.slot(slot).map(|a| &a.texture)
    }

    /// The descriptor `slot` was allocated with.
    pub fn descriptor(&self, slot: BufferSlot) -> Option<&BufferDescriptor> {
        self.slot(slot).map(|a| &a.descriptor)
    }

    /// All three buffers, once allocated.
    pub fn buffers(&self) -> Option<(&T, &T, &T)> {
        Some((
            self.get(BufferSlot::Final)?,
            self.get(BufferSlot::Raw)?,
            self.get(BufferSlot::Temp)?,
        ))
    }

    /// Number of live buffers.
    pub fn allocated_count(&self) -> usize {
        BufferSlot::ALL
            .iter()
            .filter(|slot| self.slot(**slot).is_some())
            .count()
    }

    /// Total allocations performed over this manager's lifetime.
    pub fn total_allocations(&self) -> u64 {
        self.allocations
    }
}

impl<T> Default for RenderTargetManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use occlusion_core::{BufferFormat, CameraTargetDescriptor, FilterMode, Resolution};

    fn descriptor(width: u32, height: u32) -> BufferDescriptor {
        let target = CameraTargetDescriptor::new(width, height, BufferFormat::Rgba16Float);
        BufferDescriptor::for_occlusion(&target, Resolution::Full)
    }

    #[test]
    fn test_ensure_allocates_three_buffers() {
        let mut backend = RecordingBackend::new();
        let mut targets = RenderTargetManager::new();
        targets.ensure(&descriptor(640, 480), &mut backend);
        assert_eq!(targets.allocated_count(), 3);
        assert_eq!(backend.live_textures(), 3);
        assert!(targets.buffers().is_some());
    }

    #[test]
    fn test_ensure_same_descriptor_is_noop() {
        let mut backend = RecordingBackend::new();
        let mut targets = RenderTargetManager::new();
        targets.ensure(&descriptor(640, 480), &mut backend);
        let raw = *targets.get(BufferSlot::Raw).unwrap();
        targets.ensure(&descriptor(640, 480), &mut backend);
        assert_eq!(targets.total_allocations(), 3);
        assert_eq!(*targets.get(BufferSlot::Raw).unwrap(), raw);
    }

    #[test]
    fn test_filter_change_does_not_reallocate() {
        let mut backend = RecordingBackend::new();
        let mut targets = RenderTargetManager::new();
        let mut desc = descriptor(64, 64);
        targets.ensure(&desc, &mut backend);
        desc.filter = FilterMode::Point;
        targets.ensure(&desc, &mut backend);
        assert_eq!(targets.total_allocations(), 3);
        assert_eq!(
            targets.descriptor(BufferSlot::Temp).unwrap().filter,
            FilterMode::Point
        );
    }

    #[test]
    fn test_resize_reallocates_and_releases_old() {
        let mut backend = RecordingBackend::new();
        let mut targets = RenderTargetManager::new();
        targets.ensure(&descriptor(640, 480), &mut backend);
        targets.ensure(&descriptor(800, 600), &mut backend);
        assert_eq!(targets.total_allocations(), 6);
        assert_eq!(backend.live_textures(), 3);
        assert_eq!(targets.descriptor(BufferSlot::Final).unwrap().width, 800);
    }

    #[test]
    fn test_release_frees_everything() {
        let mut backend = RecordingBackend::new();
        let mut targets = RenderTargetManager::new();
        targets.ensure(&descriptor(32, 32), &mut backend);
        targets.release(&mut backend);
        assert_eq!(targets.allocated_count(), 0);
        assert_eq!(backend.live_textures(), 0);
        // Releasing twice is harmless
        targets.release(&mut backend);
        assert_eq!(backend.live_textures(), 0);
    }
}
