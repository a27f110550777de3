//! A backend that records commands instead of executing them.
//!
//! Used by the tests and by hosts that want to inspect what the pipeline
//! would issue for a given configuration.

use std::collections::{HashMap, HashSet};

use occlusion_core::{
    Blit, BlitProgram, BlitSource, BlitTarget, BufferDescriptor, BufferSlot, OcclusionBackend,
    OcclusionParams, PermutationId, ShaderPass,
};

/// Opaque texture handle handed out by [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Read or write endpoint of a recorded blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CameraColor,
    Buffer(TextureHandle),
}

/// Program of a recorded blit, with the parameters copied out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordedProgram {
    Occlusion {
        pass: ShaderPass,
        permutation: PermutationId,
        params: OcclusionParams,
    },
    Copy,
}

/// A recorded blit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBlit {
    pub source: Endpoint,
    pub target: Endpoint,
    pub program: RecordedProgram,
    pub label: &'static str,
}

impl RecordedBlit {
    /// The occlusion pass, or `None` for a copy.
    pub fn pass(&self) -> Option<ShaderPass> {
        match self.program {
            RecordedProgram::Occlusion { pass, .. } => Some(pass),
            RecordedProgram::Copy => None,
        }
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Allocate {
        texture: TextureHandle,
        slot: BufferSlot,
        descriptor: BufferDescriptor,
    },
    Release(TextureHandle),
    Blit(RecordedBlit),
    PushScope(&'static str),
    PopScope,
    SetGlobalTexture(&'static str, TextureHandle),
    ClearGlobalTexture(&'static str),
    SetKeyword(&'static str, bool),
}

/// In-memory [`OcclusionBackend`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    commands: Vec<Command>,
    live: HashMap<TextureHandle, (BufferSlot, BufferDescriptor)>,
    globals: HashMap<&'static str, TextureHandle>,
    keywords: HashSet<&'static str>,
    scope_depth: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command recorded since creation or the last [`clear`](Self::clear).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forgets recorded commands; live textures and global state are kept.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Recorded blits, in order.
    pub fn blits(&self) -> impl Iterator<Item = &RecordedBlit> {
        self.commands.iter().filter_map(|c| match c {
            Command::Blit(blit) => Some(blit),
            _ => None,
        })
    }

    /// Occlusion passes in issue order; copies are skipped.
    pub fn passes(&self) -> Vec<ShaderPass> {
        self.blits().filter_map(RecordedBlit::pass).collect()
    }

    pub fn blit_count(&self) -> usize {
        self.blits().count()
    }

    /// Number of allocations recorded.
    pub fn allocation_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Allocate { .. }))
            .count()
    }

    /// Textures allocated and not yet released.
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    /// Slot and descriptor a live texture was allocated for.
    pub fn texture_info(&self, texture: TextureHandle) -> Option<&(BufferSlot, BufferDescriptor)> {
        self.live.get(&texture)
    }

    /// Slot of a live texture.
    pub fn slot_of(&self, texture: TextureHandle) -> Option<BufferSlot> {
        self.live.get(&texture).map(|(slot, _)| *slot)
    }

    pub fn global_texture(&self, name: &str) -> Option<TextureHandle> {
        self.globals.get(name).copied()
    }

    pub fn is_keyword_enabled(&self, name: &str) -> bool {
        self.keywords.contains(name)
    }

    /// Number of scopes currently open.
    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }
}

fn source_endpoint(source: &BlitSource<'_, TextureHandle>) -> Endpoint {
    match source {
        BlitSource::CameraColor => Endpoint::CameraColor,
        BlitSource::Buffer(texture) => Endpoint::Buffer(**texture),
    }
}

fn target_endpoint(target: &BlitTarget<'_, TextureHandle>) -> Endpoint {
    match target {
        BlitTarget::CameraColor => Endpoint::CameraColor,
        BlitTarget::Buffer(texture) => Endpoint::Buffer(**texture),
    }
}

impl OcclusionBackend for RecordingBackend {
    type Texture = TextureHandle;

    fn allocate_texture(&mut self, descriptor: &BufferDescriptor, slot: BufferSlot) -> TextureHandle {
        let texture = TextureHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(texture, (slot, *descriptor));
        self.commands.push(Command::Allocate {
            texture,
            slot,
            descriptor: *descriptor,
        });
        texture
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.live.remove(&texture).is_none() {
            log::warn!("release of unknown texture {texture:?}");
        }
        self.commands.push(Command::Release(texture));
    }

    fn blit(&mut self, blit: &Blit<'_, TextureHandle>) {
        let program = match blit.program {
            BlitProgram::Occlusion {
                pass,
                permutation,
                params,
            } => RecordedProgram::Occlusion {
                pass,
                permutation,
                params: *params,
            },
            BlitProgram::Copy => RecordedProgram::Copy,
        };
        self.commands.push(Command::Blit(RecordedBlit {
            source: source_endpoint(&blit.source),
            target: target_endpoint(&blit.target),
            program,
            label: blit.label,
        }));
    }

    fn push_scope(&mut self, label: &'static str) {
        self.scope_depth += 1;
        self.commands.push(Command::PushScope(label));
    }

    fn pop_scope(&mut self) {
        self.scope_depth = self.scope_depth.saturating_sub(1);
        self.commands.push(Command::PopScope);
    }

    fn set_global_texture(&mut self, name: &'static str, texture: &TextureHandle) {
        self.globals.insert(name, *texture);
        self.commands.push(Command::SetGlobalTexture(name, *texture));
    }

    fn clear_global_texture(&mut self, name: &'static str) {
        self.globals.remove(name);
        self.commands.push(Command::ClearGlobalTexture(name));
    }

    fn set_keyword(&mut self, name: &'static str, enabled: bool) {
        if enabled {
            self.keywords.insert(name);
        } else {
            self.keywords.remove(name);
        }
        self.commands.push(Command::SetKeyword(name, enabled));
    }
}
