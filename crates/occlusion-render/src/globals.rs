//! Process-wide texture and keyword registry read by the host's lighting.

use std::collections::{HashMap, HashSet};

/// Named textures and enabled keywords published by the occlusion passes.
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    textures: HashMap<&'static str, wgpu::TextureView>,
    keywords: HashSet<&'static str>,
}

impl GlobalRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_texture(&mut self, name: &'static str, view: wgpu::TextureView) {
        self.textures.insert(name, view);
    }

    pub fn clear_texture(&mut self, name: &'static str) {
        self.textures.remove(name);
    }

    /// The texture currently published under `name`.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&wgpu::TextureView> {
        self.textures.get(name)
    }

    pub fn set_keyword(&mut self, name: &'static str, enabled: bool) {
        if enabled {
            self.keywords.insert(name);
        } else {
            self.keywords.remove(name);
        }
    }

    #[must_use]
    pub fn is_keyword_enabled(&self, name: &str) -> bool {
        self.keywords.contains(name)
    }
}
