//! Generational resource cache.
//!
//! Two lifetimes:
//! - shaders and programs are content-addressed by their exact source text
//!   and stamped with the generation that last created or reused them;
//! - everything else is tracked in a flat list and dropped on every reset.

use std::collections::HashMap;

use tracing::debug;

use crate::resources::{ProgramId, ResourceId, ShaderId};
use crate::types::ShaderStage;

#[derive(Debug, Clone, Copy)]
struct Stamped<T> {
    id: T,
    generation: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub generation: u64,
    pub cached_shaders: usize,
    pub cached_programs: usize,
    pub tracked: usize,
    pub shader_hits: u64,
    pub program_hits: u64,
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    generation: u64,
    shaders: HashMap<(ShaderStage, String), Stamped<ShaderId>>,
    programs: HashMap<(String, String), Stamped<ProgramId>>,
    tracked: Vec<ResourceId>,
    shader_hits: u64,
    program_hits: u64,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a shader by source, stamping it on a hit.
    pub fn shader(&mut self, stage: ShaderStage, source: &str) -> Option<ShaderId> {
        let generation = self.generation;
        let entry = self.shaders.get_mut(&(stage, source.to_string()))?;
        entry.generation = generation;
        self.shader_hits += 1;
        Some(entry.id)
    }

    pub fn insert_shader(&mut self, stage: ShaderStage, source: &str, id: ShaderId) {
        self.shaders.insert(
            (stage, source.to_string()),
            Stamped {
                id,
                generation: self.generation,
            },
        );
    }

    /// Look up a program by its two sources, stamping it on a hit.
    pub fn program(&mut self, vertex_source: &str, fragment_source: &str) -> Option<ProgramId> {
        let generation = self.generation;
        let entry = self
            .programs
            .get_mut(&(vertex_source.to_string(), fragment_source.to_string()))?;
        entry.generation = generation;
        self.program_hits += 1;
        Some(entry.id)
    }

    pub fn insert_program(&mut self, vertex_source: &str, fragment_source: &str, id: ProgramId) {
        self.programs.insert(
            (vertex_source.to_string(), fragment_source.to_string()),
            Stamped {
                id,
                generation: self.generation,
            },
        );
    }

    /// Track a resource that is dropped on the next reset.
    pub fn track(&mut self, id: ResourceId) {
        self.tracked.push(id);
    }

    /// Stop caching or tracking `id` (it was deleted explicitly).
    pub fn forget(&mut self, id: ResourceId) {
        match id {
            ResourceId::Shader(shader) => self.shaders.retain(|_, e| e.id != shader),
            ResourceId::Program(program) => self.programs.retain(|_, e| e.id != program),
            other => self.tracked.retain(|t| *t != other),
        }
    }

    /// Start a new generation and return everything that no longer survives.
    ///
    /// Cached entries stamped before `generation - keep_last` are evicted;
    /// tracked resources are always returned. Programs come before shaders,
    /// and tracked resources in reverse creation order.
    pub fn advance(&mut self, keep_last: u64) -> Vec<ResourceId> {
        self.generation += 1;
        let cutoff = self.generation.saturating_sub(keep_last);

        let mut evicted: Vec<ResourceId> = self.tracked.drain(..).rev().collect();
        let mut programs: Vec<ProgramId> = Vec::new();
        self.programs.retain(|_, e| {
            let keep = e.generation >= cutoff;
            if !keep {
                programs.push(e.id);
            }
            keep
        });
        let mut shaders: Vec<ShaderId> = Vec::new();
        self.shaders.retain(|_, e| {
            let keep = e.generation >= cutoff;
            if !keep {
                shaders.push(e.id);
            }
            keep
        });
        programs.sort();
        shaders.sort();
        evicted.extend(programs.into_iter().map(ResourceId::Program));
        evicted.extend(shaders.into_iter().map(ResourceId::Shader));

        debug!(
            generation = self.generation,
            cutoff,
            evicted = evicted.len(),
            "advanced resource generation"
        );
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            generation: self.generation,
            cached_shaders: self.shaders.len(),
            cached_programs: self.programs.len(),
            tracked: self.tracked.len(),
            shader_hits: self.shader_hits,
            program_hits: self.program_hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Registry, Shader, TextureId};
    use glkit_webgl::WebGLObject;

    fn shader_ids(n: usize) -> Vec<ShaderId> {
        let mut registry = Registry::new();
        (0..n)
            .map(|i| {
                registry.insert_shader(Shader {
                    name: format!("s{i}"),
                    stage: ShaderStage::Vertex,
                    source: String::new(),
                    handle: WebGLObject::from_raw(i as u32 + 1),
                })
            })
            .collect()
    }

    #[test]
    fn test_hit_returns_same_id() {
        let ids = shader_ids(1);
        let mut cache = ResourceCache::new();
        cache.insert_shader(ShaderStage::Vertex, "void main() {}", ids[0]);

        assert_eq!(cache.shader(ShaderStage::Vertex, "void main() {}"), Some(ids[0]));
        assert_eq!(cache.shader(ShaderStage::Fragment, "void main() {}"), None);
        assert_eq!(cache.shader(ShaderStage::Vertex, "void main() { }"), None);
        assert_eq!(cache.stats().shader_hits, 1);
    }

    #[test]
    fn test_keep_zero_evicts_everything() {
        let ids = shader_ids(1);
        let mut cache = ResourceCache::new();
        cache.insert_shader(ShaderStage::Vertex, "a", ids[0]);

        let evicted = cache.advance(0);
        assert_eq!(evicted, vec![ResourceId::Shader(ids[0])]);
        assert_eq!(cache.stats().cached_shaders, 0);
    }

    #[test]
    fn test_keep_one_retains_previous_generation() {
        let ids = shader_ids(1);
        let mut cache = ResourceCache::new();
        cache.insert_shader(ShaderStage::Vertex, "a", ids[0]);

        assert!(cache.advance(1).is_empty());
        // not reused during generation 1, so the next reset drops it
        assert_eq!(cache.advance(1), vec![ResourceId::Shader(ids[0])]);
    }

    #[test]
    fn test_reuse_restamps() {
        let ids = shader_ids(1);
        let mut cache = ResourceCache::new();
        cache.insert_shader(ShaderStage::Vertex, "a", ids[0]);
        cache.advance(1);
        cache.shader(ShaderStage::Vertex, "a");

        assert!(cache.advance(1).is_empty());
        assert_eq!(cache.generation(), 2);
    }

    #[test]
    fn test_tracked_never_survive() {
        let mut registry = Registry::new();
        let texture = registry.insert_renderbuffer(crate::resources::Renderbuffer {
            name: "rb".into(),
            format: crate::types::TextureFormat::Depth16,
            width: 1,
            height: 1,
            samples: 0,
            handle: WebGLObject::from_raw(1),
        });
        let mut cache = ResourceCache::new();
        cache.track(texture.into());

        assert_eq!(cache.advance(10), vec![ResourceId::Renderbuffer(texture)]);
        assert_eq!(cache.stats().tracked, 0);
    }

    #[test]
    fn test_forget_untracks() {
        let mut registry = Registry::new();
        let id: TextureId = registry.insert_texture(crate::resources::Texture {
            name: "t".into(),
            target: crate::types::TextureTarget::Texture2D,
            format: crate::types::TextureFormat::Rgba8,
            width: 1,
            height: 1,
            depth: 1,
            levels: 1,
            handle: WebGLObject::from_raw(1),
        });
        let mut cache = ResourceCache::new();
        cache.track(id.into());
        cache.forget(id.into());
        assert!(cache.advance(0).is_empty());
    }
}
