use std::{collections::HashMap, sync::Arc};

use anyhow::Result;

/// Owns compiled shader modules keyed by name. Sources are embedded in the
/// binary; compilation happens once at startup.
pub struct ShaderManager {
    device: Arc<wgpu::Device>,
    shader_modules: HashMap<String, wgpu::ShaderModule>,
}

impl ShaderManager {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self {
            device,
            shader_modules: HashMap::new(),
        }
    }

    pub fn load_wgsl_str(&mut self, name: &str, source: &str) -> Result<()> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        self.shader_modules.insert(name.to_string(), module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&wgpu::ShaderModule> {
        self.shader_modules.get(name)
    }
}
