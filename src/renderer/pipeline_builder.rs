// src/renderer/pipeline_builder.rs

/// Sums colour and alpha of every light draw into the target.
pub const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Builder for the stage pipelines.
///
/// Defaults: `vs_main`/`fs_main`, triangle lists, no culling (model files
/// use either winding), single sample.
pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    label: &'a str,
    layout: wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    vertex_entry: &'a str,
    fragment_entry: Option<&'a str>,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'a>>,
    color_targets: Vec<Option<wgpu::ColorTargetState>>,
    depth_stencil: Option<wgpu::DepthStencilState>,
}

impl<'a> PipelineBuilder<'a> {
    /// Creates the pipeline layout from `bind_layouts`, in group order.
    pub fn new(
        device: &'a wgpu::Device,
        label: &'a str,
        shader: &'a wgpu::ShaderModule,
        bind_layouts: &[&wgpu::BindGroupLayout],
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: bind_layouts,
            push_constant_ranges: &[],
        });
        Self {
            device,
            label,
            layout,
            shader,
            vertex_entry: "vs_main",
            fragment_entry: Some("fs_main"),
            vertex_buffers: Vec::new(),
            color_targets: Vec::new(),
            depth_stencil: None,
        }
    }

    pub fn with_fragment_entry(mut self, entry: &'a str) -> Self {
        self.fragment_entry = Some(entry);
        self
    }

    /// No fragment stage; only depth is written.
    pub fn depth_only(mut self) -> Self {
        self.fragment_entry = None;
        self
    }

    pub fn with_vertex_buffer(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_buffers.push(layout);
        self
    }

    pub fn with_color_target(mut self, format: wgpu::TextureFormat, blend: Option<wgpu::BlendState>) -> Self {
        self.color_targets.push(Some(wgpu::ColorTargetState {
            format,
            blend,
            write_mask: wgpu::ColorWrites::ALL,
        }));
        self
    }

    /// One unblended target per format, bound at consecutive locations.
    pub fn with_color_targets(self, formats: &[wgpu::TextureFormat]) -> Self {
        formats
            .iter()
            .fold(self, |builder, format| builder.with_color_target(*format, None))
    }

    pub fn with_depth(mut self, format: wgpu::TextureFormat, depth_write: bool, compare: wgpu::CompareFunction) -> Self {
        self.depth_stencil = Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: depth_write,
            depth_compare: compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });
        self
    }

    pub fn build(self) -> wgpu::RenderPipeline {
        log::debug!(
            "Creating pipeline {} ({} vertex streams, {} colour targets)",
            self.label,
            self.vertex_buffers.len(),
            self.color_targets.len()
        );
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: self.shader,
                entry_point: Some(self.vertex_entry),
                buffers: &self.vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: self.fragment_entry.map(|entry| wgpu::FragmentState {
                module: self.shader,
                entry_point: Some(entry),
                targets: &self.color_targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: self.depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_blend_keeps_destination() {
        assert_eq!(ADDITIVE.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(ADDITIVE.alpha.operation, wgpu::BlendOperation::Add);
    }
}
