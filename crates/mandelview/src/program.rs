//! The fractal render program: pipeline, uniform buffer and full-screen quad.
//!
//! Uniform writes go into a CPU-side [`UniformBlock`] laid out exactly like
//! the shader's uniform struct; [`FractalProgram::draw`] uploads the block
//! once per frame before issuing the quad draw.

use bytemuck::{Pod, Zeroable};
use mandelview_engine::core::RenderTarget;
use wgpu::util::DeviceExt;

pub use crate::error::ProgramError;
pub use crate::shader::{
    compile_program, CompiledShader, ShaderSource, UniformKind, UniformLayout, UniformLocation,
};
use crate::shader::{FRAGMENT_ENTRY, UNIFORM_BINDING, VERTEX_ENTRY};

/// Number of indices in the full-screen quad.
pub const QUAD_INDEX_COUNT: u32 = QUAD_INDICES.len() as u32;

/// Location-addressed uniform writes, the way a bound GPU program exposes them.
pub trait UniformTarget {
    /// `None` when the program has no uniform of that name.
    fn uniform_location(&self, name: &str) -> Option<UniformLocation>;

    fn set_uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32);

    fn set_uniform_1i(&mut self, location: UniformLocation, value: i32);
}

// ── CPU staging block ─────────────────────────────────────────────────────

/// Byte image of the shader's uniform struct.
///
/// Writes whose type does not match the reflected member type are dropped.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let size = layout.buffer_size() as usize;
        Self {
            layout,
            bytes: vec![0; size],
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn read_2f(&self, name: &str) -> Option<[f32; 2]> {
        let loc = self.layout.location(name)?;
        if loc.kind != UniformKind::Vec2F32 {
            return None;
        }
        let range = self.range(loc.offset, 8)?;
        Some(bytemuck::pod_read_unaligned(&self.bytes[range]))
    }

    pub fn read_1i(&self, name: &str) -> Option<i32> {
        let loc = self.layout.location(name)?;
        if loc.kind != UniformKind::I32 {
            return None;
        }
        let range = self.range(loc.offset, 4)?;
        Some(bytemuck::pod_read_unaligned(&self.bytes[range]))
    }

    fn range(&self, offset: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    fn write(&mut self, location: UniformLocation, expected: UniformKind, data: &[u8]) {
        if location.kind != expected {
            log::debug!(
                "uniform write at offset {} skipped: member is {}, value is {}",
                location.offset,
                location.kind,
                expected
            );
            return;
        }
        if let Some(range) = self.range(location.offset, data.len()) {
            self.bytes[range].copy_from_slice(data);
        }
    }
}

impl UniformTarget for UniformBlock {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.layout.location(name)
    }

    fn set_uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.write(location, UniformKind::Vec2F32, bytemuck::cast_slice(&[x, y]));
    }

    fn set_uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.write(location, UniformKind::I32, bytemuck::bytes_of(&value));
    }
}

// ── quad geometry ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── GPU program ───────────────────────────────────────────────────────────

struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: Option<wgpu::BindGroup>,
    ubo: Option<wgpu::Buffer>,
    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
}

/// The bound fractal program.
///
/// Built from a shader that failed to compile or link, the program is
/// *degraded*: it resolves no uniform locations and `draw` records nothing,
/// leaving the cleared frame.
pub struct FractalProgram {
    label: String,
    uniforms: UniformBlock,
    gpu: Option<Pipeline>,
}

impl FractalProgram {
    /// Compiles `source` and creates the GPU objects for `surface_format`.
    ///
    /// Compile and link failures are logged and yield a degraded program.
    pub fn build(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        source: &ShaderSource,
    ) -> Self {
        match compile_program(source) {
            Ok(compiled) => {
                log::info!(
                    "shader {} compiled ({} uniform members, {} bytes)",
                    compiled.source.label,
                    compiled.layout.members.len(),
                    compiled.layout.span
                );
                Self::from_compiled(device, surface_format, &compiled)
            }
            Err(err) => {
                log::error!("{err}");
                Self::degraded(err.label())
            }
        }
    }

    /// A program that draws nothing and exposes no uniforms.
    pub fn degraded(label: &str) -> Self {
        Self {
            label: label.to_string(),
            uniforms: UniformBlock::new(UniformLayout::default()),
            gpu: None,
        }
    }

    pub fn from_compiled(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        compiled: &CompiledShader,
    ) -> Self {
        let uniforms = UniformBlock::new(compiled.layout.clone());

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mandelview fractal shader"),
            source: wgpu::ShaderSource::Wgsl(compiled.source.text.as_str().into()),
        });

        // A shader without a uniform block gets an empty pipeline layout.
        let has_block = !compiled.layout.is_empty();

        let bind_group_layout = has_block.then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mandelview fractal bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(compiled.layout.buffer_size()),
                    },
                    count: None,
                }],
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mandelview fractal pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mandelview fractal pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (ubo, bind_group) = match bind_group_layout.as_ref() {
            Some(bgl) => {
                let ubo = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("mandelview fractal ubo"),
                    size: compiled.layout.buffer_size(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("mandelview fractal bind group"),
                    layout: bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: UNIFORM_BINDING,
                        resource: ubo.as_entire_binding(),
                    }],
                });
                (Some(ubo), Some(bind_group))
            }
            None => (None, None),
        };

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mandelview quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mandelview quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            label: compiled.source.label.clone(),
            uniforms,
            gpu: Some(Pipeline {
                pipeline,
                bind_group,
                ubo,
                quad_vbo,
                quad_ibo,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_degraded(&self) -> bool {
        self.gpu.is_none()
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    /// Uploads the staged uniforms and draws `vertex_count` quad indices
    /// on top of the target's current contents.
    pub fn draw(&self, target: &mut RenderTarget<'_>, vertex_count: u32) {
        let Some(gpu) = self.gpu.as_ref() else { return };

        if let Some(ubo) = gpu.ubo.as_ref() {
            target.queue.write_buffer(ubo, 0, self.uniforms.bytes());
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("mandelview fractal pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&gpu.pipeline);
        if let Some(bind_group) = gpu.bind_group.as_ref() {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        rpass.set_vertex_buffer(0, gpu.quad_vbo.slice(..));
        rpass.set_index_buffer(gpu.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..vertex_count.min(QUAD_INDEX_COUNT), 0, 0..1);
    }
}

impl UniformTarget for FractalProgram {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.uniform_location(name)
    }

    fn set_uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.uniforms.set_uniform_2f(location, x, y);
    }

    fn set_uniform_1i(&mut self, location: UniformLocation, value: i32) {
        self.uniforms.set_uniform_1i(location, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::UniformMember;

    fn viewer_layout() -> UniformLayout {
        compile_program(&ShaderSource::embedded()).unwrap().layout
    }

    // ── staging block ─────────────────────────────────────────────────────

    #[test]
    fn block_is_sized_to_buffer_size() {
        let block = UniformBlock::new(viewer_layout());
        assert_eq!(block.bytes().len(), 32);
        assert!(block.bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn writes_land_at_reflected_offsets() {
        let mut block = UniformBlock::new(viewer_layout());

        let scale = block.uniform_location("u_scale").unwrap();
        let iters = block.uniform_location("u_iterations").unwrap();
        block.set_uniform_2f(scale, 960.0, 720.0);
        block.set_uniform_1i(iters, 256);

        assert_eq!(block.read_2f("u_scale"), Some([960.0, 720.0]));
        assert_eq!(block.read_1i("u_iterations"), Some(256));
        assert_eq!(block.read_2f("u_offset"), Some([0.0, 0.0]));

        let raw: [f32; 2] = bytemuck::pod_read_unaligned(&block.bytes()[8..16]);
        assert_eq!(raw, [960.0, 720.0]);
    }

    #[test]
    fn mismatched_write_is_dropped() {
        let mut block = UniformBlock::new(viewer_layout());
        let offset = block.uniform_location("u_offset").unwrap();

        block.set_uniform_1i(offset, -1);

        assert!(block.bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn out_of_range_location_is_ignored() {
        let layout = UniformLayout {
            span: 16,
            members: vec![UniformMember {
                name: "u_screen".into(),
                offset: 12,
                kind: UniformKind::Vec2F32,
            }],
        };
        let mut block = UniformBlock::new(layout);
        let loc = block.uniform_location("u_screen").unwrap();

        block.set_uniform_2f(loc, 1.0, 2.0);

        assert!(block.bytes().iter().all(|b| *b == 0));
        assert_eq!(block.read_2f("u_screen"), None);
    }

    #[test]
    fn unknown_uniform_has_no_location() {
        let block = UniformBlock::new(viewer_layout());
        assert_eq!(block.uniform_location("u_palette"), None);
    }

    // ── degraded program ──────────────────────────────────────────────────

    #[test]
    fn degraded_program_resolves_nothing() {
        let program = FractalProgram::degraded("broken.wgsl");
        assert!(program.is_degraded());
        assert_eq!(program.label(), "broken.wgsl");
        for name in ["u_offset", "u_scale", "u_iterations", "u_screen"] {
            assert_eq!(program.uniform_location(name), None);
        }
    }
}
