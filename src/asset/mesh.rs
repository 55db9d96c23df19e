use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::asset::SubMesh;
use crate::renderer::texture::Texture;
use crate::renderer::uniforms::MaterialUniform;
use crate::scene::Model;

/// Shared state needed to build material bind groups.
pub struct MaterialBinding<'a> {
    pub layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
    pub fallback: &'a Texture,
}

/// GPU buffers of one submesh. Positions, normals and texcoords live in
/// separate streams so the shadow and irradiance stages bind positions only.
pub struct GpuSubMesh {
    pub name: String,
    position_buffer: wgpu::Buffer,
    normal_buffer: wgpu::Buffer,
    texcoord_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl GpuSubMesh {
    pub fn upload(
        device: &wgpu::Device,
        model: &Model,
        mesh: &SubMesh,
        textures: &[Option<Texture>],
        binding: &MaterialBinding<'_>,
    ) -> Self {
        let label = format!("{}:{}", model.name, mesh.name);

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} positions")),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} normals")),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        // Layouts without texcoords still feed the material stage's third stream.
        let zero_texcoords;
        let texcoords: &[Vec2] = match &mesh.texcoords {
            Some(texcoords) => texcoords,
            None => {
                zero_texcoords = vec![Vec2::ZERO; mesh.vertex_count()];
                &zero_texcoords
            }
        };
        let texcoord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} texcoords")),
            contents: bytemuck::cast_slice(texcoords),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let material = model.material(mesh.material);
        let textured = mesh.texcoords.is_some();
        let (ambient, diffuse) = if textured {
            (
                bound_texture(model, textures, material.ambient_texture),
                bound_texture(model, textures, material.diffuse_texture),
            )
        } else {
            (None, None)
        };

        let uniform = MaterialUniform::new(&material, ambient.is_some(), diffuse.is_some());
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} material")),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let ambient_view = &ambient.unwrap_or(binding.fallback).view;
        let diffuse_view = &diffuse.unwrap_or(binding.fallback).view;
        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} material")),
            layout: binding.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(ambient_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(diffuse_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(binding.sampler),
                },
            ],
        });

        Self {
            name: mesh.name.clone(),
            position_buffer,
            normal_buffer,
            texcoord_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            material_buffer,
            material_bind_group,
        }
    }

    pub fn position_buffer(&self) -> &wgpu::Buffer {
        &self.position_buffer
    }

    pub fn normal_buffer(&self) -> &wgpu::Buffer {
        &self.normal_buffer
    }

    pub fn texcoord_buffer(&self) -> &wgpu::Buffer {
        &self.texcoord_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn material_bind_group(&self) -> &wgpu::BindGroup {
        &self.material_bind_group
    }

    fn destroy(&self) {
        self.position_buffer.destroy();
        self.normal_buffer.destroy();
        self.texcoord_buffer.destroy();
        self.index_buffer.destroy();
        self.material_buffer.destroy();
    }
}

fn bound_texture<'a>(
    model: &Model,
    textures: &'a [Option<Texture>],
    index: Option<usize>,
) -> Option<&'a Texture> {
    let index = index?;
    let texture = textures.get(index).and_then(Option::as_ref);
    if texture.is_none() {
        log::warn!(
            "Model {}: texture {} unavailable, using constant colour",
            model.name,
            index
        );
    }
    texture
}

/// Everything uploaded for one model identity.
pub struct GpuModel {
    pub name: String,
    pub submeshes: Vec<GpuSubMesh>,
    textures: Vec<Option<Texture>>,
}

impl GpuModel {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &Model,
        binding: &MaterialBinding<'_>,
    ) -> Self {
        let textures: Vec<Option<Texture>> = model
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                Texture::from_image(device, queue, image, &format!("{} image {}", model.name, index))
            })
            .collect();

        let submeshes: Vec<GpuSubMesh> = model
            .groups
            .iter()
            .filter_map(|group| SubMesh::build(group, model))
            .map(|mesh| GpuSubMesh::upload(device, model, &mesh, &textures, binding))
            .collect();

        if submeshes.is_empty() {
            log::warn!("Model {} has no drawable geometry", model.name);
        }
        log::info!(
            "Uploaded model {}: {} submeshes, {} textures",
            model.name,
            submeshes.len(),
            textures.iter().flatten().count()
        );

        Self {
            name: model.name.clone(),
            submeshes,
            textures,
        }
    }

    pub fn destroy(&self) {
        for submesh in &self.submeshes {
            submesh.destroy();
        }
        for texture in self.textures.iter().flatten() {
            texture.destroy();
        }
    }
}
