use std::marker::PhantomData;
use std::mem;
use std::num::NonZeroU64;

use bytemuck::Pod;

use crate::renderer::uniforms::aligned_stride;

/// Array of uniform blocks addressed by dynamic offset. Owns its bind group
/// layout and rebuilds its bind group when it grows.
pub struct DynamicUniformBuffer<T: Pod> {
    label: &'static str,
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
    scratch: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicUniformBuffer<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        visibility: wgpu::ShaderStages,
        capacity: usize,
    ) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(mem::size_of::<T>() as u64, alignment);

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<T>() as u64),
                },
                count: None,
            }],
        });

        let capacity = capacity.max(1);
        let buffer = Self::create_buffer(device, label, stride, capacity);
        let bind_group = Self::create_bind_group(device, label, &bind_layout, &buffer);

        Self {
            label,
            buffer,
            bind_group,
            bind_layout,
            stride,
            capacity,
            scratch: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<T>() as u64),
                }),
            }],
        })
    }

    /// Uploads `items` back to back at the aligned stride, growing first if needed.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        if items.len() > self.capacity {
            self.grow(device, items.len());
        }
        if items.is_empty() {
            return;
        }

        self.scratch.clear();
        self.scratch.resize(self.stride as usize * items.len(), 0);
        for (index, item) in items.iter().enumerate() {
            let start = index * self.stride as usize;
            let bytes = bytemuck::bytes_of(item);
            self.scratch[start..start + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &self.scratch);
    }

    fn grow(&mut self, device: &wgpu::Device, required: usize) {
        let new_capacity = required.max(self.capacity * 2);
        log::info!(
            "Growing {} buffer: {} -> {}",
            self.label,
            self.capacity,
            new_capacity
        );
        self.buffer.destroy();
        self.buffer = Self::create_buffer(device, self.label, self.stride, new_capacity);
        self.bind_group = Self::create_bind_group(device, self.label, &self.bind_layout, &self.buffer);
        self.capacity = new_capacity;
    }

    pub fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}
