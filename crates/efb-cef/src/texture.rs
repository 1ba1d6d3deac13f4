//! wgpu texture integration for browser paints.

use crate::compositor::{BlitRegion, TextureTarget};
use crate::geometry::SurfaceDescriptor;
use std::sync::Arc;

/// Panel texture living on the GPU.
///
/// Paint buffers are BGRA, so the texture uses a BGRA format and uploads
/// need no swizzle.
pub struct WgpuTextureTarget {
    queue: Arc<wgpu::Queue>,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl WgpuTextureTarget {
    /// Create a texture sized for `surface`, filled with white.
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface: &SurfaceDescriptor,
        label: Option<&str>,
    ) -> Self {
        let (width, height) = (surface.texture_width, surface.texture_height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let target = Self {
            queue,
            texture,
            view,
            width,
            height,
        };
        target.clear_white();
        target
    }

    fn clear_white(&self) {
        let white = vec![0xFFu8; self.width as usize * self.height as usize * 4];
        let region = BlitRegion {
            dst_x: 0,
            dst_y: 0,
            width: self.width,
            height: self.height,
            src_x: 0,
            src_y: 0,
        };
        self.upload(&region, &white, self.width);
    }

    fn upload(&self, region: &BlitRegion, pixels: &[u8], row_pixels: u32) {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.dst_x,
                    y: region.dst_y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(row_pixels * 4),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Get the texture view for binding.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Get the underlying texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Create a bind group layout for sampling this texture.
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("efb_texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Create a bind group for sampling this texture.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("efb_texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("efb_texture_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }
}

impl TextureTarget for WgpuTextureTarget {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_region(&mut self, region: &BlitRegion, pixels: &[u8], row_pixels: u32) {
        // wgpu requires the data to cover the last row only up to its width.
        let needed = ((region.height as usize - 1) * row_pixels as usize + region.width as usize) * 4;
        if pixels.len() < needed {
            log::warn!("skipping texture upload: {} < {} bytes", pixels.len(), needed);
            return;
        }
        self.upload(region, pixels, row_pixels);
    }
}
