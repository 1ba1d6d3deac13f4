mod host;

use anyhow::{anyhow, Result};
use efb::cef::{ClickPhase, DrawQuad, PanelGeometry, ShimEngine, WgpuTextureTarget};
use efb::config::EfbConfig;
use host::DesktopHost;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::ModifiersState;
use winit::window::WindowBuilder;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
    shade: f32,
}

/// Quad corners in clip space. Host pixels count up from the bottom left,
/// like clip space.
fn quad_vertices(quad: &DrawQuad, size: PhysicalSize<u32>) -> [Vertex; 4] {
    let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
    quad.vertices().map(|v| Vertex {
        pos: [v.position[0] / w * 2.0 - 1.0, v.position[1] / h * 2.0 - 1.0],
        uv: v.tex_coords,
        shade: quad.brightness,
    })
}

/// Window cursor to normalized panel coordinates.
fn panel_point(
    cursor: PhysicalPosition<f64>,
    size: PhysicalSize<u32>,
    panel: &PanelGeometry,
) -> (f32, f32) {
    let host_x = cursor.x as f32;
    let host_y = size.height as f32 - cursor.y as f32;
    (
        (host_x - panel.x) / panel.width,
        (host_y - panel.y) / panel.height,
    )
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let mut config = EfbConfig::load();
    if let Some(url) = std::env::args().find_map(|a| a.strip_prefix("--efb-url=").map(String::from))
    {
        config.browser.homepage = url;
    }

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("EFB")
        .with_inner_size(PhysicalSize::new(1024, 640))
        .build(&event_loop)?;
    let window = Arc::new(window);
    let size = window.inner_size();

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(window.clone())?;
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        force_fallback_adapter: false,
        compatible_surface: Some(&surface),
    }))
    .ok_or_else(|| anyhow!("no suitable adapter"))?;
    log::info!("using adapter: {:?}", adapter.get_info());

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("efb-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        },
        None,
    ))?;
    let queue = Arc::new(queue);

    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .first()
        .copied()
        .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo),
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };
    surface.configure(&device, &surface_config);

    // Without a configured panel the tablet fills the window.
    let fills_window = config.panel.is_none();
    let window_panel =
        |size: PhysicalSize<u32>| PanelGeometry::new(0.0, 0.0, size.width as f32, size.height as f32);
    let mut builder = efb::session_builder(&config);
    if fills_window {
        builder = builder.with_panel(window_panel(size));
    }

    let engine = Rc::new(RefCell::new(ShimEngine::with_library_path(
        config.engine.shim_path.as_deref(),
    )?));
    let mut session = builder.initialize(engine, DesktopHost::new(window.clone()), |surface| {
        Ok(WgpuTextureTarget::new(
            &device,
            queue.clone(),
            surface,
            Some("efb-panel-texture"),
        ))
    })?;

    let texture_bgl = WgpuTextureTarget::create_bind_group_layout(&device);
    let texture_bind_group = session
        .texture()
        .map(|target| target.create_bind_group(&device, &texture_bgl))
        .ok_or_else(|| anyhow!("panel texture missing"))?;

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("efb-quad-shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("efb-pipeline-layout"),
        bind_group_layouts: &[&texture_bgl],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("efb-quad-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x2,
                    1 => Float32x2,
                    2 => Float32,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("efb-quad-vertices"),
        contents: bytemuck::cast_slice(&[Vertex {
            pos: [0.0; 2],
            uv: [0.0; 2],
            shade: 0.0,
        }; 4]),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });

    log::info!("efb-demo: opening {}", config.browser.homepage);
    session.set_visible(true);

    let mut cursor = PhysicalPosition::new(0.0, 0.0);
    let mut dragging = false;
    let mut modifiers = ModifiersState::empty();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                let outcome = session.destroy();
                log::info!("browser shut down: {outcome:?}");
                elwt.exit();
            }
            WindowEvent::Resized(new_size) => {
                surface_config.width = new_size.width.max(1);
                surface_config.height = new_size.height.max(1);
                surface.configure(&device, &surface_config);
                if fills_window {
                    session.set_panel(window_panel(new_size));
                }
            }
            WindowEvent::Focused(false) => session.host_focus_lost(),
            WindowEvent::ModifiersChanged(state) => modifiers = state.state(),
            WindowEvent::CursorMoved { position, .. } => {
                cursor = position;
                let (x, y) = panel_point(cursor, window.inner_size(), session.panel());
                if dragging {
                    session.click(x, y, ClickPhase::Drag);
                } else {
                    session.mouse_move(x, y);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = panel_point(cursor, window.inner_size(), session.panel());
                let phase = match state {
                    ElementState::Pressed => ClickPhase::Down,
                    ElementState::Released => ClickPhase::Up,
                };
                dragging = phase == ClickPhase::Down && session.click(x, y, phase);
                if phase == ClickPhase::Up {
                    session.click(x, y, phase);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = panel_point(cursor, window.inner_size(), session.panel());
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(dx, dy) => (dx as i32, dy as i32),
                    MouseScrollDelta::PixelDelta(pos) => ((pos.x / 40.0) as i32, (pos.y / 40.0) as i32),
                };
                if dy != 0 {
                    session.scroll(x, y, dy, false);
                }
                if dx != 0 {
                    session.scroll(x, y, dx, true);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some((raw_char, vk, flags)) = host::host_key(&event, modifiers) {
                    session.key(raw_char, vk, flags);
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            session.update();

            let frame = match surface.get_current_texture() {
                Ok(frame) => frame,
                Err(err) => {
                    log::debug!("surface lost: {err}");
                    surface.configure(&device, &surface_config);
                    return;
                }
            };
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("efb-encoder"),
            });

            let quad = session.draw();
            if let Some(quad) = &quad {
                let vertices = quad_vertices(quad, window.inner_size());
                queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&vertices));
            }

            {
                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("efb-render-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                if quad.is_some() {
                    rpass.set_pipeline(&pipeline);
                    rpass.set_bind_group(0, &texture_bind_group, &[]);
                    rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
                    rpass.draw(0..4, 0..1);
                }
            }

            queue.submit(Some(encoder.finish()));
            frame.present();
            window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_maps_bottom_up_into_panel() {
        let panel = PanelGeometry::new(100.0, 40.0, 800.0, 480.0);
        let size = PhysicalSize::new(1000, 600);
        let (x, y) = panel_point(PhysicalPosition::new(500.0, 80.0), size, &panel);
        assert_eq!(x, 0.5);
        assert_eq!(y, 1.0);
    }
}
