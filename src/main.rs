use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

mod config;
mod rendering;
mod simulation;

use config::Config;
use rendering::{FrameContext, RenderError, Renderer};
use simulation::Scene;

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default(std::env::args().nth(1).as_deref());

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Wristrun")
        .with_inner_size(winit::dpi::PhysicalSize::new(
            config.window_width,
            config.window_height,
        ))
        .build(&event_loop)?;
    let window = Arc::new(window);

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), &config))?;
    let mut scene = Scene::new(&config, renderer.aspect());
    let mut frame = FrameContext::new();

    log::info!("Wristrun started");
    log::info!("Space: raise watch | click thirds: switch screens | R: run");
    log::info!("F: free camera (WASD + mouse, E/Q vertical) | Esc: quit");

    let frame_budget = config
        .frame_cap
        .map(|cap| Duration::from_secs_f64(1.0 / cap.max(1) as f64));
    let mut frame_started = Instant::now();

    let win_id = window.id();
    let win_clone = window.clone();
    event_loop.run(move |event, target| match event {
        Event::WindowEvent { event, window_id } if window_id == win_id => {
            match &event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                    {
                        target.exit();
                    }
                }
                WindowEvent::Resized(size) => renderer.resize(*size),
                WindowEvent::RedrawRequested => {
                    scene.update();
                    scene.render(&mut frame);
                    match renderer.render(&frame) {
                        Ok(()) => {}
                        Err(RenderError::Surface(
                            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                        )) => renderer.resize(renderer.size),
                        Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                            log::error!("out of GPU memory, exiting");
                            target.exit();
                        }
                        Err(e) => log::warn!("frame dropped: {e}"),
                    }
                    win_clone.set_cursor_visible(scene.watch_focused());

                    // Optional pacing: sleep away the rest of the frame
                    // budget. A rate cap only; no state depends on it.
                    if let Some(budget) = frame_budget {
                        let elapsed = frame_started.elapsed();
                        if elapsed < budget {
                            std::thread::sleep(budget - elapsed);
                        }
                        frame_started = Instant::now();
                    }
                }
                _ => {}
            }
            scene.handle_window_event(&event);
        }
        Event::DeviceEvent { event, .. } => scene.handle_device_event(&event),
        Event::AboutToWait => win_clone.request_redraw(),
        _ => {}
    })?;

    Ok(())
}
