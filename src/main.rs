//! Demo: a main window with a toolbar, a status line and a drawing canvas
//!
//! Ctrl+Q quits. On targets without a native backend the window lives in
//! memory and the demo quits itself after a few seconds.

use std::error::Error;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use guipp::event::handler::KeyDown;
use guipp::{
    BorderLayout, Color, Context, HotKey, KeyState, Rect, ToolkitConfig, WindowClass, keys,
};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ToolkitConfig::from_env()?;
    let mut ctx = Context::new(config)?;
    info!(backend = ctx.backend_name(), scale = ctx.scale().factor(), "starting");

    let main = ctx.create_overlapped(
        WindowClass::main_window(),
        Rect::new(200.0, 150.0, 640.0, 480.0),
        "guipp demo",
    )?;
    let toolbar = ctx.create_child(
        main,
        WindowClass::panel().with_background(Color::from_rgba8(0xE0, 0xE0, 0xE0, 0xFF)),
        Rect::DEF,
    )?;
    let status = ctx.create_child(
        main,
        WindowClass::panel().with_background(Color::from_rgba8(0x30, 0x30, 0x30, 0xFF)),
        Rect::DEF,
    )?;
    let canvas = ctx.create_child(main, WindowClass::control(), Rect::DEF)?;

    ctx.set_layout(
        main,
        BorderLayout::new()
            .top(toolbar, 32.0)
            .bottom(status, 20.0)
            .center(canvas),
    );

    ctx.on_paint(canvas, move |ctx, graphics| {
        let area = ctx.client_geometry(canvas);
        let corner = ctx.last_mouse_down();
        if !corner.is_undefined() {
            graphics.frame_rect(Rect::from_corners(corner, area.center()), Color::BLACK, 1.0);
        }
        graphics.draw_line(area.top_left(), area.bottom_right(), Color::BLACK, 1.0);
    })?;
    ctx.on_left_btn_down(canvas, move |ctx, state, at| {
        info!(?state, ?at, "canvas pressed");
        ctx.invalidate(canvas);
    })?;
    ctx.on_wheel_y(main, |_, step, at| info!(step, ?at, "wheel"))?;
    ctx.on_filtered::<KeyDown>(
        canvas,
        |event| event.key_symbol() == keys::ESCAPE,
        move |ctx, _| ctx.redraw(canvas),
    )?;
    ctx.on_size(main, |_, size| info!(?size, "main window resized"))?;
    ctx.on_destroy(main, |_| info!("main window destroyed"))?;

    ctx.register_hot_key(HotKey::new(keys::Q, KeyState::CONTROL), None, |ctx| {
        info!("quit requested");
        ctx.quit_main_loop();
    })?;

    ctx.set_visible(main, true);
    ctx.set_focus(canvas);

    if ctx.backend_name() == "headless" {
        let handle = ctx.main_thread_handle();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(3));
            handle.run_on_main(|ctx| {
                info!("demo timeout");
                ctx.quit_main_loop();
            });
        });
    }

    ctx.run_main_loop();
    Ok(())
}
