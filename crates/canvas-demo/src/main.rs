//! Runnable demo entrypoint exercising the end-to-end scenarios a reviewer would
//! drive by hand: connect a browser to this process, pick `--scenario`, and watch
//! the matching command sequence go out over the wire.

use anyhow::Result;
use canvas_server::{Args as ServerArgs, Color, Listener, ServerConfig, SessionContext};
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "canvas-demo", version, about = "canvas-server scenario runner")]
struct Args {
    #[command(flatten)]
    server: ServerArgs,
    /// Which end-to-end scenario to run for each connecting client.
    #[arg(long, value_enum, default_value = "s1")]
    scenario: Scenario,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Scenario {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("canvas-server.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "canvas-server.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();

    let config = ServerConfig::from_env_and_file(&args.server)?;
    let listener = Listener::bind(&config).await?;
    info!(target: "server.accept", scenario = ?args.scenario, "ready");

    let scenario = args.scenario;
    listener
        .serve(move |ctx| run_scenario(scenario, ctx))
        .await
}

async fn run_scenario(scenario: Scenario, mut ctx: SessionContext<TcpStream>) -> Result<()> {
    match scenario {
        Scenario::S1 => scenario_static_rect(&mut ctx).await,
        Scenario::S2 => scenario_animation_quit(&mut ctx).await,
        Scenario::S3 => scenario_mouse_down(&mut ctx).await,
        Scenario::S4 => scenario_text_measurement(&mut ctx).await,
        Scenario::S5 => scenario_image_load_and_draw(&mut ctx).await,
        Scenario::S6 => scenario_release_after_use(&mut ctx).await,
    }
}

/// S1 — set a fill color, fill one rect, flush once.
async fn scenario_static_rect(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    let draw = ctx.draw_context();
    draw.set_fill_style_color(Color::rgba(200, 0, 0, 255));
    draw.fill_rect(10.0, 10.0, 50.0, 50.0);
    draw.flush().await
}

/// S2 — clear the canvas every 500ms until the client disconnects.
async fn scenario_animation_quit(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    let quit = ctx.quit_signal();
    loop {
        tokio::select! {
            _ = quit.wait() => {
                info!(target: "server.accept", "animation_quit");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                let draw = ctx.draw_context();
                draw.clear_rect(0.0, 0.0, 800.0, 600.0);
                draw.flush().await?;
            }
        }
    }
}

/// S3 — read exactly one forwarded input event and log its fields.
async fn scenario_mouse_down(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    if let Some(event) = ctx.next_event().await {
        info!(target: "server.accept", ?event, "mouse_event_received");
    }
    Ok(())
}

/// S4 — a blocking query followed by a normal draw call.
async fn scenario_text_measurement(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    let draw = ctx.draw_context();
    draw.set_font("16px sans-serif");
    let metrics = draw.measure_text("hi").await?;
    info!(target: "server.accept", width = metrics.width, "measured");
    draw.fill_rect(0.0, 0.0, metrics.width, 20.0);
    draw.flush().await
}

/// S5 — the create+draw pair goes out before the image-loaded reply can arrive.
async fn scenario_image_load_and_draw(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    let draw = ctx.draw_context();
    let image = draw.load_image("x.png")?;
    draw.draw_image(&image, 0.0, 0.0);
    draw.flush().await?;

    let outcome = draw.wait_loaded(&image).await?;
    info!(target: "server.accept", ok = outcome.ok, width = outcome.width, "image_loaded");
    Ok(())
}

/// S6 — gradient is created, used, and released in one buffered frame.
async fn scenario_release_after_use(ctx: &mut SessionContext<TcpStream>) -> Result<()> {
    let draw = ctx.draw_context();
    let gradient = draw.create_linear_gradient(0.0, 0.0, 50.0, 50.0)?;
    draw.add_color_stop(&gradient, 0.0, Color::BLACK);
    draw.add_color_stop(&gradient, 1.0, Color::WHITE);
    draw.set_fill_style_gradient(&gradient);
    draw.fill_rect(0.0, 0.0, 50.0, 50.0);
    drop(gradient);
    draw.flush().await
}
