//! penplot: turn raster images into sine-wave pen-plotter toolpaths.
//!
//! Generates a brightness-modulated boustrophedon path for a polargraph
//! machine, exports it, renders previews, and simulates the plot frame by
//! frame, optionally under interactive control.
//!
//! # Usage
//!
//! ```text
//! penplot generate photo.png --svg photo.svg --gcode photo.gcode
//! penplot render photo.png -o preview.png --scale 2
//! penplot simulate photo.png --speed 80 --interactive -o plotted.png
//! penplot ports
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;
mod interactive;
mod logging;

use std::path::{Path as FsPath, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::Receiver;
use penplot_export::{GcodeMetadata, SvgMetadata};
use penplot_io::{RasterSurface, SerialLink};
use penplot_pipeline::diagnostics::Clock;
use penplot_pipeline::{MachineBounds, ProcessResult};
use penplot_playback::surface::{self, DrawIntent, Scene};
use penplot_playback::{PlaybackState, Session};
use web_time::Instant;

use crate::config::PlotterConfig;
use crate::interactive::Command as Input;

/// Sine-wave toolpaths for polargraph pen plotters.
#[derive(Parser)]
#[command(name = "penplot", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct GlobalArgs {
    /// JSON configuration file; flags below override its values.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Machine width in mm.
    #[arg(long, global = true, value_name = "MM")]
    machine_width: Option<f64>,

    /// Machine height in mm.
    #[arg(long, global = true, value_name = "MM")]
    machine_height: Option<f64>,

    /// Distance between scan passes in mm.
    #[arg(long, global = true, value_name = "MM")]
    line_spacing: Option<u32>,

    /// Horizontal distance between samples in mm.
    #[arg(long, global = true, value_name = "MM")]
    resolution: Option<u32>,

    /// Log at debug level (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a toolpath and write it as SVG and/or G-code.
    Generate {
        /// Input image (PNG, JPEG, BMP, WebP).
        image: PathBuf,

        /// Write the path as SVG.
        #[arg(long, value_name = "FILE")]
        svg: Option<PathBuf>,

        /// Write the path as G-code.
        #[arg(long, value_name = "FILE")]
        gcode: Option<PathBuf>,

        /// Print the result (and diagnostics) as JSON.
        #[arg(long)]
        json: bool,

        /// Time each pipeline stage.
        #[arg(long)]
        diagnostics: bool,
    },

    /// Draw the machine grid, faint image preview and path to a PNG.
    Render {
        /// Input image (PNG, JPEG, BMP, WebP).
        image: PathBuf,

        /// Output PNG.
        #[arg(short, long)]
        output: PathBuf,

        /// Pixels per millimetre.
        #[arg(long, default_value_t = penplot_io::raster::DEFAULT_SCALE)]
        scale: f32,
    },

    /// Simulate plotting the path frame by frame.
    Simulate(SimulateArgs),

    /// List serial ports.
    Ports,
}

#[derive(Args)]
struct SimulateArgs {
    /// Input image (PNG, JPEG, BMP, WebP).
    image: PathBuf,

    /// Playback speed.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    speed: Option<u32>,

    /// Frames per second; 0 runs as fast as possible.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Extra delay per frame in ms at low speed.
    #[arg(long, value_name = "MS")]
    low_speed_delay: Option<u64>,

    /// Serial port to connect to (status only).
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Read control commands from stdin.
    #[arg(short, long)]
    interactive: bool,

    /// Write the final canvas as PNG.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pixels per millimetre for `--output`.
    #[arg(long, default_value_t = penplot_io::raster::DEFAULT_SCALE)]
    scale: f32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.global.verbose)?;

    let config = resolve_config(&cli.global)?;

    match cli.command {
        Command::Generate {
            image,
            svg,
            gcode,
            json,
            diagnostics,
        } => generate(
            &config,
            &image,
            svg.as_deref(),
            gcode.as_deref(),
            json,
            diagnostics,
        ),
        Command::Render {
            image,
            output,
            scale,
        } => render(&config, &image, &output, scale),
        Command::Simulate(args) => simulate(config, &args),
        Command::Ports => ports(),
    }
}

/// Load the config file (if any) and apply flag overrides.
fn resolve_config(global: &GlobalArgs) -> anyhow::Result<PlotterConfig> {
    let mut config = PlotterConfig::load_or_default(global.config.as_deref())?;
    if let Some(width) = global.machine_width {
        config.machine.width = width;
    }
    if let Some(height) = global.machine_height {
        config.machine.height = height;
    }
    if let Some(spacing) = global.line_spacing {
        config.path.line_spacing = spacing;
    }
    if let Some(resolution) = global.resolution {
        config.path.resolution = resolution;
    }
    config.machine.validate()?;
    config.path.validate()?;
    Ok(config)
}

fn read_image(path: &FsPath) -> anyhow::Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read image");
    Ok(bytes)
}

fn stem(path: &FsPath) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("penplot")
}

fn summary(config: &PlotterConfig, result: &ProcessResult) -> String {
    format!(
        "{} points, {}x{} mm region at ({:.1}, {:.1}), line spacing {} mm, resolution {} mm",
        result.path.len(),
        result.region.width,
        result.region.height,
        result.region.origin.x,
        result.region.origin.y,
        config.path.line_spacing,
        config.path.resolution,
    )
}

fn generate(
    config: &PlotterConfig,
    image: &FsPath,
    svg_path: Option<&FsPath>,
    gcode_path: Option<&FsPath>,
    json: bool,
    with_diagnostics: bool,
) -> anyhow::Result<()> {
    let bytes = read_image(image)?;

    let (result, diagnostics) = if with_diagnostics {
        let (result, diagnostics) = penplot_pipeline::process_with_diagnostics(
            &bytes,
            &config.machine,
            &config.path,
            &StdClock,
        )?;
        (result, Some(diagnostics))
    } else {
        let result = penplot_pipeline::process(&bytes, &config.machine, &config.path)?;
        (result, None)
    };

    let description = summary(config, &result);
    tracing::info!("{description}");

    if json {
        let value = serde_json::json!({
            "result": result,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if let Some(diagnostics) = &diagnostics {
        println!("{}", diagnostics.report());
    }

    let config_json = serde_json::to_string(&config.path)?;

    if let Some(path) = svg_path {
        let metadata = SvgMetadata {
            title: Some(stem(image)),
            description: Some(&description),
            config_json: Some(&config_json),
        };
        let svg = penplot_export::to_svg(&result.path, &config.machine, &metadata);
        std::fs::write(path, &svg)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("SVG written to {} ({} bytes)", path.display(), svg.len());
    }

    if let Some(path) = gcode_path {
        let metadata = GcodeMetadata {
            title: Some(stem(image)),
            description: Some(&description),
            timestamp: None,
            config_json: Some(&config_json),
        };
        let gcode = penplot_export::to_gcode(&result.path, &metadata);
        std::fs::write(path, &gcode)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("G-code written to {} ({} bytes)", path.display(), gcode.len());
    }

    Ok(())
}

fn render(
    config: &PlotterConfig,
    image: &FsPath,
    output: &FsPath,
    scale: f32,
) -> anyhow::Result<()> {
    let bytes = read_image(image)?;
    let decoded = penplot_pipeline::decode::decode(&bytes)?;
    let result = penplot_pipeline::process_image(&decoded, &config.machine, &config.path)?;
    tracing::info!("{}", summary(config, &result));

    let mut canvas = RasterSurface::new(&config.machine, scale)?;
    let scene = Scene {
        bounds: &config.machine,
        path: &result.path,
        preview: Some((&decoded, &result.region)),
    };
    surface::draw_base(&mut canvas, &scene);
    canvas
        .save_png(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(
        "Rendered {}x{} px to {}",
        canvas.width(),
        canvas.height(),
        output.display()
    );
    Ok(())
}

/// What the frame loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Frame loop host state: the optional canvas follows the machine size.
struct Host {
    canvas: Option<RasterSurface>,
    scale: f32,
}

impl Host {
    fn draw(&mut self, session: &Session, intents: &[DrawIntent]) {
        if let Some(canvas) = self.canvas.as_mut() {
            session.render(canvas, intents);
        }
    }

    fn resize(&mut self, bounds: &MachineBounds) -> anyhow::Result<()> {
        if self.canvas.is_some() {
            self.canvas = Some(RasterSurface::new(bounds, self.scale)?);
        }
        Ok(())
    }
}

fn simulate(mut config: PlotterConfig, args: &SimulateArgs) -> anyhow::Result<()> {
    if let Some(speed) = args.speed {
        config.playback.speed = speed;
    }
    if let Some(delay) = args.low_speed_delay {
        config.playback.low_speed_delay_ms = Some(delay);
    }
    if let Some(port) = &args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }

    let mut session = Session::new(config.machine, config.path.clone(), &config.playback);
    let mut host = Host {
        canvas: args
            .output
            .as_ref()
            .map(|_| RasterSurface::new(&config.machine, args.scale))
            .transpose()?,
        scale: args.scale,
    };

    // Held for the lifetime of the run so the port stays claimed.
    let _link: Option<SerialLink> = config.serial.port.as_deref().and_then(|port| {
        let (link, status) = penplot_io::connect_with_status(port, config.serial.baud);
        session.set_connection(status);
        link
    });

    let bytes = read_image(&args.image)?;
    let intents = session.load_image(stem(&args.image), &bytes)?;
    host.draw(&session, &intents);

    let commands = if args.interactive {
        println!("{}", interactive::HELP);
        Some(interactive::spawn_stdin_reader())
    } else {
        let intents = session.start().context("cannot start plot")?;
        host.draw(&session, &intents);
        None
    };

    run_frames(&mut session, &mut host, commands.as_ref(), frame_interval(args.fps))?;

    let playback = session.playback();
    tracing::info!(
        state = ?playback.state(),
        index = playback.index(),
        points = session.path().len(),
        "simulation finished"
    );

    if let (Some(canvas), Some(output)) = (&host.canvas, &args.output) {
        canvas
            .save_png(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!("Canvas written to {}", output.display());
    }
    Ok(())
}

/// Wait between frames; rates too small to represent saturate.
fn frame_interval(fps: f64) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::try_from_secs_f64(1.0 / fps).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Drive the session until the plot ends (batch) or the user quits
/// (interactive).
fn run_frames(
    session: &mut Session,
    host: &mut Host,
    commands: Option<&Receiver<Input>>,
    interval: Duration,
) -> anyhow::Result<()> {
    loop {
        if let Some(rx) = commands {
            let mut batch: Vec<Input> = rx.try_iter().collect();
            if batch.is_empty() && session.pending_task().is_none() {
                // Nothing to animate: block until the user acts.
                match rx.recv() {
                    Ok(command) => batch.push(command),
                    Err(_) => return Ok(()),
                }
            }
            for command in batch {
                if apply(session, host, command)? == Flow::Quit {
                    return Ok(());
                }
            }
        }

        let Some(handle) = session.pending_task() else {
            if commands.is_none() {
                return Ok(());
            }
            continue;
        };
        let intents = session.on_frame(handle);
        host.draw(session, &intents);

        let wait = interval + session.frame_delay().unwrap_or_default();
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

fn apply(session: &mut Session, host: &mut Host, command: Input) -> anyhow::Result<Flow> {
    match command {
        Input::Plot => {
            // An empty path is reported on the console; nothing to draw.
            if let Ok(intents) = session.start() {
                host.draw(session, &intents);
            }
        }
        Input::Pause => {
            if session.playback().state() == PlaybackState::Running {
                session.toggle_pause();
            }
        }
        Input::Resume => {
            if session.playback().state() == PlaybackState::Paused {
                session.toggle_pause();
            }
        }
        Input::Stop => {
            let intents = session.stop();
            host.draw(session, &intents);
        }
        Input::Speed(speed) => {
            session.set_speed(speed);
            tracing::info!("Speed set to {}", session.playback().speed());
        }
        Input::Clear => {
            let intents = session.clear();
            host.draw(session, &intents);
        }
        Input::Load(path) => match std::fs::read(&path) {
            Ok(bytes) => {
                if let Ok(intents) = session.load_image(stem(&path), &bytes) {
                    host.draw(session, &intents);
                }
            }
            Err(e) => tracing::warn!("failed to read {}: {e}", path.display()),
        },
        Input::Size(width, height) => match session.set_machine_size(width, height) {
            Ok(intents) => {
                host.resize(session.bounds())?;
                host.draw(session, &intents);
            }
            Err(e) => tracing::warn!("{e}"),
        },
        Input::Help => println!("{}", interactive::HELP),
        Input::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn ports() -> anyhow::Result<()> {
    let ports = penplot_io::list_ports()?;
    if ports.is_empty() {
        bail!("no serial ports found");
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}

/// [`Clock`] implementation backed by [`web_time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
