use anyhow::Context;
use clap::Parser;
use loopscope::render::{self, Viewport};
use loopscope::{audio, envelope, gui, Settings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    files: Vec<PathBuf>,
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Render the first file's waveform to a PNG instead of opening the browser
    #[arg(short, long)]
    render: Option<PathBuf>,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 200)]
    height: u32,
    #[arg(long)]
    gui: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let Some(output) = cli.render.clone().filter(|_| !cli.gui) else {
        return gui::run(cli.files, settings);
    };

    let input = cli.files.first().context("--render needs an input file")?;
    println!("Loading audio: {:?}", input);
    let buffer = audio::load_audio_file(input)?;
    println!(
        "Audio loaded. Sample rate: {}, Channels: {}, Duration: {}ms",
        buffer.sample_rate_hz,
        buffer.channels,
        buffer.duration_ms()
    );

    let viewport = Viewport::new(cli.width, cli.height);
    let envelope = envelope::build_envelope(&buffer, viewport.width as usize);
    let peak = envelope.bars.iter().copied().fold(0.0f32, f32::max);
    println!(
        "Envelope: {} bars, normalization factor {:.5}, peak bar {:.3}",
        envelope.len(),
        envelope.normalization_factor,
        peak
    );

    let bitmap = render::paint_bars(&envelope, viewport, settings.waveform_colour());
    render::bitmap_to_png(&bitmap, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Waveform written to {:?}", output);

    Ok(())
}
