//! beatloom CLI: play a beat on the default output device.
//!
//! Usage:
//!   bl-cli --bpm 120 --freq 1000
//!   bl-cli --freq 220 --freq 330 --waveform saw --seconds 10

use std::io::Write;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use bl_dsp::Waveform;
use bl_master::{BeatTrackParams, Command, Controller, Response};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "bl-cli")]
#[command(about = "Play beat tracks through the default audio device", long_about = None)]
struct Cli {
    /// Tempo in beats per minute
    #[arg(short, long, default_value_t = 120.0)]
    bpm: f32,

    /// Tone frequency in Hz; repeat for one track per tone
    #[arg(short, long = "freq", default_values_t = [1000.0])]
    freqs: Vec<f32>,

    /// Oscillator shape for every track
    #[arg(short, long, value_enum, default_value_t = Shape::Sine)]
    waveform: Shape,

    /// How long to play
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f32,

    /// Master volume in [0, 1]
    #[arg(short, long, default_value_t = 0.5)]
    master_volume: f32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl From<Shape> for Waveform {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Sine => Waveform::Sine,
            Shape::Square => Waveform::Square,
            Shape::Saw => Waveform::Saw,
            Shape::Triangle => Waveform::Triangle,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctrl = Controller::with_default_output()?;

    let Response::SongCreated { song } = ctrl.execute(Command::CreateSong {
        title: "cli".into(),
        tempo: Some(cli.bpm),
    })?
    else {
        return Err("song was not created".into());
    };

    for &freq in &cli.freqs {
        let track = BeatTrackParams {
            frequency_hz: freq,
            waveform: cli.waveform.into(),
            ..Default::default()
        };
        ctrl.execute(Command::AddTrack { song, track })?;
    }

    ctrl.execute(Command::SetMasterVolume { volume: cli.master_volume })?;
    ctrl.execute(Command::SwitchSong { song })?;
    ctrl.execute(Command::Play)?;

    println!(
        "Playing {} track(s) at {} BPM for {} s",
        cli.freqs.len(),
        cli.bpm,
        cli.seconds
    );

    let duration = Duration::try_from_secs_f32(cli.seconds).unwrap_or(Duration::ZERO);
    let start = Instant::now();
    while start.elapsed() < duration {
        let status = ctrl.status();
        if let Some(pos) = status.position {
            print!("\r{:>8} | {:7.2} s", status.state.name(), pos);
            let _ = std::io::stdout().flush();
        }
        ctrl.maintain();
        thread::sleep(Duration::from_millis(50));
    }

    ctrl.execute(Command::Stop)?;
    println!("\rDone.                 ");
    Ok(())
}
