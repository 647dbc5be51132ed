// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{crate_version, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use kitplay::audio::{self, AudioBuffer, AudioOutput, MockOutput};
use kitplay::config::PlayerConfig;
use kitplay::kit::{Kit, KitDescriptor, SectionRole};
use kitplay::timing::SystemClock;
use kitplay::DrumEngine;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Plays multi-section drum loop recordings, switching sections live."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the sections of a kit, grouped by role.
    Sections {
        /// The path to the kit descriptor (JSON).
        descriptor: PathBuf,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Plays a kit and reads section changes from stdin.
    Play {
        /// The path to the kit descriptor (JSON).
        descriptor: PathBuf,
        /// The path to the kit recording (PCM WAV).
        wav: PathBuf,
        /// The path to the player config (YAML).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The section to start from instead of the default.
        #[arg(short, long)]
        section: Option<String>,
        /// Play through a mock device instead of the audio interface.
        #[arg(long)]
        mock: bool,
    },
}

const PLAY_HELP: &str = "Commands: start, stop, position, sections, quit. \
Any other line is a section label: queued while playing, started from while stopped.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sections { descriptor } => {
            let kit = load_kit(&descriptor)?;
            println!(
                "{} BPM, {} beats per bar, default section {:?}",
                kit.bpm(),
                kit.beats_per_bar(),
                kit.default_section().label()
            );
            print_sections(&kit);
        }
        Commands::Devices {} => {
            let devices = audio::output::list_devices();

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            let default = audio::output::default_device_name();
            println!("Devices:");
            for device in devices {
                if Some(&device) == default.as_ref() {
                    println!("- {} (default)", device);
                } else {
                    println!("- {}", device);
                }
            }
        }
        Commands::Play {
            descriptor,
            wav,
            config,
            section,
            mock,
        } => {
            let config = match config {
                Some(path) => PlayerConfig::load(&path)?,
                None => PlayerConfig::default(),
            };
            play(&descriptor, &wav, config, section, mock).await?;
        }
    }

    Ok(())
}

fn load_kit(path: &Path) -> Result<Kit> {
    let descriptor = KitDescriptor::load(path)
        .with_context(|| format!("Failed to load kit descriptor: {:?}", path))?;
    Ok(Kit::from_descriptor(&descriptor)?)
}

fn print_sections(kit: &Kit) {
    for role in SectionRole::all() {
        let sections: Vec<_> = kit.sections_with_role(role).collect();
        if sections.is_empty() {
            continue;
        }
        println!("{}:", role);
        for section in sections {
            println!(
                "- {} ({} bars at {:.3}s)",
                section.label(),
                section.bars(),
                section.start_offset()
            );
        }
    }
}

async fn play(
    descriptor_path: &Path,
    wav_path: &Path,
    config: PlayerConfig,
    section: Option<String>,
    mock: bool,
) -> Result<()> {
    let descriptor = KitDescriptor::load(descriptor_path)
        .with_context(|| format!("Failed to load kit descriptor: {:?}", descriptor_path))?;
    let buffer = AudioBuffer::from_wav(wav_path)
        .with_context(|| format!("Failed to read kit recording: {:?}", wav_path))?;

    // The cpal stream must outlive playback.
    let (engine, _stream): (DrumEngine, Option<AudioOutput>) = if mock {
        let output = Arc::new(MockOutput::new("kitplay"));
        let engine = DrumEngine::new(
            output,
            Arc::new(SystemClock::new()),
            config.scheduler.clone(),
            config.slice.clone(),
        );
        (engine, None)
    } else {
        let output = AudioOutput::open(config.audio.clone())?;
        let mixer = output.mixer();
        if mixer.sample_rate() != buffer.sample_rate() {
            info!(
                device_rate = mixer.sample_rate(),
                recording_rate = buffer.sample_rate(),
                "Resampling kit recording to the device rate"
            );
        }
        let engine = DrumEngine::new(
            mixer.clone(),
            mixer,
            config.scheduler.clone(),
            config.slice.clone(),
        );
        (engine, Some(output))
    };

    engine.load_kit(&descriptor, buffer)?;
    engine.set_on_beat(|label, beat| println!("{} | beat {}", label, beat + 1));

    if let Some(label) = section {
        engine.jump_to_section(&label)?;
    }

    println!("{}", PLAY_HELP);
    engine.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        let result = match command {
            "" => continue,
            "quit" | "exit" => break,
            "start" => engine.start(),
            "stop" => engine.stop(),
            "position" => {
                if let Some(position) = engine.position()? {
                    println!("{}", position.format());
                }
                Ok(())
            }
            "sections" => {
                if let Some(kit) = engine.kit()? {
                    print_sections(&kit);
                }
                Ok(())
            }
            label => engine.select_section(label),
        };
        if let Err(e) = result {
            warn!(err = %e, command, "Command failed");
        }
    }

    engine.stop()?;
    Ok(())
}
