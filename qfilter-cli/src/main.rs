//! Quantum Filter CLI - live noise mixing from the terminal
//!
//! Opens the default (or named) microphone and speakers, then reads mix
//! commands from stdin while the audio thread runs.

mod commands;

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use env_logger::Env;
use log::info;

use qfilter_dsp::{
    ParameterStore, ShotCount, DEFAULT_CHUNK_SIZE, DEFAULT_MIX_RATIO, DEFAULT_SAMPLE_RATE, DEFAULT_SHOTS,
    MIX_PERCENT_MAX,
};
use qfilter_io::{list_devices, start_stream, StreamHandle, StreamSettings};

use commands::{apply, format_stats, parse_command, Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "qfilter")]
#[command(about = "Mix simulated quantum measurement noise into live microphone audio")]
#[command(version)]
struct Cli {
    /// Sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    rate: u32,

    /// Frames per processing period
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk: usize,

    /// Measurement shots per sample
    #[arg(long, default_value_t = DEFAULT_SHOTS, value_parser = clap::value_parser!(u32).range(1..))]
    shots: u32,

    /// Initial mix slider position (0 = dry, 100 = all noise)
    #[arg(long, default_value_t = (DEFAULT_MIX_RATIO * MIX_PERCENT_MAX as f32).round() as u32,
          value_parser = clap::value_parser!(u32).range(0..=MIX_PERCENT_MAX as i64))]
    mix: u32,

    /// Start with pair entanglement enabled
    #[arg(long)]
    pairs: bool,

    /// Fixed noise seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Input device name (default: host default)
    #[arg(long)]
    input_device: Option<String>,

    /// Output device name (default: host default)
    #[arg(long)]
    output_device: Option<String>,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

impl Cli {
    fn settings(&self) -> Result<StreamSettings> {
        let shots = ShotCount::new(self.shots).context("shot count must be at least 1")?;
        let mut settings = StreamSettings::default()
            .with_sample_rate(self.rate)
            .with_chunk_size(self.chunk)
            .with_shots(shots);
        if let Some(name) = &self.input_device {
            settings = settings.with_input_device(name.clone());
        }
        if let Some(name) = &self.output_device {
            settings = settings.with_output_device(name.clone());
        }
        if let Some(seed) = self.seed {
            settings = settings.with_seed(seed);
        }
        Ok(settings)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_devices {
        for device in list_devices().context("listing audio devices")? {
            println!("{} (channels: {}, f32: {})", device, device.max_channels, device.supports_f32);
        }
        return Ok(ExitCode::SUCCESS);
    }

    info!("Quantum Filter v{}", env!("CARGO_PKG_VERSION"));

    let settings = cli.settings()?;
    let params = Arc::new(ParameterStore::default());
    params.set_mix_percent(cli.mix);
    params.set_pair_mode(cli.pairs);

    let mut handle = start_stream(&settings, params.clone()).context("starting audio stream")?;
    println!(
        "Streaming at {}Hz, {} frame periods (~{:.1}ms)",
        handle.sample_rate(),
        handle.chunk_size(),
        handle.latency_ms()
    );
    println!("{}", params.mix_label());
    println!("{}", HELP);

    let code = control_loop(&mut handle, &params, spawn_stdin_reader());
    handle.stop();
    Ok(code)
}

/// Forward stdin lines to a channel; the channel closes on EOF
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = channel::unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn control_loop(handle: &mut StreamHandle, params: &Arc<ParameterStore>, lines: Receiver<String>) -> ExitCode {
    let mut faults = handle.faults();

    loop {
        select! {
            recv(faults) -> fault => {
                match fault {
                    Ok(fault) => {
                        eprintln!("Audio stream failed: {}", fault);
                        return ExitCode::FAILURE;
                    }
                    Err(_) => faults = channel::never(),
                }
            }
            recv(lines) -> line => {
                let Ok(line) = line else {
                    // stdin closed
                    return ExitCode::SUCCESS;
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => return ExitCode::SUCCESS,
                    Ok(Some(Command::Stats)) => println!("{}", format_stats(&handle.stats())),
                    Ok(Some(Command::Help)) => println!("{}", HELP),
                    Ok(Some(command)) => {
                        if let Some(output) = apply(command, params) {
                            println!("{}", output);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{} ({})", e, HELP),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_map_to_settings() {
        let cli = Cli::parse_from(["qfilter"]);
        assert_eq!(cli.mix, 75);
        assert!(!cli.pairs);

        let settings = cli.settings().unwrap();
        assert_eq!(settings, StreamSettings::default());
    }

    #[test]
    fn test_flags_map_to_settings() {
        let cli = Cli::parse_from([
            "qfilter",
            "--rate",
            "48000",
            "--chunk",
            "256",
            "--shots",
            "16",
            "--seed",
            "3",
            "--input-device",
            "USB Mic",
            "--pairs",
        ]);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.sample_rate, 48_000);
        assert_eq!(settings.chunk_size, 256);
        assert_eq!(settings.shots.get(), 16);
        assert_eq!(settings.seed, Some(3));
        assert_eq!(settings.input_device.as_deref(), Some("USB Mic"));
        assert!(cli.pairs);
    }

    #[test]
    fn test_rejects_out_of_range_flags() {
        assert!(Cli::try_parse_from(["qfilter", "--mix", "150"]).is_err());
        assert!(Cli::try_parse_from(["qfilter", "--shots", "0"]).is_err());
    }
}
