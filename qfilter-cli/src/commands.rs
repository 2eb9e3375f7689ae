//! Interactive control commands read from stdin

use std::sync::Arc;

use qfilter_dsp::{ParameterStore, MIX_PERCENT_MAX};
use qfilter_io::StreamStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Slider position in [0, 100]
    SetMix(u32),
    TogglePairs,
    Stats,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: 0-100 (mix slider), p|pairs (toggle pair entanglement), s|stats, h|help, q|quit";

/// Parse one line of user input
///
/// Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let command = match line.to_ascii_lowercase().as_str() {
        "p" | "pairs" => Command::TogglePairs,
        "s" | "stats" => Command::Stats,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.parse::<u32>() {
            Ok(percent) if percent <= MIX_PERCENT_MAX => Command::SetMix(percent),
            Ok(percent) => return Err(format!("mix {} outside 0-{}", percent, MIX_PERCENT_MAX)),
            Err(_) => return Err(format!("unknown command {:?}", line)),
        },
    };
    Ok(Some(command))
}

/// Apply a parameter command and return the line to print
///
/// `Stats`, `Help` and `Quit` are handled by the caller.
pub fn apply(command: Command, params: &Arc<ParameterStore>) -> Option<String> {
    match command {
        Command::SetMix(percent) => {
            params.set_mix_percent(percent);
            Some(params.mix_label())
        }
        Command::TogglePairs => {
            let enabled = params.toggle_pair_mode();
            let state = if enabled { "on" } else { "off" };
            Some(format!("Pair entanglement: {} ({})", state, params.mix_label()))
        }
        Command::Stats | Command::Help | Command::Quit => None,
    }
}

pub fn format_stats(stats: &StreamStats) -> String {
    format!(
        "periods: {}, silent: {}, dry fallbacks: {}, overruns: {}, underruns: {}",
        stats.mixer.periods_processed,
        stats.mixer.silent_periods,
        stats.mixer.dry_fallbacks,
        stats.overruns,
        stats.underruns
    )
}
