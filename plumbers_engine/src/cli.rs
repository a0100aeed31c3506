use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use regex::Regex;

#[derive(Parser, Debug)]
#[command(
    about = "Headless auto-player for interactive-movie scene scripts",
    version
)]
pub struct Args {
    /// Path to the binary scene script
    #[arg(long, default_value = "data/GAME.BIN")]
    pub script: PathBuf,

    /// Directory holding the per-scene asset folders
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    /// Decode the script as big-endian (for scripts authored on big-endian
    /// platforms)
    #[arg(long)]
    pub big_endian: bool,

    /// Scene to start from, e.g. SC05 (default: the slot after the info
    /// card)
    #[arg(long, value_name = "SCxx")]
    pub start_scene: Option<String>,

    /// Decision indices taken in order at each decision screen; once the
    /// list runs out the first action is taken
    #[arg(long, value_delimiter = ',')]
    pub choices: Vec<usize>,

    /// Simulated seconds per frame
    #[arg(long, default_value_t = 0.1)]
    pub tick: f64,

    /// Give up after this many frames
    #[arg(long, default_value_t = 100_000)]
    pub max_ticks: u64,

    /// Skip every picture's wait timer instead of sitting through it
    #[arg(long)]
    pub fast_forward: bool,

    /// Stream the real dialog WAV files from the data root instead of
    /// recording audio commands
    #[arg(long)]
    pub stream_dialog: bool,

    /// Path to write the playback event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write the parsed script as JSON
    #[arg(long)]
    pub script_json: Option<PathBuf>,

    /// Print every recorded playback event after the run
    #[arg(long)]
    pub verbose: bool,
}

/// Parse a symbolic scene name like "SC05" into its numeric id.
pub fn parse_start_scene(raw: &str) -> Result<i16> {
    let pattern = Regex::new(r"(?i)^SC(\d{2})$")?;
    let Some(captures) = pattern.captures(raw) else {
        bail!("start scene must look like SC05, got {raw:?}");
    };
    Ok(captures[1].parse()?)
}
