//! Convert a scene script into a JSON description that external tooling can
//! load. The schema mirrors the decoded `game_bin` structs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use plumbers_formats::{Endian, Script};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input script file to convert
    #[arg(long)]
    input: PathBuf,

    /// Output JSON file path
    #[arg(long)]
    output: PathBuf,

    /// Decode multi-byte fields as big-endian
    #[arg(long, default_value_t = false)]
    big_endian: bool,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let endian = if args.big_endian {
        Endian::Big
    } else {
        Endian::Little
    };
    let script = Script::load(&args.input, endian)?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &script)?;
    } else {
        serde_json::to_writer(&mut writer, &script)?;
    }
    writer.flush()?;

    Ok(())
}
