//! Check that every asset a script references exists under a data root, and
//! list files on disk the script never mentions.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use plumbers_formats::{Endian, Script};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Script file whose references should be checked
    #[arg(long)]
    script: PathBuf,

    /// Directory holding the per-scene asset folders
    #[arg(long)]
    data_root: PathBuf,

    /// Decode multi-byte fields as big-endian
    #[arg(long, default_value_t = false)]
    big_endian: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let endian = if args.big_endian {
        Endian::Big
    } else {
        Endian::Little
    };
    let script = Script::load(&args.script, endian)?;

    let mut referenced: BTreeSet<String> = BTreeSet::new();
    for scene in &script.scenes {
        insert_asset(&mut referenced, &scene.folder, &scene.dialog_file);
        insert_asset(&mut referenced, &scene.folder, &scene.decision_file);
        for slot in scene.picture_range() {
            if let Some(picture) = script.picture(slot) {
                insert_asset(&mut referenced, &scene.folder, &picture.bitmap_file);
            }
        }
    }

    let mut missing = 0usize;
    for asset in &referenced {
        if !args.data_root.join(asset).is_file() {
            println!("missing: {asset}");
            missing += 1;
        }
    }

    let script_name = args
        .script
        .file_name()
        .map(|name| name.to_string_lossy().to_uppercase());
    let mut unreferenced = 0usize;
    for entry in WalkDir::new(&args.data_root) {
        let entry = entry.context("walking data root")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&args.data_root)
            .context("entry outside data root")?;
        let key = relative.to_string_lossy().replace('\\', "/").to_uppercase();
        if Some(&key) == script_name.as_ref() {
            continue;
        }
        if !referenced.contains(&key) {
            println!("unreferenced: {key}");
            unreferenced += 1;
        }
    }

    println!(
        "{} assets referenced, {} missing, {} unreferenced",
        referenced.len(),
        missing,
        unreferenced
    );

    if missing > 0 {
        bail!("{missing} referenced assets are missing from the data root");
    }
    Ok(())
}

fn insert_asset(referenced: &mut BTreeSet<String>, folder: &str, file: &str) {
    if folder.is_empty() || file.is_empty() {
        return;
    }
    referenced.insert(format!("{folder}/{file}").to_uppercase());
}
