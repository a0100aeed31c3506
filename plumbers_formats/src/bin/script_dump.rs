use std::env;

use anyhow::{Context, Result};
use plumbers_formats::{Endian, Script};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: script_dump <script file> [--big-endian]")?;
    let endian = if env::args().any(|arg| arg == "--big-endian") {
        Endian::Big
    } else {
        Endian::Little
    };

    let script = Script::load(&path, endian)?;
    println!(
        "{} scenes, {} pictures in {}",
        script.scenes.len(),
        script.pictures.len(),
        path
    );

    for (index, scene) in script.scenes.iter().enumerate() {
        println!(
            "{index:>3} {folder:<14} pictures {base:>4}+{count:<3} dialog {dialog:<14} decision {decision:<14}",
            folder = scene.folder,
            base = scene.picture_base,
            count = scene.picture_count,
            dialog = scene.dialog_file,
            decision = scene.decision_file,
        );
        for (slot, action) in scene.actions.iter().enumerate() {
            println!(
                "      action {slot}: -> {target} ({entry:?}) score {delta:+}",
                target = action.target,
                entry = action.entry,
                delta = action.score_delta,
            );
        }
    }

    Ok(())
}
