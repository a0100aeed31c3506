use std::fs;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use plumbers_formats::{Endian, Script};

use plumbers_engine::bridge::{AudioOutput, EventLedger, RecordingAudio, RecordingPicture};
use plumbers_engine::events::PlaybackEvent;
use plumbers_engine::playback::{Playback, PlaybackState};
use plumbers_engine::{StreamingAudio, cli, dialog_byte_offset};

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Args::parse();

    let endian = if args.big_endian {
        Endian::Big
    } else {
        Endian::Little
    };
    let script = Script::load(&args.script, endian)
        .with_context(|| format!("loading script {}", args.script.display()))?;
    println!(
        "Loaded {} scenes and {} pictures from {}",
        script.scenes.len(),
        script.pictures.len(),
        args.script.display()
    );

    if let Some(path) = args.script_json.as_ref() {
        let json = serde_json::to_string_pretty(&script).context("serializing script to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing script JSON to {}", path.display()))?;
        println!("Saved script JSON to {}", path.display());
    }

    let ledger = EventLedger::new();
    let streaming = args.stream_dialog.then(StreamingAudio::new);
    let audio: Rc<dyn AudioOutput> = match streaming.clone() {
        Some(stream) => Rc::new(stream),
        None => Rc::new(RecordingAudio::new(ledger.clone())),
    };
    let mut playback = Playback::new(
        script,
        args.data_root.clone(),
        Rc::new(RecordingPicture::new(ledger.clone())),
        audio,
    );

    match args.start_scene.as_deref() {
        Some(raw) => playback.start_from(cli::parse_start_scene(raw)?),
        None => playback.start(),
    }

    // One frame's worth of device pull when streaming real dialog.
    let mut device_buffer = vec![0u8; dialog_byte_offset(args.tick).max(2) as usize];
    let mut streamed_bytes = 0u64;

    let mut choices = args.choices.iter().copied();
    let mut ticks = 0u64;
    while playback.is_running() && ticks < args.max_ticks {
        playback.update(args.tick);
        match playback.state() {
            PlaybackState::WaitingDecision => {
                let offered = playback.decision_count();
                let pick = choices.next().unwrap_or(0).min(offered.saturating_sub(1));
                // Step the highlight the way a player would, then confirm.
                for _ in 0..=pick {
                    playback.select_next_decision();
                }
                playback.render();
                playback.advance_picture();
            }
            PlaybackState::WaitingPicture if args.fast_forward => {
                playback.advance_picture();
            }
            _ => {}
        }
        if let Some(stream) = &streaming {
            if stream.is_playing() {
                stream.fill(&mut device_buffer);
                streamed_bytes += device_buffer.len() as u64;
            }
        }
        ticks += 1;
    }

    if playback.is_running() {
        log::warn!("tick budget exhausted after {ticks} frames; stopping");
        playback.stop();
    }

    let events = ledger.events();
    if args.verbose {
        for event in &events {
            println!("  {event:?}");
        }
    }

    if let Some(path) = args.event_log_json.as_ref() {
        let json =
            serde_json::to_string_pretty(&events).context("serializing event log to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing event log to {}", path.display()))?;
        println!("Saved playback event log to {}", path.display());
    }

    if streaming.is_some() {
        println!("Streamed {streamed_bytes} bytes of dialog");
    }

    let scenes_entered = events
        .iter()
        .filter(|event| matches!(event, PlaybackEvent::AudioStarted { .. }))
        .count();
    println!(
        "Playback finished after {ticks} frames: {scenes_entered} scenes played, final score {}",
        playback.score()
    );

    Ok(())
}
