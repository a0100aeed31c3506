use std::path::Path;
use std::sync::{Arc, Mutex};

use plumbers_formats::WavFile;

use crate::bridge::AudioOutput;

/// Dialog recordings share one fixed format across every scene.
pub const DIALOG_SAMPLE_RATE: u32 = 11_025;
pub const DIALOG_SAMPLE_BYTES: u32 = 2;
pub const DIALOG_CHANNELS: u32 = 2;

/// Byte offset into the dialog sample data for a given elapsed play time,
/// masked to an even boundary so a 16-bit sample is never split.
pub fn dialog_byte_offset(elapsed_seconds: f64) -> u64 {
    let bytes_per_second = u64::from(DIALOG_SAMPLE_RATE * DIALOG_SAMPLE_BYTES * DIALOG_CHANNELS);
    let offset = (elapsed_seconds * bytes_per_second as f64) as u64;
    offset & !1
}

struct AudioSession {
    wav: WavFile,
    /// Read cursor relative to the start of the PCM region.
    cursor: usize,
}

/// Streams dialog PCM to a hardware callback while the frame thread swaps
/// scenes underneath it. The session mutex is the only cross-thread boundary
/// in the engine: `play`/`stop`/`seek` run on the frame thread, `fill` runs
/// wherever the audio device calls back from.
#[derive(Clone, Default)]
pub struct StreamingAudio {
    session: Arc<Mutex<Option<AudioSession>>>,
}

impl StreamingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        match self.session.lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => false,
        }
    }

    /// Pull side for the audio device. Always fills the whole buffer;
    /// whatever the stream cannot provide becomes silence. Once the dialog
    /// runs out the session is dropped so later pulls stay silent without
    /// holding the file open.
    pub fn fill(&self, out: &mut [u8]) {
        let Ok(mut guard) = self.session.lock() else {
            out.fill(0);
            return;
        };
        let Some(session) = guard.as_mut() else {
            out.fill(0);
            return;
        };

        let pcm = session.wav.pcm();
        let remaining = pcm.len().saturating_sub(session.cursor);
        let copied = remaining.min(out.len());
        out[..copied].copy_from_slice(&pcm[session.cursor..session.cursor + copied]);
        out[copied..].fill(0);
        session.cursor += copied;

        if copied < out.len() {
            *guard = None;
        }
    }
}

impl AudioOutput for StreamingAudio {
    fn play(&self, path: &Path) -> bool {
        let wav = match WavFile::open(path) {
            Ok(wav) => wav,
            Err(err) => {
                log::error!("can't open dialog {}: {err:#}", path.display());
                return false;
            }
        };
        log::info!("playing dialog {}", path.display());
        let Ok(mut guard) = self.session.lock() else {
            return false;
        };
        *guard = Some(AudioSession { wav, cursor: 0 });
        true
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }

    fn seek(&self, byte_offset: u64) {
        if let Ok(mut guard) = self.session.lock() {
            if let Some(session) = guard.as_mut() {
                session.cursor = (byte_offset as usize).min(session.wav.pcm().len());
            }
        }
    }
}
