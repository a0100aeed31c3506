use std::{cell::RefCell, path::Path, rc::Rc};

use plumbers_formats::Hotspot;

use crate::events::PlaybackEvent;

/// Picture-side collaborator. The host owns bitmap decoding, upload, and
/// text rendering; the machine only asks for pictures by path and hands over
/// already-formatted score text.
pub trait PictureOutput {
    /// Returns false when the picture could not be loaded. Playback
    /// continues either way.
    fn load_picture(&self, path: &Path) -> bool;

    /// An empty string clears the score text.
    fn show_score(&self, text: &str);

    /// Mark the hotspot of the currently selected decision so the host can
    /// draw its highlight box over the decision background.
    fn highlight(&self, hotspot: Hotspot);
}

/// Audio-side collaborator. The host owns the output device; the machine
/// only starts, stops, and repositions the dialog stream.
pub trait AudioOutput {
    fn play(&self, path: &Path) -> bool;
    fn stop(&self);
    /// Reposition the stream to a byte offset within its sample data.
    fn seek(&self, byte_offset: u64);
}

/// Shared ordered record of collaborator calls.
#[derive(Clone, Default)]
pub struct EventLedger {
    events: Rc<RefCell<Vec<PlaybackEvent>>>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: PlaybackEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.borrow().clone()
    }
}

/// Picture collaborator that records instead of rendering. Every load
/// "succeeds".
pub struct RecordingPicture {
    ledger: EventLedger,
}

impl RecordingPicture {
    pub fn new(ledger: EventLedger) -> Self {
        RecordingPicture { ledger }
    }
}

impl PictureOutput for RecordingPicture {
    fn load_picture(&self, path: &Path) -> bool {
        self.ledger.record(PlaybackEvent::PictureShown {
            path: path.display().to_string(),
        });
        true
    }

    fn show_score(&self, text: &str) {
        self.ledger.record(PlaybackEvent::ScoreShown {
            text: text.to_string(),
        });
    }

    fn highlight(&self, hotspot: Hotspot) {
        self.ledger.record(PlaybackEvent::SelectionHighlighted {
            x: hotspot.top_left.x,
            y: hotspot.top_left.y,
            width: hotspot.width(),
            height: hotspot.height(),
        });
    }
}

/// Audio collaborator that records instead of touching a device.
pub struct RecordingAudio {
    ledger: EventLedger,
}

impl RecordingAudio {
    pub fn new(ledger: EventLedger) -> Self {
        RecordingAudio { ledger }
    }
}

impl AudioOutput for RecordingAudio {
    fn play(&self, path: &Path) -> bool {
        self.ledger.record(PlaybackEvent::AudioStarted {
            path: path.display().to_string(),
        });
        true
    }

    fn stop(&self) {
        self.ledger.record(PlaybackEvent::AudioStopped);
    }

    fn seek(&self, byte_offset: u64) {
        self.ledger.record(PlaybackEvent::AudioSought { byte_offset });
    }
}
