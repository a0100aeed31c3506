pub mod audio;
pub mod bridge;
pub mod cli;
pub mod events;
pub mod playback;

pub use audio::{StreamingAudio, dialog_byte_offset};
pub use bridge::{AudioOutput, EventLedger, PictureOutput, RecordingAudio, RecordingPicture};
pub use events::PlaybackEvent;
pub use playback::{Playback, PlaybackState};
