use serde::{Deserialize, Serialize};

/// One collaborator call issued by the playback machine, in the order it was
/// issued. Recorded during headless runs and replayed by the regression
/// tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackEvent {
    PictureShown {
        path: String,
    },
    ScoreShown {
        text: String,
    },
    SelectionHighlighted {
        x: i16,
        y: i16,
        width: i32,
        height: i32,
    },
    AudioStarted {
        path: String,
    },
    AudioStopped,
    AudioSought {
        byte_offset: u64,
    },
}
