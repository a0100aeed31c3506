pub mod game_bin;
pub mod wav;

pub use game_bin::{
    Action, Coord, Endian, Hotspot, Picture, Scene, SceneEntry, SceneTarget, Script,
    ScriptLoadError,
};
pub use wav::{WavFile, WavInfo};
