use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;
use thiserror::Error;

/// Scene slots present in every script file, populated or not.
pub const SCENE_SLOTS: usize = 100;
/// Picture slots present in every script file.
pub const PICTURE_SLOTS: usize = 2000;
/// Actions a scene record can carry.
pub const MAX_ACTIONS: usize = 3;

const NAME_LEN: usize = 14;
const HEADER_LEN: usize = 22;
const ACTION_LEN: usize = 16;
const SCENE_LEN: usize = 6 + 3 * NAME_LEN + MAX_ACTIONS * ACTION_LEN;
const PICTURE_LEN: usize = 2 + NAME_LEN;

/// Size of the whole fixed-layout record. Scripts are written as one blob of
/// exactly this many bytes; anything shorter is refused, anything longer is
/// read up to this prefix.
pub const SCRIPT_LEN: usize = HEADER_LEN + SCENE_SLOTS * SCENE_LEN + PICTURE_SLOTS * PICTURE_LEN;

const END_GAME_ID: i16 = 32767;
const PREV_DECISION_ID: i16 = -1;

/// Source byte order of a script file. Scripts carry no magic number or
/// version field, so the caller has to know which platform authored them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("script file not found at {path}")]
    NotFound { path: PathBuf },
    #[error("script file truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("reading script file")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

/// Screen-space rectangle a decision occupies on the decision background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hotspot {
    pub top_left: Coord,
    pub bottom_right: Coord,
}

impl Hotspot {
    pub fn width(&self) -> i32 {
        i32::from(self.bottom_right.x) - i32::from(self.top_left.x)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.bottom_right.y) - i32::from(self.top_left.y)
    }
}

/// Where an action sends the playhead. The reserved ids are decoded here so
/// the playback machine never compares against raw sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneTarget {
    EndGame,
    PreviousDecision,
    Scene { id: i16 },
}

impl SceneTarget {
    fn from_raw(id: i16) -> Self {
        match id {
            END_GAME_ID => SceneTarget::EndGame,
            PREV_DECISION_ID => SceneTarget::PreviousDecision,
            id => SceneTarget::Scene { id },
        }
    }
}

impl fmt::Display for SceneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneTarget::EndGame => write!(f, "end-game"),
            SceneTarget::PreviousDecision => write!(f, "previous-decision"),
            SceneTarget::Scene { id } => write!(f, "SC{id:02}"),
        }
    }
}

/// Whether the destination scene plays its pictures or jumps straight to its
/// decision screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneEntry {
    Beginning,
    Decision,
}

impl SceneEntry {
    fn from_raw(flag: i16) -> Self {
        if flag == 1 {
            SceneEntry::Decision
        } else {
            SceneEntry::Beginning
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub score_delta: i32,
    pub target: SceneTarget,
    pub entry: SceneEntry,
    pub hotspot: Hotspot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Picture {
    /// Display time in deciseconds, the script's native unit.
    pub duration_ds: i16,
    pub bitmap_file: String,
}

impl Picture {
    pub fn duration_seconds(&self) -> f64 {
        f64::from(self.duration_ds) / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    pub picture_count: usize,
    /// Index of the scene's first picture in the script-wide picture table.
    pub picture_base: usize,
    /// Folder name, which doubles as the scene's symbolic id ("SCxx").
    pub folder: String,
    pub dialog_file: String,
    pub decision_file: String,
    pub actions: Vec<Action>,
}

impl Scene {
    pub fn picture_range(&self) -> Range<usize> {
        self.picture_base..self.picture_base + self.picture_count
    }

    /// A scene with a single action never shows a decision screen.
    pub fn has_decision(&self) -> bool {
        self.actions.len() > 1
    }
}

/// The parsed script: an immutable table of scenes and pictures. Only the
/// populated prefix of each fixed-capacity table is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub scenes: Vec<Scene>,
    pub pictures: Vec<Picture>,
}

impl Script {
    /// Read and decode a whole script file. Malformed-but-correctly-sized
    /// data is accepted as-is; the authoring tool is the only validator.
    pub fn load<P: AsRef<Path>>(path: P, endian: Endian) -> Result<Self, ScriptLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ScriptLoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScriptLoadError::Io(err)
            }
        })?;
        Self::parse(&bytes, endian)
    }

    pub fn parse(bytes: &[u8], endian: Endian) -> Result<Self, ScriptLoadError> {
        if bytes.len() < SCRIPT_LEN {
            return Err(ScriptLoadError::Truncated {
                expected: SCRIPT_LEN,
                actual: bytes.len(),
            });
        }
        Ok(match endian {
            Endian::Little => parse_script::<LittleEndian>(bytes),
            Endian::Big => parse_script::<BigEndian>(bytes),
        })
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn picture(&self, index: usize) -> Option<&Picture> {
        self.pictures.get(index)
    }

    /// Resolve a symbolic scene id to its table index. Ids map to folder
    /// names as "SC" plus the zero-padded two-digit id, matched without
    /// regard to case. An unknown id falls back to slot 0 — the authoring
    /// tool guarantees every reachable id exists, so a miss means the script
    /// data is bad, not that playback should halt.
    pub fn scene_index_for(&self, id: i16) -> usize {
        let name = format!("SC{id:02}");
        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.folder.eq_ignore_ascii_case(&name) {
                return index;
            }
        }
        log::warn!("no scene folder matches {name}; falling back to slot 0");
        0
    }
}

fn parse_script<E: ByteOrder>(bytes: &[u8]) -> Script {
    let scene_count = clamp_count(E::read_i16(&bytes[14..16]), SCENE_SLOTS, "scene");
    let picture_count = clamp_count(E::read_i16(&bytes[16..18]), PICTURE_SLOTS, "picture");

    let mut scenes = Vec::with_capacity(scene_count);
    for slot in 0..scene_count {
        let base = HEADER_LEN + slot * SCENE_LEN;
        scenes.push(parse_scene::<E>(&bytes[base..base + SCENE_LEN]));
    }

    let pictures_base = HEADER_LEN + SCENE_SLOTS * SCENE_LEN;
    let mut pictures = Vec::with_capacity(picture_count);
    for slot in 0..picture_count {
        let base = pictures_base + slot * PICTURE_LEN;
        let record = &bytes[base..base + PICTURE_LEN];
        pictures.push(Picture {
            duration_ds: E::read_i16(&record[0..2]),
            bitmap_file: fixed_name(&record[2..2 + NAME_LEN]),
        });
    }

    Script { scenes, pictures }
}

fn parse_scene<E: ByteOrder>(record: &[u8]) -> Scene {
    let picture_count = E::read_i16(&record[0..2]);
    let picture_base = E::read_i16(&record[2..4]);
    let action_count = E::read_i16(&record[4..6]);

    let names_base = 6;
    let folder = fixed_name(&record[names_base..names_base + NAME_LEN]);
    let dialog_file = fixed_name(&record[names_base + NAME_LEN..names_base + 2 * NAME_LEN]);
    let decision_file = fixed_name(&record[names_base + 2 * NAME_LEN..names_base + 3 * NAME_LEN]);

    let populated = action_count.clamp(0, MAX_ACTIONS as i16) as usize;
    let actions_base = names_base + 3 * NAME_LEN;
    let mut actions = Vec::with_capacity(populated);
    for slot in 0..populated {
        let base = actions_base + slot * ACTION_LEN;
        actions.push(parse_action::<E>(&record[base..base + ACTION_LEN]));
    }

    Scene {
        picture_count: picture_count.max(0) as usize,
        picture_base: picture_base.max(0) as usize,
        folder,
        dialog_file,
        decision_file,
        actions,
    }
}

fn parse_action<E: ByteOrder>(record: &[u8]) -> Action {
    Action {
        score_delta: E::read_i32(&record[0..4]),
        target: SceneTarget::from_raw(E::read_i16(&record[4..6])),
        entry: SceneEntry::from_raw(E::read_i16(&record[6..8])),
        hotspot: Hotspot {
            top_left: Coord {
                x: E::read_i16(&record[8..10]),
                y: E::read_i16(&record[10..12]),
            },
            bottom_right: Coord {
                x: E::read_i16(&record[12..14]),
                y: E::read_i16(&record[14..16]),
            },
        },
    }
}

fn clamp_count(raw: i16, slots: usize, kind: &str) -> usize {
    if raw < 0 {
        log::warn!("negative {kind} count {raw}; treating table as empty");
        return 0;
    }
    let count = raw as usize;
    if count > slots {
        log::warn!("{kind} count {count} exceeds the {slots} table slots; clamping");
        return slots;
    }
    count
}

/// Read a fixed-width name slot, trimmed at the first NUL terminator.
fn fixed_name(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}
