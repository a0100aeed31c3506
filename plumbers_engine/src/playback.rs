use std::path::{Path, PathBuf};
use std::rc::Rc;

use plumbers_formats::{Action, Scene, SceneEntry, SceneTarget, Script};

use crate::audio::dialog_byte_offset;
use crate::bridge::{AudioOutput, PictureOutput};

/// Scene slot playthroughs begin on. Slot 0 holds the distributor info card
/// and doubles as the fallback target for unresolved scene references.
const DEFAULT_START_SLOT: usize = 1;

/// Upper bound on state transitions chained inside one `update` call. A
/// malformed script can link zero-duration single-action scenes into a
/// cycle; bail out instead of spinning the frame loop.
const MAX_CHAINED_TRANSITIONS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    BeginScene,
    BeginPicture,
    WaitingPicture,
    BeginDecision,
    WaitingDecision,
}

/// The scene/picture/decision machine. The host frame loop calls `update`
/// every tick and forwards player intents; all transitions run synchronously
/// inside those calls.
pub struct Playback {
    script: Script,
    base_path: PathBuf,
    pictures: Rc<dyn PictureOutput>,
    audio: Rc<dyn AudioOutput>,

    state: PlaybackState,
    scene_index: usize,
    last_decision_scene: usize,
    picture_index: usize,
    selection: Option<usize>,
    score: i32,
    wait_timer: f64,
}

impl Playback {
    pub fn new(
        script: Script,
        base_path: PathBuf,
        pictures: Rc<dyn PictureOutput>,
        audio: Rc<dyn AudioOutput>,
    ) -> Self {
        Playback {
            script,
            base_path,
            pictures,
            audio,
            state: PlaybackState::Stopped,
            scene_index: DEFAULT_START_SLOT,
            last_decision_scene: 0,
            picture_index: 0,
            selection: None,
            score: 0,
            wait_timer: 0.0,
        }
    }

    pub fn start(&mut self) {
        if self.script.scenes.is_empty() {
            log::error!("script has no populated scenes; refusing to start");
            return;
        }
        self.state = PlaybackState::BeginScene;
        self.scene_index = DEFAULT_START_SLOT.min(self.script.scenes.len() - 1);
        self.last_decision_scene = 0;
        self.picture_index = 0;
        self.selection = None;
        self.score = 0;
        self.wait_timer = 0.0;
    }

    /// Start from the scene with the given symbolic id instead of the
    /// default slot.
    pub fn start_from(&mut self, id: i16) {
        self.start();
        if self.is_running() {
            self.scene_index = self.script.scene_index_for(id);
        }
    }

    /// Halt playback and release whatever the collaborators are holding.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.audio.stop();
        self.pictures.show_score("");
    }

    pub fn update(&mut self, delta_seconds: f64) {
        let mut delta = delta_seconds;
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            match self.state {
                PlaybackState::Stopped | PlaybackState::WaitingDecision => return,
                PlaybackState::BeginScene => self.begin_scene(),
                PlaybackState::BeginPicture => self.begin_picture(),
                PlaybackState::WaitingPicture => {
                    self.wait_timer -= delta;
                    delta = 0.0;
                    if self.wait_timer > 0.0 {
                        return;
                    }
                    self.wait_timer = 0.0;
                    self.picture_index += 1;
                    if self.picture_index >= self.current_scene().picture_count {
                        self.state = PlaybackState::BeginDecision;
                    } else {
                        self.state = PlaybackState::BeginPicture;
                    }
                }
                PlaybackState::BeginDecision => self.begin_decision(),
            }
        }
        log::error!(
            "scene graph did not settle after {MAX_CHAINED_TRANSITIONS} transitions; script data is cyclic"
        );
    }

    /// Per-frame hook for the host's draw pass: re-emits the selected
    /// decision's hotspot so the renderer can draw the highlight box over
    /// the decision background.
    pub fn render(&self) {
        if self.state != PlaybackState::WaitingDecision {
            return;
        }
        let scene = self.current_scene();
        if let Some(action) = self.selection.and_then(|index| scene.actions.get(index)) {
            self.pictures.highlight(action.hotspot);
        }
    }

    pub fn select_decision(&mut self, index: usize) {
        if self.state != PlaybackState::WaitingDecision {
            return;
        }
        if index < self.current_scene().actions.len() {
            self.selection = Some(index);
        }
    }

    pub fn select_next_decision(&mut self) {
        if self.state != PlaybackState::WaitingDecision {
            return;
        }
        let count = self.current_scene().actions.len();
        if count == 0 {
            return;
        }
        self.selection = Some(match self.selection {
            None => 0,
            Some(index) => (index + 1).min(count - 1),
        });
    }

    pub fn select_previous_decision(&mut self) {
        if self.state != PlaybackState::WaitingDecision {
            return;
        }
        let count = self.current_scene().actions.len();
        if count == 0 {
            return;
        }
        self.selection = Some(match self.selection {
            None => count - 1,
            Some(index) => index.saturating_sub(1),
        });
    }

    /// While a picture is on screen: fast-forward past it, repositioning the
    /// dialog stream to where it would be if every picture so far had run
    /// its full duration. While a decision is pending with a valid
    /// selection: confirm it.
    pub fn advance_picture(&mut self) {
        match self.state {
            PlaybackState::WaitingPicture => {
                let base = self.current_scene().picture_base;
                let end = base + self.picture_index + 1;
                let elapsed: f64 = (base..end)
                    .filter_map(|slot| self.script.picture(slot))
                    .map(|picture| picture.duration_seconds())
                    .sum();
                self.audio.seek(dialog_byte_offset(elapsed));
                // The picture transition itself happens on the next tick.
                self.wait_timer = 0.0;
            }
            PlaybackState::WaitingDecision => {
                let Some(index) = self.selection else {
                    return;
                };
                let Some(action) = self.current_scene().actions.get(index).copied() else {
                    return;
                };
                log::info!("selected decision {}", index + 1);
                self.pictures.show_score("");
                self.score += action.score_delta;
                self.set_next_scene(action);
            }
            _ => {}
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn picture_index(&self) -> usize {
        self.picture_index
    }

    pub fn selected_decision(&self) -> Option<usize> {
        self.selection
    }

    /// Actions offered by the current scene.
    pub fn decision_count(&self) -> usize {
        if self.script.scenes.is_empty() {
            return 0;
        }
        self.current_scene().actions.len()
    }

    fn begin_scene(&mut self) {
        let scene = self.current_scene().clone();
        log::info!("entered scene {}", scene.folder);

        let path = asset_path(&self.base_path, &scene.folder, &scene.dialog_file);
        if !self.audio.play(&path) {
            log::warn!("dialog {} failed to start; continuing silent", path.display());
        }

        self.picture_index = 0;
        self.state = PlaybackState::BeginPicture;
    }

    fn begin_picture(&mut self) {
        let scene = self.current_scene().clone();
        let slot = scene.picture_base + self.picture_index;
        let Some(picture) = self.script.picture(slot).cloned() else {
            log::error!(
                "scene {} references picture slot {slot} beyond the populated table",
                scene.folder
            );
            self.state = PlaybackState::BeginDecision;
            return;
        };

        let path = asset_path(&self.base_path, &scene.folder, &picture.bitmap_file);
        if !self.pictures.load_picture(&path) {
            log::warn!("picture {} failed to load; keeping the previous frame", path.display());
        }

        self.wait_timer = picture.duration_seconds();
        log::debug!("holding {} for {:.1}s", picture.bitmap_file, self.wait_timer);
        self.state = PlaybackState::WaitingPicture;
    }

    fn begin_decision(&mut self) {
        let scene = self.current_scene().clone();

        // A lone action is taken on the player's behalf; no decision screen.
        if scene.actions.len() == 1 {
            let action = scene.actions[0];
            self.score += action.score_delta;
            self.set_next_scene(action);
            return;
        }

        let path = asset_path(&self.base_path, &scene.folder, &scene.decision_file);
        if !self.pictures.load_picture(&path) {
            log::warn!("decision background {} failed to load", path.display());
        }
        self.pictures.show_score(&format!("Your score is: {}", self.score));
        log::info!("{} decisions, waiting for input", scene.actions.len());

        self.selection = None;
        self.state = PlaybackState::WaitingDecision;
    }

    fn set_next_scene(&mut self, action: Action) {
        let (target, next_state) = match action.target {
            SceneTarget::EndGame => {
                log::info!("reached an ending with score {}", self.score);
                self.stop();
                return;
            }
            SceneTarget::PreviousDecision => {
                // Backing out changes the scene, so the old scene's dialog
                // must not keep playing.
                self.audio.stop();
                (self.last_decision_scene, PlaybackState::BeginDecision)
            }
            SceneTarget::Scene { id } => {
                let next_state = match action.entry {
                    SceneEntry::Decision => PlaybackState::BeginDecision,
                    SceneEntry::Beginning => PlaybackState::BeginScene,
                };
                (self.script.scene_index_for(id), next_state)
            }
        };

        if self.current_scene().has_decision() {
            self.last_decision_scene = self.scene_index;
        }
        self.scene_index = target;
        self.picture_index = 0;
        self.selection = None;
        self.state = next_state;
    }

    fn current_scene(&self) -> &Scene {
        &self.script.scenes[self.scene_index]
    }
}

/// Per-scene asset paths are the stored name components joined and
/// uppercased; the base directory is used verbatim.
pub fn asset_path(base: &Path, folder: &str, file: &str) -> PathBuf {
    base.join(folder.to_uppercase()).join(file.to_uppercase())
}
