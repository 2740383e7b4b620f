//! # Input Mapping — Raw Events to Named Actions
//!
//! [`InputMap`] translates raw input events (a keyboard key, a controller
//! button, a controller axis crossing its threshold) into abstract
//! [`UserAction`]s that the game loop polls. The table is rebindable at
//! runtime: a remap mode captures the next released input and binds it to
//! the chosen action.
//!
//! ## Locking
//!
//! One mutex, owned by the instance, serializes everything: event delivery
//! from the poll loop, table mutation by the background load/save threads,
//! and the game loop's per-tick event consumption. The tick bracket
//! ([`begin_update`](InputMap::begin_update)) holds the lock for the whole
//! update, so events arriving mid-update are delayed, never lost.
//!
//! ## Persistence
//!
//! Key mappings live in a plain text file, one `<ActionName> <sourceId>
//! <code>` triple per line. Load and save run on background threads so file
//! I/O never stalls the interactive loop; the returned [`JoinHandle`]s give
//! the caller an explicit completion signal (join before teardown, or drop
//! for fire-and-forget).
//!
//! [`JoinHandle`]: std::thread::JoinHandle

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

// ── Actions and bindings ────────────────────────────────────────────────

/// The abstract actions the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserAction {
    StartEngine,
    StopEngine,
    SpeedUp,
    SpeedDown,
    SteerLeft,
    SteerRight,
    Brake,
    Action,
}

impl UserAction {
    pub const ALL: [UserAction; 8] = [
        UserAction::StartEngine,
        UserAction::StopEngine,
        UserAction::SpeedUp,
        UserAction::SpeedDown,
        UserAction::SteerLeft,
        UserAction::SteerRight,
        UserAction::Brake,
        UserAction::Action,
    ];

    /// The fixed wire name used in the mapping file.
    pub fn name(self) -> &'static str {
        match self {
            UserAction::StartEngine => "StartEngine",
            UserAction::StopEngine => "StopEngine",
            UserAction::SpeedUp => "SpeedUp",
            UserAction::SpeedDown => "SpeedDown",
            UserAction::SteerLeft => "SteerLeft",
            UserAction::SteerRight => "SteerRight",
            UserAction::Brake => "Brake",
            UserAction::Action => "Action",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// Where a raw input event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputSource {
    Keyboard,
    ControllerButton,
    ControllerAxis,
}

impl InputSource {
    fn id(self) -> u32 {
        match self {
            InputSource::Keyboard => 0,
            InputSource::ControllerButton => 1,
            InputSource::ControllerAxis => 2,
        }
    }

    fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(InputSource::Keyboard),
            1 => Some(InputSource::ControllerButton),
            2 => Some(InputSource::ControllerAxis),
            _ => None,
        }
    }
}

/// One raw input: a key, button, or axis code on a source.
///
/// For axes, the sign of `code` carries the direction; the poll loop emits
/// press/release edges when the axis crosses its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binding {
    pub source: InputSource,
    pub code: i32,
}

impl Binding {
    pub fn key(code: i32) -> Self {
        Self {
            source: InputSource::Keyboard,
            code,
        }
    }

    pub fn button(code: i32) -> Self {
        Self {
            source: InputSource::ControllerButton,
            code,
        }
    }

    pub fn axis(code: i32) -> Self {
        Self {
            source: InputSource::ControllerAxis,
            code,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            InputSource::Keyboard => write!(f, "Key {}", self.code),
            InputSource::ControllerButton => write!(f, "Button {}", self.code),
            InputSource::ControllerAxis => write!(f, "Axis {}", self.code),
        }
    }
}

/// An action edge recorded during the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: UserAction,
    pub pressed: bool,
}

// ── The mapping table ───────────────────────────────────────────────────

#[derive(Default)]
struct MapState {
    bindings: HashMap<Binding, UserAction>,
    states: HashMap<UserAction, bool>,
    queued: Vec<ActionEvent>,
    remap_target: Option<UserAction>,
}

impl MapState {
    fn action_state(&self, action: UserAction) -> bool {
        // A press that opened and closed within this tick still counts as
        // active: check the queued edges as well as the current state.
        self.states.get(&action).copied().unwrap_or(false)
            || self.queued.iter().any(|e| e.action == action && e.pressed)
    }
}

/// Thread-safe mapping from raw inputs to named actions.
pub struct InputMap {
    state: Arc<Mutex<MapState>>,
    defaults: HashMap<Binding, UserAction>,
}

/// Recover the inner state even if a panicking thread poisoned the lock;
/// the mapping table has no invariants a partial update could break.
fn lock(state: &Mutex<MapState>) -> MutexGuard<'_, MapState> {
    state.lock().unwrap_or_else(|poison| poison.into_inner())
}

impl InputMap {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MapState::default())),
            defaults: HashMap::new(),
        }
    }

    /// Record the fallback table installed when loading finds no mappings.
    pub fn set_defaults(&mut self, defaults: impl IntoIterator<Item = (Binding, UserAction)>) {
        self.defaults = defaults.into_iter().collect();
    }

    /// Associate a raw input with an action, replacing any previous
    /// association for that input.
    pub fn bind(&self, binding: Binding, action: UserAction) {
        lock(&self.state).bindings.insert(binding, action);
    }

    /// All raw inputs currently bound to `action` (for the remap UI).
    pub fn mapped_bindings(&self, action: UserAction) -> Vec<Binding> {
        let state = lock(&self.state);
        let mut result: Vec<Binding> = state
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(b, _)| *b)
            .collect();
        result.sort();
        result
    }

    // ── Remap mode ──────────────────────────────────────────────────────

    /// Enter remap mode: the next released input binds to `action`.
    pub fn start_remap(&self, action: UserAction) {
        lock(&self.state).remap_target = Some(action);
    }

    /// The action currently awaiting a binding, if any.
    pub fn remap_target(&self) -> Option<UserAction> {
        lock(&self.state).remap_target
    }

    // ── Event delivery ──────────────────────────────────────────────────

    /// Deliver one raw input edge from the poll loop.
    ///
    /// In remap mode every edge is consumed: the binding commits on the
    /// release edge (binding on press would capture the same key-down that
    /// opened the remap screen), and neither edge registers as a normal
    /// action event.
    pub fn process_event(&self, binding: Binding, pressed: bool) {
        let mut state = lock(&self.state);

        if let Some(target) = state.remap_target {
            if !pressed {
                state.bindings.insert(binding, target);
                state.remap_target = None;
            }
            return;
        }

        let Some(&action) = state.bindings.get(&binding) else {
            return;
        };
        state.states.insert(action, pressed);
        state.queued.push(ActionEvent { action, pressed });
    }

    /// Whether `action` is active right now: currently held, or pressed at
    /// some point during this tick's queued events.
    pub fn action_state(&self, action: UserAction) -> bool {
        lock(&self.state).action_state(action)
    }

    /// Begin consuming this tick's queued events.
    ///
    /// The returned guard holds the table lock until dropped, blocking
    /// event delivery for the duration of the update; dropping it clears
    /// the queue.
    pub fn begin_update(&self) -> TickInput<'_> {
        TickInput {
            guard: lock(&self.state),
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Load key mappings from `path` on a background thread.
    ///
    /// A missing/unreadable file or one with no valid entries installs the
    /// defaults instead. Returns `true` from the join handle when the file
    /// supplied the table.
    pub fn load(&self, path: impl Into<PathBuf>) -> thread::JoinHandle<bool> {
        let path = path.into();
        let state = Arc::clone(&self.state);
        let defaults = self.defaults.clone();
        thread::spawn(move || read_mappings(&path, &state, &defaults))
    }

    /// Save the current key mappings to `path` on a background thread.
    pub fn save(&self, path: impl Into<PathBuf>) -> thread::JoinHandle<bool> {
        let path = path.into();
        let state = Arc::clone(&self.state);
        thread::spawn(move || write_mappings(&path, &state))
    }
}

impl Default for InputMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick-scoped view of the queued action events.
///
/// Holds the mapping-table lock; read the edges (and action states) through
/// this guard during the update, then drop it to clear the queue and let
/// event delivery resume.
pub struct TickInput<'a> {
    guard: MutexGuard<'a, MapState>,
}

impl TickInput<'_> {
    /// The action edges recorded since the previous update.
    pub fn events(&self) -> &[ActionEvent] {
        &self.guard.queued
    }

    /// Same as [`InputMap::action_state`], without re-locking.
    pub fn action_state(&self, action: UserAction) -> bool {
        self.guard.action_state(action)
    }
}

impl Drop for TickInput<'_> {
    fn drop(&mut self) {
        self.guard.queued.clear();
    }
}

// ── File format ─────────────────────────────────────────────────────────

fn read_mappings(
    path: &std::path::Path,
    state: &Mutex<MapState>,
    defaults: &HashMap<Binding, UserAction>,
) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!(
                "Could not open '{}' for reading ({e}); using default key mappings",
                path.display()
            );
            lock(state).bindings = defaults.clone();
            return false;
        }
    };

    let mut parsed = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Error reading '{}': {e}", path.display());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_mapping_line(&line) {
            Some((binding, action)) => {
                parsed.insert(binding, action);
            }
            None => log::warn!("Skipping malformed mapping line: '{line}'"),
        }
    }

    let from_file = !parsed.is_empty();
    lock(state).bindings = if from_file { parsed } else { defaults.clone() };
    if !from_file {
        log::warn!(
            "No key mappings in '{}'; using defaults",
            path.display()
        );
    }
    from_file
}

fn parse_mapping_line(line: &str) -> Option<(Binding, UserAction)> {
    let mut fields = line.split_whitespace();
    let action = UserAction::from_name(fields.next()?)?;
    let source = InputSource::from_id(fields.next()?.parse().ok()?)?;
    let code = fields.next()?.parse().ok()?;
    Some((Binding { source, code }, action))
}

fn write_mappings(path: &std::path::Path, state: &Mutex<MapState>) -> bool {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Could not open '{}' for writing: {e}", path.display());
            return false;
        }
    };

    let state = lock(state);
    let mut out = BufWriter::new(file);
    for (binding, action) in &state.bindings {
        if let Err(e) = writeln!(out, "{} {} {}", action.name(), binding.source.id(), binding.code)
        {
            log::warn!("Error writing '{}': {e}", path.display());
            return false;
        }
    }
    if let Err(e) = out.flush() {
        log::warn!("Error writing '{}': {e}", path.display());
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(handle: thread::JoinHandle<bool>) -> bool {
        handle.join().expect("I/O thread panicked")
    }

    #[test]
    fn remap_binds_on_release_not_on_press() {
        let input = InputMap::new();
        let w = Binding::key('W' as i32);

        input.start_remap(UserAction::SpeedUp);

        // The press edge must neither bind nor register as an action.
        input.process_event(w, true);
        assert_eq!(input.remap_target(), Some(UserAction::SpeedUp));
        assert!(!input.action_state(UserAction::SpeedUp));

        // The release edge commits the binding and leaves remap mode.
        input.process_event(w, false);
        assert_eq!(input.remap_target(), None);
        assert_eq!(input.mapped_bindings(UserAction::SpeedUp), vec![w]);

        input.process_event(w, true);
        assert!(input.action_state(UserAction::SpeedUp));
    }

    #[test]
    fn unmapped_inputs_are_ignored() {
        let input = InputMap::new();
        input.process_event(Binding::key(42), true);
        let tick = input.begin_update();
        assert!(tick.events().is_empty());
    }

    #[test]
    fn press_within_a_tick_reads_active_until_consumed() {
        let input = InputMap::new();
        let b = Binding::button(3);
        input.bind(b, UserAction::Brake);

        // Press and release both land before the update runs.
        input.process_event(b, true);
        input.process_event(b, false);

        {
            let tick = input.begin_update();
            assert_eq!(tick.events().len(), 2);
            // The queued press edge keeps the action active for this tick.
            assert!(tick.action_state(UserAction::Brake));
        }

        // Queue consumed; the release is what remains.
        let tick = input.begin_update();
        assert!(tick.events().is_empty());
        assert!(!tick.action_state(UserAction::Brake));
    }

    #[test]
    fn rebinding_an_input_replaces_the_old_action() {
        let input = InputMap::new();
        let b = Binding::key(32);
        input.bind(b, UserAction::Brake);
        input.start_remap(UserAction::Action);
        input.process_event(b, false);

        assert!(input.mapped_bindings(UserAction::Brake).is_empty());
        assert_eq!(input.mapped_bindings(UserAction::Action), vec![b]);
    }

    #[test]
    fn mapping_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.keymap");

        let input = InputMap::new();
        input.bind(Binding::key('W' as i32), UserAction::SpeedUp);
        input.bind(Binding::key('S' as i32), UserAction::SpeedDown);
        input.bind(Binding::button(0), UserAction::StartEngine);
        input.bind(Binding::axis(-2), UserAction::SteerLeft);
        input.bind(Binding::axis(2), UserAction::SteerRight);
        assert!(join(input.save(&path)));

        let reloaded = InputMap::new();
        assert!(join(reloaded.load(&path)));

        for action in UserAction::ALL {
            assert_eq!(
                input.mapped_bindings(action),
                reloaded.mapped_bindings(action),
                "{action:?}"
            );
        }
    }

    #[test]
    fn missing_file_installs_the_defaults() {
        let mut input = InputMap::new();
        input.set_defaults([(Binding::key('W' as i32), UserAction::SpeedUp)]);

        assert!(!join(input.load("does/not/exist.keymap")));
        assert_eq!(
            input.mapped_bindings(UserAction::SpeedUp),
            vec![Binding::key('W' as i32)]
        );
    }

    #[test]
    fn empty_file_installs_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.keymap");
        std::fs::write(&path, "\n\n").unwrap();

        let mut input = InputMap::new();
        input.set_defaults([(Binding::button(7), UserAction::Brake)]);
        assert!(!join(input.load(&path)));
        assert_eq!(
            input.mapped_bindings(UserAction::Brake),
            vec![Binding::button(7)]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.keymap");
        std::fs::write(&path, "SpeedUp 0 87\nNotAnAction 0 1\nBrake nine 2\n").unwrap();

        let input = InputMap::new();
        assert!(join(input.load(&path)));
        assert_eq!(
            input.mapped_bindings(UserAction::SpeedUp),
            vec![Binding::key(87)]
        );
        assert!(input.mapped_bindings(UserAction::Brake).is_empty());
    }

    #[test]
    fn action_names_round_trip() {
        for action in UserAction::ALL {
            assert_eq!(UserAction::from_name(action.name()), Some(action));
        }
    }
}
