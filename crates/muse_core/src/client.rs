//! crates/muse_core/src/client.rs
//!
//! The client-side state container: a pure state machine tracking
//! authentication and per-module request status, plus a dispatching
//! container that owns an injected persistence port. The container never
//! performs network calls - it only records the outcome of calls issued by
//! its collaborating UI code.

use crate::domain::UserProfile;
use serde_json;

/// Storage key for the opaque auth token.
pub const TOKEN_KEY: &str = "muse.authToken";
/// Storage key for the serialized user profile.
pub const USER_KEY: &str = "muse.authUser";

/// A synchronous key-value persistence port, backed by whatever durable
/// store the platform offers (browser-local storage, a file, ...).
pub trait StoragePort {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Request status for one capability module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// The capability modules the UI dispatches requests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Writing,
    SoundDesign,
    ChordProgression,
    Drawing,
}

/// Authentication state: anonymous, or authenticated with a token and the
/// profile it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated {
        token: String,
        user: UserProfile,
    },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }
}

/// The whole client state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientState {
    pub auth: AuthState,
    pub auth_phase: RequestPhase,
    pub writing: RequestPhase,
    pub sound_design: RequestPhase,
    pub chord_progression: RequestPhase,
    pub drawing: RequestPhase,
}

impl ClientState {
    pub fn phase(&self, module: Module) -> &RequestPhase {
        match module {
            Module::Writing => &self.writing,
            Module::SoundDesign => &self.sound_design,
            Module::ChordProgression => &self.chord_progression,
            Module::Drawing => &self.drawing,
        }
    }

    fn phase_mut(&mut self, module: Module) -> &mut RequestPhase {
        match module {
            Module::Writing => &mut self.writing,
            Module::SoundDesign => &mut self.sound_design,
            Module::ChordProgression => &mut self.chord_progression,
            Module::Drawing => &mut self.drawing,
        }
    }
}

/// Everything the UI can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RequestStarted(Module),
    RequestSucceeded(Module),
    RequestFailed(Module, String),
    LoginStarted,
    LoginSucceeded { token: String, user: UserProfile },
    LoginFailed(String),
    LoggedOut,
    /// Startup transition: re-enters `Authenticated` from previously stored
    /// data without touching storage.
    SessionRestored { token: String, user: UserProfile },
}

/// The pure transition function: `(state, action) -> new state`.
/// Deterministic and storage-free, so every transition is unit-testable.
pub fn transition(state: &ClientState, action: &Action) -> ClientState {
    let mut next = state.clone();
    match action {
        Action::RequestStarted(module) => {
            *next.phase_mut(*module) = RequestPhase::Loading;
        }
        Action::RequestSucceeded(module) => {
            *next.phase_mut(*module) = RequestPhase::Success;
        }
        Action::RequestFailed(module, message) => {
            *next.phase_mut(*module) = RequestPhase::Error(message.clone());
        }
        Action::LoginStarted => {
            next.auth_phase = RequestPhase::Loading;
        }
        Action::LoginSucceeded { token, user } | Action::SessionRestored { token, user } => {
            next.auth = AuthState::Authenticated {
                token: token.clone(),
                user: user.clone(),
            };
            next.auth_phase = RequestPhase::Success;
        }
        Action::LoginFailed(message) => {
            next.auth = AuthState::Anonymous;
            next.auth_phase = RequestPhase::Error(message.clone());
        }
        Action::LoggedOut => {
            next.auth = AuthState::Anonymous;
            next.auth_phase = RequestPhase::Idle;
        }
    }
    next
}

/// Owns the current state and the persistence port. Dispatch applies the
/// pure transition, then performs the storage side effects login and logout
/// require.
pub struct StateContainer<S: StoragePort> {
    state: ClientState,
    storage: S,
}

impl<S: StoragePort> StateContainer<S> {
    pub fn new(storage: S) -> Self {
        Self {
            state: ClientState::default(),
            storage,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = transition(&self.state, &action);
        match &action {
            Action::LoginSucceeded { token, user } => {
                self.storage.set(TOKEN_KEY, token);
                if let Ok(serialized) = serde_json::to_string(user) {
                    self.storage.set(USER_KEY, &serialized);
                }
            }
            Action::LoggedOut => {
                self.storage.remove(TOKEN_KEY);
                self.storage.remove(USER_KEY);
            }
            // SessionRestored deliberately leaves storage untouched.
            _ => {}
        }
    }

    /// Reads previously stored credentials and, if both are present and the
    /// profile deserializes, re-enters the authenticated state.
    pub fn restore(&mut self) -> bool {
        let token = self.storage.get(TOKEN_KEY);
        let user = self
            .storage
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str::<UserProfile>(&raw).ok());
        match (token, user) {
            (Some(token), Some(user)) => {
                self.dispatch(Action::SessionRestored { token, user });
                true
            }
            _ => false,
        }
    }
}
