use serde::Deserialize;
use serde::Serialize;

/// A value taken in <=1s by the Signal Detector: the four independent,
/// individually-unreliable observables composed into success decisions
/// everywhere else in the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub toast: bool,
    pub spinner: bool,
    pub status_changed: bool,
    pub overlay_present: bool,
    pub session_blocked: bool,
    /// Readback of the editor's current status text, if any, regardless of
    /// whether it matches a known phrase.
    pub status_text: Option<String>,
}

impl SignalSnapshot {
    /// Any one signal that, on its own, would justify calling a wait done.
    /// `spinnerCycleDone` is not representable in a single snapshot — it is
    /// the waiter's job to compare across snapshots (see `Waiter` in
    /// `autoblog_core::signal`).
    pub fn has_primary_success_signal(&self) -> bool {
        self.toast || self.status_changed
    }
}
