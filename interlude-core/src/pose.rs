//! Pose identifiers.

use crate::events::{CompanionObserver, ObserverError};

/// Renderable pose id for a character's logical pose, e.g. `kyur-wave`.
pub fn pose_id(character: &str, pose: &str) -> String {
    format!("{character}-{pose}")
}

/// Emits pose changes to an observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseEmitter;

impl PoseEmitter {
    /// Notify `observer` that `character` now shows `pose`.
    pub fn emit(
        &self,
        observer: &dyn CompanionObserver,
        character: &str,
        pose: &str,
    ) -> Result<(), ObserverError> {
        observer.on_pose_change(&pose_id(character, pose), pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingObserver;
    use crate::CompanionEvent;

    #[test]
    fn test_pose_id() {
        assert_eq!(pose_id("kyur", "wave"), "kyur-wave");
        assert_eq!(pose_id("default", "thinking"), "default-thinking");
    }

    #[test]
    fn test_emit_passes_both_names() {
        let observer = RecordingObserver::new();
        PoseEmitter.emit(&observer, "kyur", "thinking").unwrap();
        assert_eq!(
            observer.events(),
            vec![CompanionEvent::PoseChanged {
                pose_id: "kyur-thinking".to_string(),
                pose: "thinking".to_string(),
            }]
        );
    }
}
