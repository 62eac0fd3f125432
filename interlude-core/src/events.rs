//! Events the companion emits and the observer seam that receives them.

use crate::content::{Feature, Verification};
use crate::phase::PhaseKind;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Error returned by an observer callback.
///
/// The companion logs these and carries on; a failing renderer never stops
/// the tick.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// One piece of content presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: PhaseKind,
    /// Logical pose shown alongside the content.
    pub pose: String,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
}

impl Interaction {
    /// A pose-only interaction with no message.
    pub fn micro(pose: impl Into<String>) -> Self {
        Self {
            kind: PhaseKind::Micro,
            pose: pose.into(),
            message: None,
            field: None,
            feature: None,
        }
    }

    pub fn message(kind: PhaseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            pose: kind.pose().to_string(),
            message: Some(message.into()),
            field: None,
            feature: None,
        }
    }

    pub fn verification(verification: &Verification) -> Self {
        Self {
            field: Some(verification.field.clone()),
            ..Self::message(PhaseKind::Verify, verification.question.clone())
        }
    }

    pub fn discovery(feature: &Feature) -> Self {
        Self {
            feature: Some(feature.id.clone()),
            ..Self::message(PhaseKind::Discover, feature.prompt.clone())
        }
    }
}

/// Receives everything the companion wants rendered.
///
/// All methods default to doing nothing, so implementors only override what
/// they render.
pub trait CompanionObserver: Send + Sync {
    fn on_interaction(&self, _interaction: &Interaction) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_pose_change(&self, _pose_id: &str, _pose: &str) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Fired after `on_interaction` when a verification is drawn.
    fn on_verification_request(&self, _verification: &Verification) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Fired after `on_interaction` when a feature is drawn.
    fn on_feature_discovery(&self, _feature: &Feature) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CompanionObserver for NoopObserver {}

/// Every observer callback as a single serializable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompanionEvent {
    PoseChanged { pose_id: String, pose: String },
    Interaction(Interaction),
    VerificationRequested(Verification),
    FeatureDiscovered(Feature),
}

/// Forwards callbacks over an mpsc channel, e.g. to a transport task.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<CompanionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<CompanionEvent>) -> Self {
        Self { tx }
    }

    /// Create an observer together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CompanionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: CompanionEvent) -> Result<(), ObserverError> {
        self.tx
            .send(event)
            .map_err(|_| "event receiver dropped".into())
    }
}

impl CompanionObserver for ChannelObserver {
    fn on_interaction(&self, interaction: &Interaction) -> Result<(), ObserverError> {
        self.send(CompanionEvent::Interaction(interaction.clone()))
    }

    fn on_pose_change(&self, pose_id: &str, pose: &str) -> Result<(), ObserverError> {
        self.send(CompanionEvent::PoseChanged {
            pose_id: pose_id.to_string(),
            pose: pose.to_string(),
        })
    }

    fn on_verification_request(&self, verification: &Verification) -> Result<(), ObserverError> {
        self.send(CompanionEvent::VerificationRequested(verification.clone()))
    }

    fn on_feature_discovery(&self, feature: &Feature) -> Result<(), ObserverError> {
        self.send(CompanionEvent::FeatureDiscovered(feature.clone()))
    }
}
