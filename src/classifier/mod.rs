//! Activity classification
//!
//! Bridges an external pose classifier to the dialogue: the decision rule,
//! the capability traits a classifier must provide, the bridge and its poll task,
//! and a replay backend for running without a live model.

mod backend;
mod bridge;
mod decision;
mod replay;

pub use backend::{initialize, CameraSettings, ClassifierBackend, ClassifierError, Session};
pub use bridge::ActivityBridge;
pub use decision::LabelRules;
pub use replay::ReplayBackend;

#[cfg(test)]
pub(crate) use backend::{fake, Prediction};
#[cfg(test)]
pub(crate) use bridge::BridgeStatus;
