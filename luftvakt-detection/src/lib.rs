//! # Luftvakt Detection Engine
//!
//! Crate for plugin-based attack detection over validated 802.11 frames.
//!
//! ### Key Submodules:
//! - `plugin`: Detector capability traits and admission settings
//! - `state`: Per-plugin evidence windows and attack state machine
//! - `dispatch`: Registration-ordered routing of frames to detectors
//! - `ownership`: Own-network MAC filter
//! - `signatures`: Aho-Corasick matcher
//! - `plugins`: Built-in detectors

pub mod dispatch;
pub mod frame;
pub mod ownership;
pub mod plugin;
pub mod plugins;
pub mod signatures;
pub mod state;

pub use dispatch::{DispatchReport, Dispatcher};
pub use frame::{EvidenceFrame, Frame};
pub use ownership::{OwnMacSet, OwnershipFilter};
pub use plugin::{Detector, FramePlugin, PluginSettings, StatefulPlugin};
pub use signatures::SignatureEngine;
pub use state::{Alert, AnalysisWindow, AttackState, EvidenceBuffer, PluginSlot, StepOutcome};
