// SPDX-License-Identifier: MIT OR Apache-2.0
//! Room designer session orchestration.
//!
//! Glues the core history and reconciler to a live scene:
//! - [`bridge`]: the interface to the embedded 3D scene, plus an in-memory scene
//! - [`session`]: records actions and applies undo/redo by reconciliation
//! - [`document`]: saving and opening room files
//! - [`script`]: headless replay of scripted user operations
//! - [`config`]: designer settings

pub mod bridge;
pub mod config;
pub mod document;
pub mod script;
pub mod session;

pub use bridge::{BridgeError, MemoryScene, SceneBridge};
pub use config::{ConfigError, DesignerConfig};
pub use document::{load_snapshot, save_snapshot, DocumentError};
pub use script::{run_script, ReplayReport, Script, ScriptError, ScriptStep};
pub use session::{CheckpointOutcome, DesignSession, SessionError, SessionId, SharedSession};
