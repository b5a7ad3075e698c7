pub mod connect;
pub mod document;
pub mod drag;
pub mod editor;
pub mod engine;
pub mod frame;
pub mod history;
pub mod input;
pub mod mutation;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;
pub mod viewport;

pub use connect::{ConnectionState, Connector};
pub use document::{Document, Proposal, Record};
pub use editor::{Editor, SaveStatus};
pub use engine::{CanvasEngine, EngineOutput};
pub use history::{History, HistoryConfig, MergeKey, MergeWindows};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use mutation::{EdgeField, GraphMutation, NodeField};
pub use selection::{InspectorTarget, Selection};
pub use session::{EdgeDefaults, SessionState};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::ToolKind;
