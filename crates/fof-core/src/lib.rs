pub mod error;
pub mod export;
pub mod geometry;
pub mod id;
pub mod interchange;
pub mod layout;
pub mod model;
pub mod starter;
pub mod storage;
pub mod viewport;

pub use error::{DiagramError, ExportError, ImportError};
pub use export::{ExportFormat, RasterExporter, export_bounds};
pub use id::{DrawingId, EdgeId, NodeId};
pub use interchange::{FORMAT_VERSION, Imported, SanitizeReport, export_json, import_json};
pub use layout::{GridSettings, LaneConfig, LaneGrouping, LayoutSettings, Swimlane};
pub use model::*;
pub use starter::starter_diagram;
pub use storage::{MemoryStore, SnapshotStore, StorageError};
pub use viewport::{ContainerRect, ViewportTransform, screen_to_world, world_to_screen};
