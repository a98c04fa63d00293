#![forbid(unsafe_code)]

pub mod compositor;
pub mod core;
pub mod ease;
pub mod error;
pub mod graph;
pub mod history;
pub mod model;
pub mod nav;
pub mod parallax;
pub mod routes;
pub mod stage;
pub mod tween;

pub use compositor::{Compositor, MountedVisual};
pub use core::{DesignSpace, FitTransform, Viewport, WorldTransform, cover_fit};
pub use ease::Ease;
pub use error::{StagecraftError, StagecraftResult};
pub use graph::{NodeId, SceneGraph};
pub use history::{History, MemoryHistory};
pub use model::{SiteSpec, SceneSpec};
pub use nav::{MotionPreference, NavState, Navigator};
pub use parallax::ParallaxController;
pub use routes::{LinkTarget, RouteTable, resolve_link};
pub use stage::{Stage, StageOpts};
pub use tween::{PropertySet, Repeat, Timing, TweenRuntime};
