//! Layout, view recycling and touch handling for the recents card stack.
//!
//! [`StackSynchronizer`] keeps a bounded set of card views in step with a
//! [`recents_core::TaskStack`]; [`GestureController`] feeds it pointer input.
//! Rendering and task data loading stay behind the [`CardView`],
//! [`TaskDataSource`] and [`RecentsHost`] traits.

pub mod animation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod hw_layers;
pub mod pool;
pub mod synchronizer;
pub mod transform;
pub mod view;

#[cfg(test)]
mod testing;

pub use animation::{AnimationEvent, AnimationId, AnimationTarget, Fling, OnFinish, Scheduler, Tween};
pub use config::{AnimationConfig, LayoutConfig, StackConfig, StackOrientation, TouchConfig, VelocityReset};
pub use error::{PoolError, Result, StackError};
pub use geometry::{Rect, StackGeometry};
pub use gesture::{GestureController, GestureState, PointerAction, PointerEvent, VelocityTracker};
pub use host::{RecentsHost, TaskDataSource};
pub use hw_layers::{HwLayerTransition, HwLayers};
pub use pool::{HandleId, PoolableView, ViewPool};
pub use synchronizer::{StackSynchronizer, SyncReport};
pub use transform::{ScrollBounds, TaskTransform, TransformCalculator};
pub use view::{CardAction, CardActions, CardView, TaskCard};
