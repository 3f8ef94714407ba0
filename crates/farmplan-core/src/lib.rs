//! # farmplan-core
//!
//! Shared domain model, integer scaling, diagnostics, and error taxonomy for
//! the farm planning engine.
//!
//! ## Core Components
//!
//! - [`model::Plan`]: the declarative scheduling problem (horizon, crops,
//!   events, lands, workers, resources, fixed areas, area bounds)
//! - [`scale`]: integer scaling for area/hour quantities and exact rational
//!   labor-rate conversion
//! - [`diagnostics::Diagnostics`]: warning/error collection shared by
//!   validation and infeasibility reporting
//! - [`error::FarmError`]: validation-time error taxonomy

pub mod diagnostics;
pub mod error;
pub mod model;
pub mod scale;

pub use error::{FarmError, FarmResult};
pub use model::{
    CropAreaBound, Event, EventKind, FixedArea, Horizon, Land, Plan, Resource, Worker,
};
pub use model::Crop;
