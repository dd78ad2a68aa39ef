// ============================================================================
// Order Domain - lifecycle of a delivery order
// ============================================================================
//
// - Value objects and the stored Order document
// - Commands (CreateOrder, LocationUpdate) with input validation
// - Lifecycle policy (the transition table)
// - Transactional components: number generator, assignment coordinator,
//   status updater, tracking recorder
// - OrderService, the facade the API layer talks to
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod entity;
pub mod policy;
pub mod routing;
pub mod number;
pub mod assignment;
pub mod status;
pub mod tracking;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use entity::*;
pub use policy::*;
pub use routing::*;
pub use number::*;
pub use assignment::*;
pub use status::*;
pub use tracking::*;
pub use service::*;
