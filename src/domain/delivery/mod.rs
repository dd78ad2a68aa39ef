// ============================================================================
// Delivery Domain - the courier record
// ============================================================================
//
// Couriers are managed elsewhere. Order assignment only reads the profile and
// owns two fields of the document: `status` and `currentOrder`. The binary
// can load an initial roster from config (`seed`).
//
// ============================================================================

pub mod entity;
pub mod seed;

pub use entity::*;
pub use seed::*;
