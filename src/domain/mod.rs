// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each entity has its own subdirectory. Persistence goes through the generic
// `store` layer; nothing here knows which backend sits behind it.
//
// ============================================================================

pub mod order;
pub mod delivery;
