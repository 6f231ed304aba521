//! Structured snapshot of everything a 1.12.2 play session has told us about
//! the world, assembled incrementally from the upstream packet stream, plus
//! the replay engine that turns a snapshot back into a join sequence for a
//! freshly attached downstream client.

pub mod chunk;
pub mod entity;
pub mod handlers;
pub mod mirror;
pub mod replay;

pub use chunk::{Chunk, ChunkSection};
pub use entity::{Entity, EntityCommon, Position, Velocity};
pub use mirror::WorldMirror;
