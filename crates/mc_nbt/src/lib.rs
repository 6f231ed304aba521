//! Binary [NBT] support for the protocol-340 codec.
//!
//! This crate only implements the binary wire format: no SNBT, no serde
//! bridge, no path queries. The proxy only ever needs NBT for item tags and
//! chunk block entities read off (and replayed back onto) the wire.
//!
//! [NBT]: https://minecraft.wiki/w/NBT_format

mod binary;
mod error;
mod tag;
mod value;

pub use binary::{from_binary, to_binary};
pub use error::{Error, Result};
pub use tag::Tag;
pub use value::{Compound, List, Value};
