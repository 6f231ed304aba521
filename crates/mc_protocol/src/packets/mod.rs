//! Packet schemas for protocol revision 340, grouped by connection state.
//!
//! There is deliberately no derive macro and no master enum here: a packet
//! is just a struct with an `ID` constant and [`crate::Encode`]/
//! [`crate::Decode`] impls. Callers read a [`crate::codec::RawPacket`] off
//! the wire, match on its `id` against the constants below, and call
//! [`crate::codec::RawPacket::decode_body`] with the matching struct. This
//! mirrors how the handler table in the world mirror is actually organized
//! (one match arm per id) rather than forcing every packet through a common
//! trait object.

pub mod handshake;
pub mod login;
pub mod play_clientbound;
pub mod play_serverbound;
pub mod status;
