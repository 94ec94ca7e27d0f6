use uuid::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod naming;
pub use naming::*;

pub mod selection;
pub use selection::SelectionFilter;

/// Marker occupying the first eight bytes of every preview id.
const PREVIEW_PREFIX: [u8; 8] = *b"preview_";

/// A universally unique identifier for sketch entities and features.
/// Client-generated; serialised as the plain UUID string so the solver
/// process can echo it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a new random EntityId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ID from a specific UUID (useful for restoration).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a deterministic ID based on a string seed.
    pub fn new_deterministic(seed: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()))
    }

    /// The reserved all-zero id standing for the sketch origin point.
    pub const fn origin() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_origin(&self) -> bool {
        self.0.is_nil()
    }

    /// Id for an ephemeral preview entity. Slots let one tool keep several
    /// previews alive at once (a rectangle needs four edges).
    pub fn preview(slot: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&PREVIEW_PREFIX);
        bytes[8..].copy_from_slice(&slot.to_be_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Preview entities live only in local view state and are never sent.
    pub fn is_preview(&self) -> bool {
        self.0.as_bytes()[..8] == PREVIEW_PREFIX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
