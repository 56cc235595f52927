//! Farming domain: plow/planter transitions and the minimap overlay they
//! write through to.
//!
//! Pure data driven by `sim`; the Bevy side only hears about the results
//! through `TileChangedEvent`.

pub mod editor;
pub mod overlay;

pub use editor::{playable, transition, FarmEditor};
pub use overlay::MinimapOverlay;
