//! Patch relocation engine.
//!
//! A payload is located in the new module by cutting a window of
//! `margin` bytes on both sides of it out of the old module and searching
//! for that window. The margin starts large and shrinks one byte at a time
//! until the window occurs exactly once.

mod finder;
mod matcher;
mod resolver;
mod session;
mod window;

pub use finder::*;
pub use matcher::*;
pub use resolver::*;
pub use session::*;
pub use window::*;
