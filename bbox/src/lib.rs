//! Pixel-inclusive bounding box types and functions.
//!
//! A box spans the pixels `x1..=x2` and `y1..=y2`, so its width is
//! `x2 - x1 + 1` and its height is `y2 - y1 + 1`.

mod common;

pub use delta::*;
pub mod delta;

pub use rect::*;
pub mod rect;

pub use xyxy::*;
pub mod xyxy;

pub use cycxhw::*;
pub mod cycxhw;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
