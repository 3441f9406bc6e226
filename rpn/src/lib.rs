//! Region proposal geometry and anchor target assignment.
//!
//! The crate generates anchors, tiles them over a feature map, decodes
//! regression deltas into proposals and picks them with non-maximum
//! suppression. On the training side it labels anchors against ground
//! truth boxes and balances the labels.

mod common;
mod utils;

pub mod anchor;
pub use anchor::*;

pub mod balance;
pub use balance::*;

pub mod batch;
pub use batch::*;

pub mod config;
pub use config::*;

pub mod crop;
pub use crop::*;

pub mod filter;
pub use filter::*;

pub mod labeler;
pub use labeler::*;

pub mod nms;
pub use nms::*;

pub mod overlap;
pub use overlap::*;

pub mod propose;
pub use propose::*;

pub mod shift;
pub use shift::*;

pub mod transform;
pub use transform::*;
