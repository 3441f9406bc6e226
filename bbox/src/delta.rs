use super::{Rect, XYXY};
use crate::common::*;

/// Anchor-relative box regression offsets.
///
/// `dx` and `dy` shift the anchor center in units of the anchor size, while
/// `dw` and `dh` are log-space size ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delta<T> {
    pub dx: T,
    pub dy: T,
    pub dw: T,
    pub dh: T,
}

impl<T> Delta<T>
where
    T: Float,
{
    pub fn from_array(delta: [T; 4]) -> Self {
        let [dx, dy, dw, dh] = delta;
        Self { dx, dy, dw, dh }
    }

    pub fn to_array(&self) -> [T; 4] {
        [self.dx, self.dy, self.dw, self.dh]
    }

    /// Apply the offsets to an anchor.
    ///
    /// The anchor is measured pixel-inclusively. The predicted corners sit
    /// half the predicted size away from the predicted center on both sides.
    pub fn decode<R>(&self, anchor: &R) -> XYXY<T>
    where
        R: Rect<Type = T>,
    {
        let half = (T::one() + T::one()).recip();
        let Self { dx, dy, dw, dh } = *self;

        let a = anchor.w();
        let b = anchor.h();
        let ctr_x = anchor.x1() + half * a;
        let ctr_y = anchor.y1() + half * b;

        let pred_ctr_x = dx * a + ctr_x;
        let pred_ctr_y = dy * b + ctr_y;
        let pred_w = dw.exp() * a;
        let pred_h = dh.exp() * b;

        XYXY {
            x1: pred_ctr_x - half * pred_w,
            y1: pred_ctr_y - half * pred_h,
            x2: pred_ctr_x + half * pred_w,
            y2: pred_ctr_y + half * pred_h,
        }
    }

    /// Compute the offsets that [Delta::decode] maps back onto `target`.
    ///
    /// The target is measured by its corner distance. A distance that is not
    /// positive, as for a single pixel box, is raised to the machine epsilon
    /// so the size offsets stay finite. Such a target decodes to a box of
    /// nearly zero size at its center.
    pub fn encode<R>(anchor: &R, target: &XYXY<T>) -> Self
    where
        R: Rect<Type = T>,
    {
        let half = (T::one() + T::one()).recip();

        let a = anchor.w();
        let b = anchor.h();
        let ctr_x = anchor.x1() + half * a;
        let ctr_y = anchor.y1() + half * b;

        let target_ctr_x = target.x1 + half * (target.x2 - target.x1);
        let target_ctr_y = target.y1 + half * (target.y2 - target.y1);
        let target_w = (target.x2 - target.x1).max(T::epsilon());
        let target_h = (target.y2 - target.y1).max(T::epsilon());

        Self {
            dx: (target_ctr_x - ctr_x) / a,
            dy: (target_ctr_y - ctr_y) / b,
            dw: (target_w / a).ln(),
            dh: (target_h / b).ln(),
        }
    }
}
