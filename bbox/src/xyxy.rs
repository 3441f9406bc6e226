use super::{CyCxHW, Rect};
use crate::common::*;

/// Bounding box in corner format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XYXY<T> {
    pub(crate) x1: T,
    pub(crate) y1: T,
    pub(crate) x2: T,
    pub(crate) y2: T,
}

impl<T> XYXY<T> {
    /// Build a box without checking the corners.
    ///
    /// Regressed and array-backed boxes may be degenerate. Such boxes are
    /// valid data here and simply have a non-positive area.
    pub fn new_unchecked(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl<T> Rect for XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x1(&self) -> Self::Type {
        self.x1
    }

    fn y1(&self) -> Self::Type {
        self.y1
    }

    fn x2(&self) -> Self::Type {
        self.x2
    }

    fn y2(&self) -> Self::Type {
        self.y2
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.x1 + self.w() / two
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.y1 + self.h() / two
    }

    fn w(&self) -> Self::Type {
        self.x2 - self.x1 + T::one()
    }

    fn h(&self) -> Self::Type {
        self.y2 - self.y1 + T::one()
    }

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self> {
        let [x1, y1, x2, y2] = xyxy;
        let one = T::one();
        ensure!(
            x2 + one >= x1 && y2 + one >= y1,
            "x2 >= x1 - 1 and y2 >= y1 - 1 must hold"
        );

        Ok(Self { x1, y1, x2, y2 })
    }

    fn try_from_cycxhw(cycxhw: [Self::Type; 4]) -> Result<Self> {
        let [cy, cx, h, w] = cycxhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");

        let two = T::one() + T::one();
        let x1 = cx - w / two;
        let y1 = cy - h / two;
        let x2 = x1 + w - T::one();
        let y2 = y1 + h - T::one();

        Ok(Self { x1, y1, x2, y2 })
    }
}

impl<T> From<CyCxHW<T>> for XYXY<T>
where
    T: Copy + Num,
{
    fn from(from: CyCxHW<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&CyCxHW<T>> for XYXY<T>
where
    T: Copy + Num,
{
    fn from(from: &CyCxHW<T>) -> Self {
        let two = T::one() + T::one();
        let CyCxHW { cy, cx, h, w } = *from;
        let x1 = cx - w / two;
        let y1 = cy - h / two;
        let x2 = x1 + w - T::one();
        let y2 = y1 + h - T::one();
        Self { x1, y1, x2, y2 }
    }
}
