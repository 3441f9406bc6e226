use super::{CyCxHW, XYXY};
use crate::common::*;

/// The generic pixel-inclusive rectangle.
pub trait Rect {
    type Type;

    fn x1(&self) -> Self::Type;
    fn y1(&self) -> Self::Type;
    fn x2(&self) -> Self::Type;
    fn y2(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_cycxhw(cycxhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_xyxy(xyxy: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    fn xyxy(&self) -> [Self::Type; 4] {
        [self.x1(), self.y1(), self.x2(), self.y2()]
    }

    fn cycxhw(&self) -> [Self::Type; 4] {
        [self.cy(), self.cx(), self.h(), self.w()]
    }

    fn to_cycxhw(&self) -> CyCxHW<Self::Type> {
        CyCxHW {
            cy: self.cy(),
            cx: self.cx(),
            h: self.h(),
            w: self.w(),
        }
    }

    fn area(&self) -> <Self::Type as Mul<Self::Type>>::Output
    where
        Self::Type: Mul<Self::Type>,
    {
        self.w() * self.h()
    }

    /// Whether the box lies in the image of the given size.
    ///
    /// The far edges are exclusive: `x2 < width` and `y2 < height`.
    fn is_inside(&self, height: Self::Type, width: Self::Type) -> bool {
        let zero = Self::Type::zero();
        self.x1() >= zero && self.y1() >= zero && self.x2() < width && self.y2() < height
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Compute the overlapping region, or `None` if the boxes share no pixel.
    fn intersect_with<R>(&self, other: &R) -> Option<XYXY<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let x1 = self.x1().max(other.x1());
        let y1 = self.y1().max(other.y1());
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());
        let one = Self::Type::one();
        let zero = Self::Type::zero();
        (x2 - x1 + one > zero && y2 - y1 + one > zero).then(|| XYXY { x1, y1, x2, y2 })
    }

    /// Intersection over union in pixel-inclusive geometry.
    ///
    /// Disjoint boxes yield exactly zero without a division.
    fn iou_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        match self.intersect_with(other) {
            Some(inter) => {
                let inter_area = inter.area();
                let union_area = self.area() + other.area() - inter_area;
                inter_area / union_area
            }
            None => Self::Type::zero(),
        }
    }

    /// Clamp the corners into `[0, width - 1] x [0, height - 1]`.
    fn clip_to(&self, height: Self::Type, width: Self::Type) -> XYXY<Self::Type> {
        let zero = Self::Type::zero();
        let one = Self::Type::one();
        let max_x = width - one;
        let max_y = height - one;
        let clamp = |value: Self::Type, max: Self::Type| value.min(max).max(zero);

        XYXY {
            x1: clamp(self.x1(), max_x),
            y1: clamp(self.y1(), max_y),
            x2: clamp(self.x2(), max_x),
            y2: clamp(self.y2(), max_y),
        }
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}
