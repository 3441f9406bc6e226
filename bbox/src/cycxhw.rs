use super::{Rect, XYXY};
use crate::common::*;

/// Bounding box in CyCxHW format.
///
/// The center lies half a size past the first corner, matching the
/// pixel-inclusive extent of [XYXY].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CyCxHW<T> {
    pub(crate) cy: T,
    pub(crate) cx: T,
    pub(crate) h: T,
    pub(crate) w: T,
}

impl<T> CyCxHW<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_scale_hw(&self, scale_h: T, scale_w: T) -> Result<Self> {
        let zero = T::zero();
        ensure!(
            scale_h > zero && scale_w > zero,
            "scaling factor must be positive"
        );

        let Self { cy, cx, h, w } = *self;
        let h = h * scale_h;
        let w = w * scale_w;
        Ok(Self { cy, cx, h, w })
    }
}

impl<T> Rect for CyCxHW<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x1(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cx - self.w / two
    }

    fn y1(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.cy - self.h / two
    }

    fn x2(&self) -> Self::Type {
        self.x1() + self.w - T::one()
    }

    fn y2(&self) -> Self::Type {
        self.y1() + self.h - T::one()
    }

    fn cx(&self) -> Self::Type {
        self.cx
    }

    fn cy(&self) -> Self::Type {
        self.cy
    }

    fn w(&self) -> Self::Type {
        self.w
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let rect = XYXY::try_from_xyxy(xyxy)?;
        Ok(Self::from(&rect))
    }

    fn try_from_cycxhw(cycxhw: [T; 4]) -> Result<Self> {
        let [cy, cx, h, w] = cycxhw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "box height and width must be non-negative"
        );

        Ok(Self { cy, cx, h, w })
    }
}

impl<T> From<XYXY<T>> for CyCxHW<T>
where
    T: Copy + Num,
{
    fn from(from: XYXY<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&XYXY<T>> for CyCxHW<T>
where
    T: Copy + Num,
{
    fn from(from: &XYXY<T>) -> Self {
        let two = T::one() + T::one();
        let XYXY { x1, y1, x2, y2 } = *from;
        let w = x2 - x1 + T::one();
        let h = y2 - y1 + T::one();
        let cx = x1 + w / two;
        let cy = y1 + h / two;
        Self { cy, cx, h, w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn scale_keeps_center() -> Result<()> {
        let rect = CyCxHW::try_from_cycxhw([8.0, 8.0, 16.0, 16.0])?;
        let scaled = rect.try_scale_hw(2.0, 0.5)?;
        assert_eq!(scaled.cycxhw(), [8.0, 8.0, 32.0, 8.0]);
        assert!(rect.try_scale_hw(0.0, 1.0).is_err());
        Ok(())
    }

    #[test]
    fn corners_are_pixel_inclusive() -> Result<()> {
        let rect = CyCxHW::try_from_cycxhw([8.0, 8.0, 16.0, 16.0])?;
        assert_eq!(rect.xyxy(), [0.0, 0.0, 15.0, 15.0]);
        Ok(())
    }
}
