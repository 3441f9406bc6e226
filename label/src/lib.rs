//! Ground truth boxes and anchor training labels.

use anyhow::{bail, ensure, format_err, Result};
use bbox::{Rect, RectNum, XYXY};
use num_traits::{Float, NumCast};
use std::fmt;

/// A ground truth box with its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<T, C> Label<XYXY<T>, C>
where
    T: Float,
    C: NumCast,
{
    /// Parse a ground truth row laid out as `[x1, y1, x2, y2, class, ..]`.
    pub fn try_from_row(row: &[T]) -> Result<Self> {
        ensure!(
            row.len() >= 5,
            "a ground truth row needs at least 5 columns, but got {}",
            row.len()
        );
        let rect = XYXY::try_from_xyxy([row[0], row[1], row[2], row[3]])?;
        let class = C::from(row[4])
            .ok_or_else(|| format_err!("invalid class id {:?}", row[4].to_f64()))?;
        Ok(Self { rect, class })
    }

    /// Flatten into `[x1, y1, x2, y2, class]`.
    pub fn to_row(&self) -> Result<[T; 5]>
    where
        C: Copy,
    {
        let [x1, y1, x2, y2] = self.rect.xyxy();
        let class = T::from(self.class).ok_or_else(|| format_err!("class id is not representable"))?;
        Ok([x1, y1, x2, y2, class])
    }
}

/// The training label of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum AnchorLabel {
    /// Excluded from the loss.
    Ignore = -1,
    Negative = 0,
    Positive = 1,
}

impl AnchorLabel {
    pub fn is_positive(&self) -> bool {
        *self == Self::Positive
    }

    pub fn is_negative(&self) -> bool {
        *self == Self::Negative
    }
}

impl Default for AnchorLabel {
    fn default() -> Self {
        Self::Ignore
    }
}

impl From<AnchorLabel> for i32 {
    fn from(from: AnchorLabel) -> Self {
        from as i32
    }
}

impl TryFrom<i32> for AnchorLabel {
    type Error = anyhow::Error;

    fn try_from(from: i32) -> Result<Self, Self::Error> {
        let label = match from {
            -1 => Self::Ignore,
            0 => Self::Negative,
            1 => Self::Positive,
            _ => bail!("invalid anchor label {}", from),
        };
        Ok(label)
    }
}

impl fmt::Display for AnchorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as i32)
    }
}
