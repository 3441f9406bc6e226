//! Pairwise intersection over union between box sets.

use crate::common::*;

/// Compute the `N x K` IoU matrix between `N` boxes `a` and `K` boxes `b`.
///
/// Sizes are pixel-inclusive. A pair that shares no pixel scores exactly
/// zero. Degenerate boxes are accepted and contribute no overlap.
pub fn overlap<T>(a: ArrayView2<'_, T>, b: ArrayView2<'_, T>) -> Result<Array2<T>>
where
    T: Float,
{
    let rects_a = to_rects(a)?;
    let rects_b = to_rects(b)?;

    let overlaps = Array2::from_shape_fn((rects_a.len(), rects_b.len()), |(n, k)| {
        rects_a[n].iou_with(&rects_b[k])
    });
    Ok(overlaps)
}

/// Alias of [overlap].
pub fn bbox_overlaps<T>(boxes: ArrayView2<'_, T>, query_boxes: ArrayView2<'_, T>) -> Result<Array2<T>>
where
    T: Float,
{
    overlap(boxes, query_boxes)
}

fn to_rects<T>(boxes: ArrayView2<'_, T>) -> Result<Vec<XYXY<T>>>
where
    T: Float,
{
    if boxes.nrows() == 0 {
        return Ok(vec![]);
    }
    ensure!(
        boxes.ncols() == 4,
        "boxes must have 4 columns, but got {}",
        boxes.ncols()
    );

    let rects = boxes
        .outer_iter()
        .map(|row| XYXY::new_unchecked(row[0], row[1], row[2], row[3]))
        .collect();
    Ok(rects)
}
