//! Tiling of base anchors over a feature map.

use crate::common::*;

/// Tile `anchors` over every cell of a feature map of `[height, width]` cells.
///
/// Cell `(row, col)` shifts the anchors by `col * stride` horizontally and
/// `row * stride` vertically. The output holds `height * width * A` boxes,
/// all anchors of cell 0 first, then all anchors of cell 1, with cells in
/// row-major order. This is the order of a `1 x H x W x 4A` tensor flattened
/// into rows of 4.
pub fn shift<T>(shape: [usize; 2], stride: usize, anchors: ArrayView2<'_, T>) -> Result<Array2<T>>
where
    T: Float,
{
    ensure!(
        anchors.ncols() == 4,
        "anchors must have 4 columns, but got {}",
        anchors.ncols()
    );
    ensure!(stride > 0, "stride must be positive");

    let [height, width] = shape;
    let num_anchors = anchors.nrows();
    let stride = T::from(stride).ok_or_else(|| format_err!("stride cannot be cast"))?;
    let to_float = |index: usize| T::from(index).ok_or_else(|| format_err!("index overflow"));

    let mut values = Vec::with_capacity(height * width * num_anchors * 4);
    for (row, col) in iproduct!(0..height, 0..width) {
        let shift_x = to_float(col)? * stride;
        let shift_y = to_float(row)? * stride;

        for anchor in anchors.outer_iter() {
            values.extend([
                anchor[0] + shift_x,
                anchor[1] + shift_y,
                anchor[2] + shift_x,
                anchor[3] + shift_y,
            ]);
        }
    }

    let shifted = Array2::from_shape_vec((height * width * num_anchors, 4), values)?;
    trace!(
        "shifted {} anchors over a {}x{} grid",
        num_anchors,
        height,
        width
    );
    Ok(shifted)
}
