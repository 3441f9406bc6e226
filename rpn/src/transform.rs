//! Array level box regression encode and decode.

use crate::common::*;

/// Decode regression deltas against reference boxes.
///
/// `shifted` holds `M` reference boxes and `boxes` holds `M` rows of `K`
/// delta groups laid out as `dx, dy, dw, dh` repeated. The result has the
/// same `M x 4K` shape and is the concatenation of four column blocks:
/// the `x1` values of all `K` groups, then `y1`, then `x2`, then `y2`. For
/// a single group this is a plain `(x1, y1, x2, y2)` row.
///
/// An input without rows yields an empty output of the same column count.
pub fn bbox_transform_inv<T>(
    shifted: ArrayView2<'_, T>,
    boxes: ArrayView2<'_, T>,
) -> Result<Array2<T>>
where
    T: Float,
{
    if boxes.nrows() == 0 {
        return Ok(Array2::zeros((0, boxes.ncols())));
    }

    ensure!(
        shifted.ncols() == 4,
        "reference boxes must have 4 columns, but got {}",
        shifted.ncols()
    );
    ensure!(
        boxes.ncols() % 4 == 0 && boxes.ncols() > 0,
        "deltas must come in groups of 4 columns, but got {} columns",
        boxes.ncols()
    );
    ensure!(
        shifted.nrows() == boxes.nrows(),
        "expect {} reference boxes, but got {}",
        boxes.nrows(),
        shifted.nrows()
    );

    let num_groups = boxes.ncols() / 4;
    let mut output = Array2::zeros(boxes.raw_dim());

    izip!(
        shifted.outer_iter(),
        boxes.outer_iter(),
        output.outer_iter_mut()
    )
    .for_each(|(anchor, deltas, mut output)| {
        let anchor = XYXY::new_unchecked(anchor[0], anchor[1], anchor[2], anchor[3]);

        deltas
            .exact_chunks(4)
            .into_iter()
            .enumerate()
            .for_each(|(group, delta)| {
                let delta = Delta::from_array([delta[0], delta[1], delta[2], delta[3]]);
                let [x1, y1, x2, y2] = delta.decode(&anchor).xyxy();
                output[group] = x1;
                output[num_groups + group] = y1;
                output[num_groups * 2 + group] = x2;
                output[num_groups * 3 + group] = y2;
            });
    });

    Ok(output)
}

/// Encode target boxes as deltas against reference boxes.
///
/// This is the inverse of [bbox_transform_inv] for a single delta group:
/// decoding the returned deltas against `anchors` reproduces `targets`.
pub fn bbox_transform<T>(anchors: ArrayView2<'_, T>, targets: ArrayView2<'_, T>) -> Result<Array2<T>>
where
    T: Float,
{
    ensure!(
        anchors.ncols() == 4 && targets.ncols() >= 4,
        "expect 4 columns in anchors and at least 4 in targets, but got {} and {}",
        anchors.ncols(),
        targets.ncols()
    );
    ensure!(
        anchors.nrows() == targets.nrows(),
        "expect {} anchors, but got {}",
        targets.nrows(),
        anchors.nrows()
    );

    let mut deltas = Array2::zeros((anchors.nrows(), 4));

    izip!(
        anchors.outer_iter(),
        targets.outer_iter(),
        deltas.outer_iter_mut()
    )
    .for_each(|(anchor, target, mut delta)| {
        let anchor = XYXY::new_unchecked(anchor[0], anchor[1], anchor[2], anchor[3]);
        let target = XYXY::new_unchecked(target[0], target[1], target[2], target[3]);
        let encoded = Delta::encode(&anchor, &target).to_array();
        delta.iter_mut().zip(encoded).for_each(|(dst, src)| *dst = src);
    });

    Ok(deltas)
}
