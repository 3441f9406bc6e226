//! Box filters against image bounds and degenerate sizes.

use crate::{common::*, utils::cast_scalar};

/// The `(height, width, scale)` description of an input image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub height: f64,
    pub width: f64,
    pub scale: f64,
}

impl ImageInfo {
    pub fn new(height: f64, width: f64, scale: f64) -> Self {
        Self {
            height,
            width,
            scale,
        }
    }
}

impl TryFrom<&[f64]> for ImageInfo {
    type Error = Error;

    fn try_from(from: &[f64]) -> Result<Self, Self::Error> {
        match *from {
            [height, width, scale] => Ok(Self::new(height, width, scale)),
            _ => bail!("image info must have 3 values, but got {}", from.len()),
        }
    }
}

/// Clamp boxes into a `[height, width]` frame.
///
/// Every row may pack several boxes. Columns `0, 4, 8, ..` and `2, 6, ..`
/// are clamped to `[0, width - 1]`, and columns `1, 5, ..` and `3, 7, ..`
/// to `[0, height - 1]`.
pub fn clip<T>(boxes: ArrayView2<'_, T>, shape: [usize; 2]) -> Result<Array2<T>>
where
    T: Float,
{
    ensure!(
        boxes.ncols() % 4 == 0,
        "boxes must come in groups of 4 columns, but got {} columns",
        boxes.ncols()
    );

    let [height, width] = shape;
    let height: T = cast_scalar(height as f64)?;
    let width: T = cast_scalar(width as f64)?;

    let mut clipped = boxes.to_owned();
    clipped.outer_iter_mut().for_each(|mut row| {
        row.exact_chunks_mut(4).into_iter().for_each(|mut group| {
            let rect = XYXY::new_unchecked(group[0], group[1], group[2], group[3]);
            let [x1, y1, x2, y2] = rect.clip_to(height, width).xyxy();
            group[0] = x1;
            group[1] = y1;
            group[2] = x2;
            group[3] = y2;
        });
    });

    Ok(clipped)
}

/// Indices of boxes whose width and height both reach `minimum`.
///
/// Sizes are pixel-inclusive. The indices are ascending.
pub fn filter_boxes<T>(proposals: ArrayView2<'_, T>, minimum: T) -> Result<Vec<usize>>
where
    T: Float,
{
    if proposals.nrows() == 0 {
        return Ok(vec![]);
    }
    ensure!(
        proposals.ncols() == 4,
        "proposals must have 4 columns, but got {}",
        proposals.ncols()
    );

    let indices = proposals
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| {
            let rect = XYXY::new_unchecked(row[0], row[1], row[2], row[3]);
            rect.w() >= minimum && rect.h() >= minimum
        })
        .map(|(index, _)| index)
        .collect();

    Ok(indices)
}

/// Select the anchors located completely inside the image.
///
/// Returns the ascending indices of the kept anchors along with the anchors
/// themselves.
pub fn inside_image<T>(
    anchors: ArrayView2<'_, T>,
    image_info: &ImageInfo,
) -> Result<(Vec<usize>, Array2<T>)>
where
    T: Float,
{
    if anchors.nrows() == 0 {
        return Ok((vec![], Array2::zeros((0, anchors.ncols()))));
    }
    ensure!(
        anchors.ncols() == 4,
        "anchors must have 4 columns, but got {}",
        anchors.ncols()
    );

    let height: T = cast_scalar(image_info.height)?;
    let width: T = cast_scalar(image_info.width)?;

    let inds_inside: Vec<usize> = anchors
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| {
            XYXY::new_unchecked(row[0], row[1], row[2], row[3]).is_inside(height, width)
        })
        .map(|(index, _)| index)
        .collect();
    let inside = anchors.select(Axis(0), &inds_inside);

    Ok((inds_inside, inside))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn clip_packed_groups() -> Result<()> {
        let boxes = array![[-5.0, -1.0, 30.0, 8.0, 2.0, 3.0, 4.0, 50.0]];
        let clipped = clip(boxes.view(), [6, 20])?;
        assert_eq!(
            clipped.row(0).to_vec(),
            vec![0.0, 0.0, 19.0, 5.0, 2.0, 3.0, 4.0, 5.0]
        );
        Ok(())
    }

    #[test]
    fn filter_degenerate_boxes() -> Result<()> {
        let boxes = array![
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, -0.5, 3.0],
            [5.0, 5.0, 9.0, 9.0],
            [5.0, 5.0, 9.0, 5.5],
        ];
        assert_eq!(filter_boxes(boxes.view(), 1.0)?, vec![0, 2, 3]);
        assert_eq!(filter_boxes(boxes.view(), 2.0)?, vec![2]);
        Ok(())
    }

    #[test]
    fn filter_empty_boxes() -> Result<()> {
        let boxes = Array2::<f64>::zeros((0, 4));
        assert!(filter_boxes(boxes.view(), 1.0)?.is_empty());
        Ok(())
    }

    #[test]
    fn select_inside_anchors() -> Result<()> {
        let anchors = array![
            [0.0, 0.0, 9.0, 9.0],
            [-1.0, 0.0, 9.0, 9.0],
            [5.0, 5.0, 19.0, 9.0],
            [5.0, 5.0, 20.0, 9.0],
            [5.0, 5.0, 10.0, 10.0],
        ];
        let image_info = ImageInfo::try_from([10.0, 20.0, 1.0].as_slice())?;
        let (inds_inside, inside) = inside_image(anchors.view(), &image_info)?;
        assert_eq!(inds_inside, vec![0, 2]);
        assert_eq!(inside, array![[0.0, 0.0, 9.0, 9.0], [5.0, 5.0, 19.0, 9.0]]);
        Ok(())
    }

    #[test]
    fn reject_short_image_info() {
        assert!(ImageInfo::try_from([10.0, 20.0].as_slice()).is_err());
    }
}
