//! Bilinear crop-and-resize and whole-image resize.

use crate::common::*;
use ndarray::ArrayView;

/// Sample one channel vector at a fractional position with bilinear weights.
///
/// Coordinates must be within `[0, height - 1] x [0, width - 1]`.
fn bilinear<T>(image: &ArrayView4<'_, T>, in_y: f64, in_x: f64, output: &mut [f32]) -> Result<()>
where
    T: Float,
{
    let (_, height, width, _) = image.dim();
    let top = in_y.floor() as usize;
    let bottom = (in_y.ceil() as usize).min(height - 1);
    let left = in_x.floor() as usize;
    let right = (in_x.ceil() as usize).min(width - 1);
    let y_lerp = in_y - top as f64;
    let x_lerp = in_x - left as f64;

    for (channel, out) in output.iter_mut().enumerate() {
        let value = |row: usize, col: usize| -> Result<f64> {
            image[[0, row, col, channel]]
                .to_f64()
                .ok_or_else(|| format_err!("pixel value cannot be cast"))
        };
        let top_value = value(top, left)? + (value(top, right)? - value(top, left)?) * x_lerp;
        let bottom_value =
            value(bottom, left)? + (value(bottom, right)? - value(bottom, left)?) * x_lerp;
        *out = (top_value + (bottom_value - top_value) * y_lerp) as f32;
    }

    Ok(())
}

/// Sample positions of a crop along one axis.
///
/// `None` marks positions falling outside the image.
fn crop_positions(start: f64, end: f64, in_size: usize, out_size: usize) -> Vec<Option<f64>> {
    let extent = (in_size - 1) as f64;
    (0..out_size)
        .map(|index| {
            let position = if out_size > 1 {
                start * extent + index as f64 * (end - start) * extent / (out_size - 1) as f64
            } else {
                0.5 * (start + end) * extent
            };
            (0.0..=extent).contains(&position).then(|| position)
        })
        .collect()
}

/// Crop boxes out of a single image and resize each crop to `size`.
///
/// `image` is `1 x H x W x C`. `boxes` is `N x 4` or `1 x N x 4` with
/// normalized `(y1, x1, y2, x2)` rows, and all of them refer to image 0.
/// The output is `N x h x w x C`. Samples outside the image are 0.
pub fn crop_and_resize<T, D>(
    image: ArrayView4<'_, T>,
    boxes: ArrayView<'_, T, D>,
    size: [usize; 2],
) -> Result<Array4<f32>>
where
    T: Float,
    D: Dimension,
{
    let (batch, height, width, channels) = image.dim();
    ensure!(batch == 1, "expect a single image, but got {}", batch);
    ensure!(
        matches!(boxes.shape(), [_, 4] | [1, _, 4]),
        "boxes must be N x 4 or 1 x N x 4, but got {:?}",
        boxes.shape()
    );
    let [crop_height, crop_width] = size;
    ensure!(
        crop_height > 0 && crop_width > 0,
        "crop size must be positive, but got {:?}",
        size
    );

    let coords: Vec<f64> = boxes
        .iter()
        .map(|&value| {
            value
                .to_f64()
                .ok_or_else(|| format_err!("box coordinate cannot be cast"))
        })
        .try_collect()?;
    let num_boxes = coords.len() / 4;
    let mut crops = Array4::<f32>::zeros((num_boxes, crop_height, crop_width, channels));

    if height == 0 || width == 0 {
        return Ok(crops);
    }

    for (mut crop, coord) in crops.outer_iter_mut().zip(coords.chunks_exact(4)) {
        let [y1, x1, y2, x2] = [coord[0], coord[1], coord[2], coord[3]];
        let rows = crop_positions(y1, y2, height, crop_height);
        let cols = crop_positions(x1, x2, width, crop_width);

        for ((row, in_y), (col, in_x)) in iproduct!(rows.iter().enumerate(), cols.iter().enumerate()) {
            let (in_y, in_x) = match (in_y, in_x) {
                (Some(in_y), Some(in_x)) => (*in_y, *in_x),
                _ => continue,
            };
            let mut pixel = crop.slice_mut(s![row, col, ..]);
            let output = pixel
                .as_slice_mut()
                .ok_or_else(|| format_err!("crop buffer is not contiguous"))?;
            bilinear(&image, in_y, in_x, output)?;
        }
    }

    trace!(
        "cropped {} boxes to {}x{}",
        num_boxes,
        crop_height,
        crop_width
    );
    Ok(crops)
}

/// Bilinear resize of an `N x H x W x C` batch to `size`.
///
/// Output pixel `i` samples input position `i * in / out`, clamped at the
/// bottom and right edges.
pub fn resize_images<T>(images: ArrayView4<'_, T>, size: [usize; 2]) -> Result<Array4<f32>>
where
    T: Float,
{
    let (batch, height, width, channels) = images.dim();
    let [out_height, out_width] = size;
    ensure!(
        height > 0 && width > 0,
        "cannot resize empty images of shape {:?}",
        images.shape()
    );

    let mut resized = Array4::<f32>::zeros((batch, out_height, out_width, channels));
    if out_height == 0 || out_width == 0 {
        return Ok(resized);
    }

    let height_scale = height as f64 / out_height as f64;
    let width_scale = width as f64 / out_width as f64;

    for (index, mut output) in resized.outer_iter_mut().enumerate() {
        let image = images.slice(s![index..=index, .., .., ..]);

        for (row, col) in iproduct!(0..out_height, 0..out_width) {
            let in_y = row as f64 * height_scale;
            let in_x = col as f64 * width_scale;
            let mut pixel = output.slice_mut(s![row, col, ..]);
            let buffer = pixel
                .as_slice_mut()
                .ok_or_else(|| format_err!("resize buffer is not contiguous"))?;
            bilinear(&image, in_y, in_x, buffer)?;
        }
    }

    Ok(resized)
}
