//! Parallel anchor labeling over a batch of images.

use crate::{
    common::*,
    filter::ImageInfo,
    labeler::{AnchorLabeler, AnchorTargets},
};
use rayon::prelude::*;

/// The ground truth of one image in a batch.
#[derive(Debug, Clone)]
pub struct ImageGroundTruth<'a, T> {
    /// Ground truth rows laid out as `[x1, y1, x2, y2, class]`.
    pub y_true: ArrayView2<'a, T>,
    pub image_info: ImageInfo,
}

impl AnchorLabeler {
    /// Label the same anchor set against every image of a batch in parallel.
    ///
    /// Image `i` draws its subsampling from a generator seeded with
    /// `seed + i`, so the result does not depend on thread scheduling.
    pub fn label_batch<T>(
        &self,
        anchors: ArrayView2<'_, T>,
        images: &[ImageGroundTruth<'_, T>],
        seed: u64,
    ) -> Result<Vec<AnchorTargets>>
    where
        T: Float + Send + Sync,
    {
        images
            .par_iter()
            .enumerate()
            .map(|(index, image)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                self.anchor_targets(image.y_true, anchors, &image.image_info, &mut rng)
                    .with_context(|| format!("failed to label image {}", index))
            })
            .collect()
    }
}
