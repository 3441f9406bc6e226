//! Region proposal selection from raw network output.

use crate::{
    anchor::{AnchorGenerator, AnchorGeneratorInit},
    common::*,
    filter::{clip, filter_boxes},
    nms::{NonMaxSuppression, NonMaxSuppressionInit},
    shift::shift,
    transform::bbox_transform_inv,
    utils::{cast_array, cast_scalar},
};

/// Proposal selector initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalSelectorInit {
    /// The feature map stride in input pixels.
    pub stride: usize,
    /// The IoU threshold of non-maximum suppression.
    pub nms_threshold: R64,
    /// The minimum width and height of a proposal.
    pub min_size: R64,
}

impl Default for ProposalSelectorInit {
    fn default() -> Self {
        Self {
            stride: 16,
            nms_threshold: r64(0.7),
            min_size: r64(1.0),
        }
    }
}

impl ProposalSelectorInit {
    pub fn build(self, generator: &AnchorGenerator) -> Result<ProposalSelector> {
        let Self {
            stride,
            nms_threshold,
            min_size,
        } = self;

        ensure!(stride > 0, "stride must be positive");
        ensure!(min_size >= 0.0, "min_size must be non-negative");
        let nms = NonMaxSuppressionInit {
            iou_threshold: nms_threshold,
        }
        .build()?;

        Ok(ProposalSelector {
            anchors: generator.anchors().to_owned(),
            stride,
            min_size: min_size.raw(),
            nms,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProposalSelector {
    anchors: Array2<f64>,
    stride: usize,
    min_size: f64,
    nms: NonMaxSuppression,
}

impl ProposalSelector {
    /// Turn per-cell regression and score maps into ranked proposals.
    ///
    /// `boxes` is `1 x H x W x 4A` and `scores` is `1 x H x W x C` where the
    /// first `A` channels are foreground scores. The output is `1 x M x 4`
    /// with `M <= maximum`, ordered by descending score.
    pub fn forward<T>(
        &self,
        boxes: ArrayView4<'_, T>,
        scores: ArrayView4<'_, T>,
        maximum: usize,
    ) -> Result<Array3<f32>>
    where
        T: Float,
    {
        let num_anchors = self.anchors.nrows();
        let (batch, height, width, channels) = boxes.dim();
        ensure!(batch == 1, "expect batch size 1, but got {}", batch);
        ensure!(
            channels == num_anchors * 4,
            "expect {} regression channels for {} anchors, but got {}",
            num_anchors * 4,
            num_anchors,
            channels
        );
        let (score_batch, score_height, score_width, score_channels) = scores.dim();
        ensure!(
            (score_batch, score_height, score_width) == (batch, height, width),
            "score map shape {:?} does not match regression map shape {:?}",
            scores.shape(),
            boxes.shape()
        );
        ensure!(
            score_channels >= num_anchors,
            "expect at least {} score channels, but got {}",
            num_anchors,
            score_channels
        );

        let shape = [height, width];
        let anchors: Array2<T> = cast_array(&self.anchors)?;
        let shifted = shift(shape, self.stride, anchors.view())?;

        // one row per anchor instance, cell-major like the shifted anchors
        let num_instances = height * width * num_anchors;
        let deltas: Array2<T> =
            Array2::from_shape_vec((num_instances, 4), boxes.iter().copied().collect())?;
        let proposals = bbox_transform_inv(shifted.view(), deltas.view())?;
        let proposals = clip(proposals.view(), shape)?;

        let indices = filter_boxes(proposals.view(), cast_scalar(self.min_size)?)?;
        let proposals = proposals.select(Axis(0), &indices);

        // background channels, if any, follow the foreground ones
        let scores: Array1<T> = scores
            .slice(s![.., .., .., ..num_anchors])
            .iter()
            .copied()
            .collect();
        let scores = scores.select(Axis(0), &indices);

        let proposals: Array2<f32> = cast_array(&proposals)?;
        let scores: Array1<f32> = cast_array(&scores)?;
        debug!(
            "{} of {} decoded proposals pass the size filter",
            proposals.nrows(),
            num_instances
        );

        let keep = self.nms.forward(proposals.view(), scores.view(), maximum)?;
        let proposals = proposals.select(Axis(0), &keep);
        debug!("selected {} proposals", proposals.nrows());

        Ok(proposals.insert_axis(Axis(0)))
    }
}

/// Select at most `maximum` proposals with stride 16, the default 9 anchors
/// and an NMS threshold of 0.7.
pub fn propose<T>(
    boxes: ArrayView4<'_, T>,
    scores: ArrayView4<'_, T>,
    maximum: usize,
) -> Result<Array3<f32>>
where
    T: Float,
{
    let generator = AnchorGeneratorInit::default().build()?;
    let selector = ProposalSelectorInit::default().build(&generator)?;
    selector.forward(boxes, scores, maximum)
}
