//! Anchor labeling against ground truth boxes.

use crate::{
    balance::{LabelBalancer, LabelBalancerInit},
    common::*,
    filter::{inside_image, ImageInfo},
    overlap::overlap,
    utils::cast_scalar,
};

/// Anchor labeler initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorLabelerInit {
    /// Anchors whose best IoU falls below this value are negatives.
    pub negative_overlap: R64,
    /// Anchors whose best IoU reaches this value are positives.
    pub positive_overlap: R64,
    pub balance: LabelBalancerInit,
}

impl Default for AnchorLabelerInit {
    fn default() -> Self {
        Self {
            negative_overlap: r64(0.3),
            positive_overlap: r64(0.7),
            balance: Default::default(),
        }
    }
}

impl AnchorLabelerInit {
    pub fn build(self) -> Result<AnchorLabeler> {
        let Self {
            negative_overlap,
            positive_overlap,
            balance,
        } = self;

        ensure!(
            (0.0..=1.0).contains(&negative_overlap.raw()),
            "negative_overlap must be in range of [0.0, 1.0]"
        );
        ensure!(
            (0.0..=1.0).contains(&positive_overlap.raw()),
            "positive_overlap must be in range of [0.0, 1.0]"
        );
        ensure!(
            negative_overlap <= positive_overlap,
            "negative_overlap must not exceed positive_overlap"
        );

        Ok(AnchorLabeler {
            negative_overlap: negative_overlap.raw(),
            positive_overlap: positive_overlap.raw(),
            balancer: balance.build()?,
        })
    }
}

/// The best matches between anchors and ground truth boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlapping<T> {
    /// The best ground truth of each anchor.
    pub argmax_overlaps_inds: Array1<usize>,
    /// The IoU between each anchor and its best ground truth.
    pub max_overlaps: Array1<T>,
    /// The best anchor of each ground truth.
    pub gt_argmax_overlaps_inds: Array1<usize>,
}

/// A single labeling pass.
///
/// Passes run in [LABEL_RULES] order and later passes override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelRule {
    /// Mark anchors with best IoU below the negative threshold as negatives.
    BelowNegativeOverlap,
    /// Mark the best anchor of every ground truth as positive.
    BestAnchorOfGroundTruth,
    /// Mark anchors with best IoU at or above the positive threshold as positives.
    AbovePositiveOverlap,
}

/// Negatives are assigned first so that positives can clobber them, and
/// once more at the end so that negatives can clobber positives.
pub const LABEL_RULES: [LabelRule; 4] = [
    LabelRule::BelowNegativeOverlap,
    LabelRule::BestAnchorOfGroundTruth,
    LabelRule::AbovePositiveOverlap,
    LabelRule::BelowNegativeOverlap,
];

impl LabelRule {
    fn apply<T>(
        self,
        labels: &[AnchorLabel],
        overlapping: &Overlapping<T>,
        negative_overlap: T,
        positive_overlap: T,
    ) -> Vec<AnchorLabel>
    where
        T: Float,
    {
        let max_overlaps = &overlapping.max_overlaps;

        match self {
            Self::BelowNegativeOverlap => izip!(labels, max_overlaps)
                .map(|(&label, &max_overlap)| {
                    if max_overlap < negative_overlap {
                        AnchorLabel::Negative
                    } else {
                        label
                    }
                })
                .collect(),
            Self::BestAnchorOfGroundTruth => {
                let mut labels = labels.to_vec();
                overlapping
                    .gt_argmax_overlaps_inds
                    .iter()
                    .for_each(|&index| labels[index] = AnchorLabel::Positive);
                labels
            }
            Self::AbovePositiveOverlap => izip!(labels, max_overlaps)
                .map(|(&label, &max_overlap)| {
                    if max_overlap >= positive_overlap {
                        AnchorLabel::Positive
                    } else {
                        label
                    }
                })
                .collect(),
        }
    }
}

/// The labels of anchors inside an image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorTargets {
    /// Indices of the anchors located inside the image.
    pub inds_inside: Vec<usize>,
    /// The best ground truth of each inside anchor.
    pub argmax_overlaps_inds: Array1<usize>,
    /// The label of each inside anchor.
    pub labels: Array1<i32>,
}

impl AnchorTargets {
    /// Scatter the labels back onto all `num_anchors` anchors.
    ///
    /// Anchors outside the image are ignored.
    pub fn unmap_labels(&self, num_anchors: usize) -> Result<Array1<i32>> {
        let mut labels = Array1::from_elem(num_anchors, AnchorLabel::Ignore as i32);
        for (&index, &label) in izip!(&self.inds_inside, &self.labels) {
            ensure!(
                index < num_anchors,
                "anchor index {} is out of bound {}",
                index,
                num_anchors
            );
            labels[index] = label;
        }
        Ok(labels)
    }
}

#[derive(Debug, Clone)]
pub struct AnchorLabeler {
    negative_overlap: f64,
    positive_overlap: f64,
    balancer: LabelBalancer,
}

impl AnchorLabeler {
    pub fn balancer(&self) -> &LabelBalancer {
        &self.balancer
    }

    /// Match anchors against ground truth boxes.
    ///
    /// `y_true` holds ground truth rows whose first 4 columns are
    /// coordinates. `anchors` holds the anchors listed by `inds_inside`.
    /// Ties resolve to the lowest index. Without ground truth every anchor
    /// has a best IoU of zero and points to ground truth 0.
    pub fn overlapping<T>(
        &self,
        y_true: ArrayView2<'_, T>,
        anchors: ArrayView2<'_, T>,
        inds_inside: &[usize],
    ) -> Result<Overlapping<T>>
    where
        T: Float,
    {
        ensure!(
            y_true.ncols() >= 4,
            "ground truth must have at least 4 columns, but got {}",
            y_true.ncols()
        );
        ensure!(
            anchors.nrows() == inds_inside.len(),
            "expect {} anchors, but got {}",
            inds_inside.len(),
            anchors.nrows()
        );

        let overlaps = overlap(anchors, y_true.slice(s![.., ..4]))?;
        let (num_anchors, num_gt) = overlaps.dim();

        let (argmax_overlaps_inds, max_overlaps): (Vec<usize>, Vec<T>) = overlaps
            .outer_iter()
            .map(|row| first_argmax(row.iter().copied()).unwrap_or((0, T::zero())))
            .unzip();

        let gt_argmax_overlaps_inds: Vec<usize> = if num_anchors == 0 {
            vec![]
        } else {
            overlaps
                .columns()
                .into_iter()
                .map(|column| first_argmax(column.iter().copied()).map_or(0, |(index, _)| index))
                .collect()
        };
        debug_assert!(num_anchors == 0 || gt_argmax_overlaps_inds.len() == num_gt);

        Ok(Overlapping {
            argmax_overlaps_inds: argmax_overlaps_inds.into(),
            max_overlaps: max_overlaps.into(),
            gt_argmax_overlaps_inds: gt_argmax_overlaps_inds.into(),
        })
    }

    /// Label the anchors and balance the result.
    ///
    /// Labels start as ignored and go through [LABEL_RULES] before the
    /// balancer caps positives and negatives. Returns the best ground truth
    /// index and the label of every anchor.
    pub fn label<T, R>(
        &self,
        y_true: ArrayView2<'_, T>,
        anchors: ArrayView2<'_, T>,
        inds_inside: &[usize],
        rng: &mut R,
    ) -> Result<(Array1<usize>, Array1<i32>)>
    where
        T: Float,
        R: Rng + ?Sized,
    {
        let overlapping = self.overlapping(y_true, anchors, inds_inside)?;
        let negative_overlap: T = cast_scalar(self.negative_overlap)?;
        let positive_overlap: T = cast_scalar(self.positive_overlap)?;

        let labels = LABEL_RULES.iter().fold(
            vec![AnchorLabel::Ignore; inds_inside.len()],
            |labels, rule| rule.apply(&labels, &overlapping, negative_overlap, positive_overlap),
        );

        let count_labels = |labels: &[AnchorLabel]| {
            let num_pos = labels.iter().filter(|label| label.is_positive()).count();
            let num_neg = labels.iter().filter(|label| label.is_negative()).count();
            (num_pos, num_neg)
        };
        let (num_pos, num_neg) = count_labels(&labels);

        let labels = self.balancer.balance(labels, rng);
        let (num_pos_balanced, num_neg_balanced) = count_labels(&labels);
        debug!(
            "labeled {} anchors: {} -> {} positives, {} -> {} negatives",
            labels.len(),
            num_pos,
            num_pos_balanced,
            num_neg,
            num_neg_balanced
        );

        let labels: Array1<i32> = labels.into_iter().map(|label| label as i32).collect();
        Ok((overlapping.argmax_overlaps_inds, labels))
    }

    /// Keep the anchors inside the image and label them.
    pub fn anchor_targets<T, R>(
        &self,
        y_true: ArrayView2<'_, T>,
        anchors: ArrayView2<'_, T>,
        image_info: &ImageInfo,
        rng: &mut R,
    ) -> Result<AnchorTargets>
    where
        T: Float,
        R: Rng + ?Sized,
    {
        let (inds_inside, inside) = inside_image(anchors, image_info)?;
        let (argmax_overlaps_inds, labels) =
            self.label(y_true, inside.view(), &inds_inside, rng)?;

        Ok(AnchorTargets {
            inds_inside,
            argmax_overlaps_inds,
            labels,
        })
    }
}

/// Index and value of the first maximum.
fn first_argmax<T, I>(values: I) -> Option<(usize, T)>
where
    T: Float,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .enumerate()
        .fold(None, |best, (index, value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((index, value)),
        })
}

/// Match anchors against ground truth with the default thresholds.
pub fn overlapping<T>(
    y_true: ArrayView2<'_, T>,
    y_pred: ArrayView2<'_, T>,
    inds_inside: &[usize],
) -> Result<Overlapping<T>>
where
    T: Float,
{
    AnchorLabelerInit::default()
        .build()?
        .overlapping(y_true, y_pred, inds_inside)
}

/// Label anchors with overlap thresholds 0.3 and 0.7, a batch of 256 anchors
/// and a positive fraction of 0.5.
pub fn label<T, R>(
    y_true: ArrayView2<'_, T>,
    y_pred: ArrayView2<'_, T>,
    inds_inside: &[usize],
    rng: &mut R,
) -> Result<(Array1<usize>, Array1<i32>)>
where
    T: Float,
    R: Rng + ?Sized,
{
    AnchorLabelerInit::default()
        .build()?
        .label(y_true, y_pred, inds_inside, rng)
}

/// Flatten ground truth labels into `[x1, y1, x2, y2, class]` rows.
pub fn ground_truth_array<T, C>(labels: &[Label<XYXY<T>, C>]) -> Result<Array2<T>>
where
    T: Float,
    C: NumCast + Copy,
{
    let values: Vec<T> = labels
        .iter()
        .map(|label| label.to_row())
        .flatten_ok()
        .try_collect()?;
    let array = Array2::from_shape_vec((labels.len(), 5), values)?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labeler() -> AnchorLabeler {
        AnchorLabelerInit::default().build().unwrap()
    }

    #[test]
    fn best_matches() -> Result<()> {
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0], [20.0, 20.0, 29.0, 29.0, 2.0]];
        let anchors = array![
            [0.0, 0.0, 9.0, 9.0],
            [0.0, 0.0, 4.0, 9.0],
            [18.0, 18.0, 29.0, 29.0],
            [100.0, 100.0, 109.0, 109.0],
        ];
        let result = labeler().overlapping(y_true.view(), anchors.view(), &[0, 1, 2, 3])?;

        assert_eq!(result.argmax_overlaps_inds, array![0, 0, 1, 0]);
        assert_eq!(result.gt_argmax_overlaps_inds, array![0, 2]);
        assert_eq!(result.max_overlaps[0], 1.0);
        assert_eq!(result.max_overlaps[1], 0.5);
        assert_eq!(result.max_overlaps[2], 100.0 / 144.0);
        assert_eq!(result.max_overlaps[3], 0.0);
        Ok(())
    }

    #[test]
    fn threshold_rules() -> Result<()> {
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0], [20.0, 20.0, 29.0, 29.0, 2.0]];
        let anchors = array![
            // IoU 1.0 with the first ground truth
            [0.0, 0.0, 9.0, 9.0],
            // IoU 0.5, neither negative nor positive
            [0.0, 0.0, 4.0, 9.0],
            // IoU 0.69, forced positive as the best match of the second ground truth
            [18.0, 18.0, 29.0, 29.0],
            // no overlap
            [100.0, 100.0, 109.0, 109.0],
        ];

        let mut rng = StdRng::seed_from_u64(0);
        let (argmax, labels) =
            labeler().label(y_true.view(), anchors.view(), &[0, 1, 2, 3], &mut rng)?;
        assert_eq!(argmax, array![0, 0, 1, 0]);
        assert_eq!(labels, array![1, -1, 1, 0]);
        Ok(())
    }

    #[test]
    fn negative_rule_overrides_forced_positive() -> Result<()> {
        // the best anchor of the ground truth only reaches IoU 0.1
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0]];
        let anchors = array![[0.0, 0.0, 9.0, 0.0], [50.0, 50.0, 59.0, 59.0]];

        let mut rng = StdRng::seed_from_u64(0);
        let (_, labels) = labeler().label(y_true.view(), anchors.view(), &[0, 1], &mut rng)?;
        assert_eq!(labels, array![0, 0]);
        Ok(())
    }

    #[test]
    fn rule_passes_are_pure() {
        let overlapping = Overlapping {
            argmax_overlaps_inds: array![0, 0, 0],
            max_overlaps: array![0.1, 0.5, 0.9],
            gt_argmax_overlaps_inds: array![1],
        };
        let labels = vec![AnchorLabel::Ignore; 3];

        let negatives = LabelRule::BelowNegativeOverlap.apply(&labels, &overlapping, 0.3, 0.7);
        assert_eq!(
            negatives,
            vec![AnchorLabel::Negative, AnchorLabel::Ignore, AnchorLabel::Ignore]
        );
        let best = LabelRule::BestAnchorOfGroundTruth.apply(&negatives, &overlapping, 0.3, 0.7);
        assert_eq!(
            best,
            vec![AnchorLabel::Negative, AnchorLabel::Positive, AnchorLabel::Ignore]
        );
        let positives = LabelRule::AbovePositiveOverlap.apply(&best, &overlapping, 0.3, 0.7);
        assert_eq!(
            positives,
            vec![AnchorLabel::Negative, AnchorLabel::Positive, AnchorLabel::Positive]
        );
        assert_eq!(labels, vec![AnchorLabel::Ignore; 3]);
    }

    #[test]
    fn no_ground_truth() -> Result<()> {
        let y_true = Array2::<f64>::zeros((0, 5));
        let anchors = array![[0.0, 0.0, 9.0, 9.0], [5.0, 5.0, 9.0, 9.0]];

        let mut rng = StdRng::seed_from_u64(0);
        let (argmax, labels) = label(y_true.view(), anchors.view(), &[0, 1], &mut rng)?;
        assert_eq!(argmax, array![0, 0]);
        assert_eq!(labels, array![0, 0]);
        Ok(())
    }

    #[test]
    fn no_anchors() -> Result<()> {
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0]];
        let anchors = Array2::<f64>::zeros((0, 4));

        let mut rng = StdRng::seed_from_u64(0);
        let (argmax, labels) = label(y_true.view(), anchors.view(), &[], &mut rng)?;
        assert!(argmax.is_empty());
        assert!(labels.is_empty());
        Ok(())
    }

    #[test]
    fn reject_mismatched_inds_inside() {
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0]];
        let anchors = array![[0.0, 0.0, 9.0, 9.0]];
        assert!(overlapping(y_true.view(), anchors.view(), &[0, 1]).is_err());

        let y_true = array![[0.0, 0.0, 9.0]];
        assert!(overlapping(y_true.view(), anchors.view(), &[0]).is_err());
    }

    #[test]
    fn targets_scatter_back() -> Result<()> {
        let y_true = array![[0.0, 0.0, 9.0, 9.0, 1.0]];
        let anchors = array![
            [-5.0, 0.0, 4.0, 9.0],
            [0.0, 0.0, 9.0, 9.0],
            [10.0, 10.0, 19.0, 19.0],
        ];
        let image_info = ImageInfo::new(20.0, 20.0, 1.0);

        let mut rng = StdRng::seed_from_u64(0);
        let targets = labeler().anchor_targets(y_true.view(), anchors.view(), &image_info, &mut rng)?;
        assert_eq!(targets.inds_inside, vec![1, 2]);
        assert_eq!(targets.labels, array![1, 0]);
        assert_eq!(targets.unmap_labels(3)?, array![-1, 1, 0]);
        assert!(targets.unmap_labels(2).is_err());
        Ok(())
    }

    #[test]
    fn flatten_ground_truth() -> Result<()> {
        let labels: Vec<Label<XYXY<f64>, usize>> = vec![
            Label::try_from_row(&[0.0, 0.0, 9.0, 9.0, 1.0])?,
            Label::try_from_row(&[20.0, 20.0, 29.0, 29.0, 2.0])?,
        ];
        let array = ground_truth_array(&labels)?;
        assert_eq!(
            array,
            array![[0.0, 0.0, 9.0, 9.0, 1.0], [20.0, 20.0, 29.0, 29.0, 2.0]]
        );
        Ok(())
    }
}
