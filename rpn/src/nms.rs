//! Greedy non-maximum suppression.

use crate::common::*;

/// Non-maximum suppression initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonMaxSuppressionInit {
    pub iou_threshold: R64,
}

impl Default for NonMaxSuppressionInit {
    fn default() -> Self {
        Self {
            iou_threshold: r64(0.5),
        }
    }
}

impl NonMaxSuppressionInit {
    pub fn build(self) -> Result<NonMaxSuppression> {
        let Self { iou_threshold } = self;
        ensure!(
            (0.0..=1.0).contains(&iou_threshold.raw()),
            "iou_threshold must be in range of [0.0, 1.0]"
        );

        Ok(NonMaxSuppression {
            iou_threshold: iou_threshold.raw() as f32,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NonMaxSuppression {
    iou_threshold: f32,
}

impl NonMaxSuppression {
    /// Select boxes greedily by descending score.
    ///
    /// Returns the indices of kept boxes, highest score first, at most
    /// `maximum` of them. A box is dropped when its IoU with an already kept
    /// box exceeds the threshold. Among equal scores the lower index is
    /// visited first.
    pub fn forward(
        &self,
        boxes: ArrayView2<'_, f32>,
        scores: ArrayView1<'_, f32>,
        maximum: usize,
    ) -> Result<Vec<usize>> {
        ensure!(
            boxes.nrows() == scores.len(),
            "expect {} scores, but got {}",
            boxes.nrows(),
            scores.len()
        );
        if boxes.nrows() == 0 || maximum == 0 {
            return Ok(vec![]);
        }
        ensure!(
            boxes.ncols() == 4,
            "boxes must have 4 columns, but got {}",
            boxes.ncols()
        );

        let bboxes: Vec<_> = boxes
            .outer_iter()
            .map(|row| BndBox::new(row[0], row[1], row[2], row[3]))
            .collect();

        // stable sort keeps the lower index first among ties
        let mut order: Vec<usize> = (0..bboxes.len()).collect();
        order.sort_by(|&lhs, &rhs| scores[rhs].total_cmp(&scores[lhs]));

        let mut keep: Vec<usize> = vec![];

        for &candidate in &order {
            if keep.len() >= maximum {
                break;
            }

            let candidate_bbox = &bboxes[candidate];
            let suppressed = keep
                .iter()
                .any(|&kept| bboxes[kept].iou_with(candidate_bbox) > self.iou_threshold);

            if !suppressed {
                keep.push(candidate);
            }
        }

        trace!("nms kept {} out of {} boxes", keep.len(), bboxes.len());
        Ok(keep)
    }
}

/// Run non-maximum suppression with the given IoU threshold.
pub fn non_maximum_suppression(
    boxes: ArrayView2<'_, f32>,
    scores: ArrayView1<'_, f32>,
    maximum: usize,
    threshold: f32,
) -> Result<Vec<usize>> {
    let nms = NonMaxSuppressionInit {
        iou_threshold: R64::try_new(threshold as f64)
            .ok_or_else(|| format_err!("threshold must be a number"))?,
    }
    .build()?;
    nms.forward(boxes, scores, maximum)
}

/// Box in continuous corner geometry.
///
/// Suppression measures extents as `x2 - x1` and accepts corners in either
/// order.
struct BndBox {
    t: f32,
    l: f32,
    b: f32,
    r: f32,
}

impl BndBox {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            t: y1.min(y2),
            l: x1.min(x2),
            b: y1.max(y2),
            r: x1.max(x2),
        }
    }

    fn area(&self) -> f32 {
        (self.b - self.t) * (self.r - self.l)
    }

    fn iou_with(&self, other: &Self) -> f32 {
        let area_lhs = self.area();
        let area_rhs = other.area();
        if area_lhs <= 0.0 || area_rhs <= 0.0 {
            return 0.0;
        }

        let h = (self.b.min(other.b) - self.t.max(other.t)).max(0.0);
        let w = (self.r.min(other.r) - self.l.max(other.l)).max(0.0);
        let inter_area = h * w;
        inter_area / (area_lhs + area_rhs - inter_area)
    }
}
