//! Base anchors of a single feature map cell.

use crate::{common::*, utils::cast_array};

/// Anchor generator initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorGeneratorInit {
    /// The side length of the reference square anchor.
    pub base_size: R64,
    /// Height to width ratios.
    pub ratios: Vec<R64>,
    /// Size multipliers applied after the ratio is set.
    pub scales: Vec<R64>,
}

impl Default for AnchorGeneratorInit {
    fn default() -> Self {
        Self {
            base_size: r64(16.0),
            ratios: vec![r64(0.5), r64(1.0), r64(2.0)],
            scales: vec![r64(8.0), r64(16.0), r64(32.0)],
        }
    }
}

impl AnchorGeneratorInit {
    pub fn build(self) -> Result<AnchorGenerator> {
        let Self {
            base_size,
            ratios,
            scales,
        } = self;

        ensure!(base_size > 0.0, "base_size must be positive");
        ensure!(!ratios.is_empty(), "ratios must not be empty");
        ensure!(!scales.is_empty(), "scales must not be empty");
        ensure!(
            ratios.iter().all(|&ratio| ratio > 0.0),
            "ratios must be positive"
        );
        ensure!(
            scales.iter().all(|&scale| scale > 0.0),
            "scales must be positive"
        );

        let base_size = base_size.raw();
        let base = XYXY::from_xyxy([0.0, 0.0, base_size - 1.0, base_size - 1.0]).to_cycxhw();
        let [cy, cx, h, w] = base.cycxhw();
        let area = h * w;

        // ratio-major, scale-minor
        let mut values = Vec::with_capacity(ratios.len() * scales.len() * 4);
        for ratio in &ratios {
            let ws = (area / ratio.raw()).sqrt().round_ties_even();
            let hs = (ws * ratio.raw()).round_ties_even();
            let ratio_anchor = CyCxHW::try_from_cycxhw([cy, cx, hs, ws])?;

            for scale in &scales {
                let anchor = ratio_anchor.try_scale_hw(scale.raw(), scale.raw())?;
                values.extend(anchor.xyxy());
            }
        }

        let anchors = Array2::from_shape_vec((ratios.len() * scales.len(), 4), values)?;
        debug!("generated {} base anchors", anchors.nrows());

        Ok(AnchorGenerator { anchors })
    }
}

/// The immutable set of base anchors.
///
/// Rows are `(x1, y1, x2, y2)` centered on the first cell.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGenerator {
    anchors: Array2<f64>,
}

impl AnchorGenerator {
    pub fn anchors(&self) -> ArrayView2<'_, f64> {
        self.anchors.view()
    }

    /// The number of anchors per feature map cell.
    pub fn num_anchors(&self) -> usize {
        self.anchors.nrows()
    }

    /// The anchors in another float type.
    pub fn anchors_as<T>(&self) -> Result<Array2<T>>
    where
        T: Float,
    {
        cast_array(&self.anchors)
    }
}

/// The 9 default anchors with base size 16, ratios 0.5, 1, 2 and scales 8, 16, 32.
pub fn anchor() -> Result<Array2<f64>> {
    let generator = AnchorGeneratorInit::default().build()?;
    Ok(generator.anchors)
}
