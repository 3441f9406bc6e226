//! Random subsampling of anchor labels towards a fixed batch composition.

use crate::common::*;
use rand::seq::index;

/// Label balancer initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelBalancerInit {
    /// The number of labeled anchors per image.
    pub batch_size: usize,
    /// The largest share of positives in the batch.
    pub fg_fraction: R64,
}

impl Default for LabelBalancerInit {
    fn default() -> Self {
        Self {
            batch_size: 256,
            fg_fraction: r64(0.5),
        }
    }
}

impl LabelBalancerInit {
    pub fn build(self) -> Result<LabelBalancer> {
        let Self {
            batch_size,
            fg_fraction,
        } = self;

        ensure!(batch_size > 0, "batch_size must be positive");
        ensure!(
            (0.0..=1.0).contains(&fg_fraction.raw()),
            "fg_fraction must be in range of [0.0, 1.0]"
        );

        let num_fg = (fg_fraction.raw() * batch_size as f64).floor() as usize;

        Ok(LabelBalancer { batch_size, num_fg })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBalancer {
    batch_size: usize,
    num_fg: usize,
}

impl LabelBalancer {
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The maximum number of positives kept.
    pub fn num_fg(&self) -> usize {
        self.num_fg
    }

    /// Demote surplus labels to [AnchorLabel::Ignore].
    ///
    /// Surplus positives beyond `num_fg` are dropped first. Then negatives
    /// beyond `batch_size` minus the remaining positives are dropped. Both
    /// draws are uniform without replacement.
    pub fn balance<R>(&self, labels: Vec<AnchorLabel>, rng: &mut R) -> Vec<AnchorLabel>
    where
        R: Rng + ?Sized,
    {
        let labels = subsample(labels, AnchorLabel::Positive, self.num_fg, rng);

        let num_positives = labels.iter().filter(|label| label.is_positive()).count();
        let num_bg = self.batch_size.saturating_sub(num_positives);

        subsample(labels, AnchorLabel::Negative, num_bg, rng)
    }
}

fn subsample<R>(
    mut labels: Vec<AnchorLabel>,
    target: AnchorLabel,
    limit: usize,
    rng: &mut R,
) -> Vec<AnchorLabel>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| **label == target)
        .map(|(index, _)| index)
        .collect();

    if candidates.len() > limit {
        let amount = candidates.len() - limit;
        debug!(
            "subsample {} of {} anchors labeled {}",
            amount,
            candidates.len(),
            target
        );

        index::sample(rng, candidates.len(), amount)
            .into_iter()
            .for_each(|nth| labels[candidates[nth]] = AnchorLabel::Ignore);
    }

    labels
}

/// Balance an array of `-1`, `0` and `1` labels with 256 anchors and a
/// positive fraction of 0.5.
pub fn balance<R>(labels: ArrayView1<'_, i32>, rng: &mut R) -> Result<Array1<i32>>
where
    R: Rng + ?Sized,
{
    let balancer = LabelBalancerInit::default().build()?;
    let labels: Vec<AnchorLabel> = labels
        .iter()
        .map(|&label| AnchorLabel::try_from(label))
        .try_collect()?;
    let balanced = balancer.balance(labels, rng);
    Ok(balanced.into_iter().map(|label| label as i32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(labels: &[AnchorLabel], target: AnchorLabel) -> usize {
        labels.iter().filter(|&&label| label == target).count()
    }

    #[test]
    fn keep_small_sets() {
        let balancer = LabelBalancerInit::default().build().unwrap();
        let mut labels = vec![AnchorLabel::Positive; 10];
        labels.extend(vec![AnchorLabel::Negative; 20]);
        labels.extend(vec![AnchorLabel::Ignore; 5]);

        let mut rng = StdRng::seed_from_u64(1);
        let balanced = balancer.balance(labels.clone(), &mut rng);
        assert_eq!(balanced, labels);
    }

    #[test]
    fn cap_positives_and_negatives() {
        let balancer = LabelBalancerInit::default().build().unwrap();
        assert_eq!(balancer.num_fg(), 128);

        let mut labels = vec![AnchorLabel::Positive; 300];
        labels.extend(vec![AnchorLabel::Negative; 1000]);
        labels.extend(vec![AnchorLabel::Ignore; 50]);

        let mut rng = StdRng::seed_from_u64(2);
        let balanced = balancer.balance(labels, &mut rng);

        assert_eq!(balanced.len(), 1350);
        assert_eq!(count(&balanced, AnchorLabel::Positive), 128);
        assert_eq!(count(&balanced, AnchorLabel::Negative), 128);
        assert_eq!(count(&balanced, AnchorLabel::Ignore), 1350 - 256);
        // ignored anchors stay ignored
        assert!(balanced[1300..]
            .iter()
            .all(|&label| label == AnchorLabel::Ignore));
    }

    #[test]
    fn negatives_fill_the_batch() {
        let balancer = LabelBalancerInit {
            batch_size: 16,
            fg_fraction: r64(0.25),
        }
        .build()
        .unwrap();

        let mut labels = vec![AnchorLabel::Positive; 2];
        labels.extend(vec![AnchorLabel::Negative; 40]);

        let mut rng = StdRng::seed_from_u64(3);
        let balanced = balancer.balance(labels, &mut rng);
        assert_eq!(count(&balanced, AnchorLabel::Positive), 2);
        assert_eq!(count(&balanced, AnchorLabel::Negative), 14);
    }

    #[test]
    fn invariant_holds_for_random_sets() {
        let balancer = LabelBalancerInit::default().build().unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..20 {
            let len = rng.gen_range(0..2000);
            let labels: Vec<AnchorLabel> = (0..len)
                .map(|_| match rng.gen_range(0..3) {
                    0 => AnchorLabel::Ignore,
                    1 => AnchorLabel::Negative,
                    _ => AnchorLabel::Positive,
                })
                .collect();

            let balanced = balancer.balance(labels, &mut rng);
            let num_pos = count(&balanced, AnchorLabel::Positive);
            let num_neg = count(&balanced, AnchorLabel::Negative);
            assert!(num_pos <= balancer.num_fg());
            assert!(num_pos + num_neg <= balancer.batch_size());
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let balancer = LabelBalancerInit::default().build().unwrap();
        let labels = vec![AnchorLabel::Positive; 500];

        let lhs = balancer.balance(labels.clone(), &mut StdRng::seed_from_u64(5));
        let rhs = balancer.balance(labels, &mut StdRng::seed_from_u64(5));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn balance_label_array() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(6);
        let labels = Array1::from_elem(400, 1);
        let balanced = balance(labels.view(), &mut rng)?;
        assert_eq!(balanced.iter().filter(|&&label| label == 1).count(), 128);
        assert_eq!(balanced.iter().filter(|&&label| label == -1).count(), 272);

        let invalid = Array1::from_elem(3, 7);
        assert!(balance(invalid.view(), &mut rng).is_err());
        Ok(())
    }
}
