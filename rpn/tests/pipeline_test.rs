use anyhow::Result;
use ndarray::{array, s, Array2, Array4, ArrayView1};
use rand::{rngs::StdRng, SeedableRng};
use rpn::{shift, Config, ImageInfo};
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
    static ref CONFIG_FILE: PathBuf = CONFIG_DIR.join("rpn.json5");
}

#[test]
fn config_file_matches_defaults() -> Result<()> {
    let config = Config::open(&*CONFIG_FILE)?;
    assert_eq!(config, Config::default());
    Ok(())
}

#[test]
fn missing_config_file() {
    let error = Config::open(CONFIG_DIR.join("missing.json5")).unwrap_err();
    assert!(format!("{:#}", error).contains("missing.json5"));
}

#[test]
fn anchor_targets_end_to_end() -> Result<()> {
    let components = Config::open(&*CONFIG_FILE)?.build()?;
    let (height, width) = (24, 32);
    let anchors = shift([height, width], 16, components.generator.anchors())?;
    let num_anchors = anchors.nrows();

    let y_true = array![
        [48.0, 64.0, 208.0, 192.0, 1.0],
        [220.0, 120.0, 300.0, 290.0, 7.0],
    ];
    let image_info = ImageInfo::new(384.0, 512.0, 1.0);
    let mut rng = StdRng::seed_from_u64(7);

    let targets =
        components
            .labeler
            .anchor_targets(y_true.view(), anchors.view(), &image_info, &mut rng)?;
    assert_eq!(targets.labels.len(), targets.inds_inside.len());
    assert_eq!(targets.argmax_overlaps_inds.len(), targets.inds_inside.len());
    assert!(targets.argmax_overlaps_inds.iter().all(|&index| index < 2));

    let num_pos = targets.labels.iter().filter(|&&label| label == 1).count();
    let num_neg = targets.labels.iter().filter(|&&label| label == 0).count();
    assert!(num_pos > 0);
    assert!(num_pos <= 128);
    assert!(num_pos + num_neg <= 256);

    let unmapped = targets.unmap_labels(num_anchors)?;
    assert_eq!(unmapped.len(), num_anchors);
    let num_labeled = unmapped.iter().filter(|&&label| label != -1).count();
    assert_eq!(num_labeled, num_pos + num_neg);
    Ok(())
}

#[test]
fn no_ground_truth_gives_negatives() -> Result<()> {
    let components = Config::default().build()?;
    let anchors = shift([24, 32], 16, components.generator.anchors())?;
    let y_true = Array2::<f64>::zeros((0, 5));
    let image_info = ImageInfo::new(384.0, 512.0, 1.0);
    let mut rng = StdRng::seed_from_u64(0);

    let targets =
        components
            .labeler
            .anchor_targets(y_true.view(), anchors.view(), &image_info, &mut rng)?;
    assert!(targets.labels.iter().all(|&label| label == 0 || label == -1));
    assert_eq!(targets.labels.iter().filter(|&&label| label == 0).count(), 256);
    Ok(())
}

#[test]
fn proposals_end_to_end() -> Result<()> {
    let components = Config::open(&*CONFIG_FILE)?.build()?;
    let (height, width) = (14, 14);
    let boxes = Array4::from_shape_fn((1, height, width, 36), |(_, row, col, channel)| {
        ((row * 31 + col * 17 + channel * 7) % 23) as f32 / 23.0 * 0.4 - 0.2
    });
    let scores = Array4::from_shape_fn((1, height, width, 18), |(_, row, col, channel)| {
        ((row * 5 + col * 11 + channel * 3) % 29) as f32 / 29.0
    });

    let proposals = components
        .selector
        .forward(boxes.view(), scores.view(), 300)?;
    let (batch, count, coords) = proposals.dim();
    assert_eq!((batch, coords), (1, 4));
    assert!(count > 0 && count <= 300);

    proposals.slice(s![0, .., ..]).outer_iter().for_each(|row: ArrayView1<f32>| {
        assert!(row[0] <= row[2] && row[1] <= row[3]);
        assert!(row[2] <= (width - 1) as f32 && row[3] <= (height - 1) as f32);
    });
    Ok(())
}
