pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, CyCxHW, Delta, XYXY};
pub use itertools::{iproduct, izip, Itertools as _};
pub use label::{AnchorLabel, Label};
pub use log::{debug, trace};
pub use ndarray::{
    s, Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, ArrayView4, Axis, Dimension,
};
pub use noisy_float::prelude::*;
pub use num_traits::{Float, NumCast};
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::path::Path;
