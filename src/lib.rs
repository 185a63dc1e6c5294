//! # Forecast Verification Statistics
//!
//! Verification statistics for paired forecast/observation data, with
//! confidence intervals for every statistic.
//!
//! The crate covers four statistic families plus a scalar summary: 2x2
//! categorical statistics over thresholded pairs, NxN multi-category
//! statistics, continuous error statistics, and neighborhood statistics over
//! fractional coverage fields. Each family orchestrator computes point
//! values, closed-form normal-approximation bounds where a formula exists
//! (Wilson and Wald proportion intervals, Woolf's odds-ratio interval, the
//! Hanssen-Kuipers variance formula, Student-t and chi-square pivots), and
//! bootstrap bounds by either the bias-corrected-and-accelerated or the
//! percentile method.
//!
//! Degenerate statistical input never raises: undefined statistics and
//! bounds carry a bad-data sentinel and computation continues for the rest.
//! Only contract violations (mismatched pair lengths, invalid
//! configuration) surface as errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_verify::{
//!     compute_cts_stats_ci, BootRng, PairedSample, ResampleConfig, Threshold, ThreshOp,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fcst = vec![2.1, 0.3, 1.7, 0.0, 3.2, 0.9, 1.1, 0.2];
//!     let obs = vec![1.8, 0.1, 2.0, 0.4, 2.9, 1.2, 0.6, 0.0];
//!     let sample = PairedSample::new(fcst, obs)?;
//!
//!     let thresh = Threshold::new(ThreshOp::Ge, 1.0)?;
//!     let config = ResampleConfig::default();
//!     let mut rng = BootRng::with_seed(42);
//!
//!     let cts = compute_cts_stats_ci(&sample, thresh, thresh, &config, &mut rng)?;
//!     println!(
//!         "accuracy = {:.3} [{:.3}, {:.3}]",
//!         cts.acc.v, cts.acc.v_ncl[0], cts.acc.v_ncu[0]
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Reproducibility
//!
//! All resampling draws come from a caller-supplied [`BootRng`]. Seeding it
//! identically and issuing the same call sequence reproduces every bootstrap
//! bound bit for bit.

pub mod categorical;
pub mod config;
pub mod continuous;
pub mod errors;
pub mod intervals;
pub mod math_utils;
pub mod multicategory;
pub mod neighborhood;
pub mod resample;
pub mod rng;
pub mod sample;
pub mod summary;
pub mod thresh;

pub use categorical::{
    compute_cts_stats_ci, compute_cts_stats_ci_multi, compute_ctsinfo, ContingencyTable, CtsInfo,
};
pub use config::{CiMethod, ResampleConfig};
pub use continuous::{compute_cnt_stats_ci, CntInfo};
pub use errors::{VerifError, VerifResult};
pub use intervals::{
    compute_bca_interval, compute_hk_ci, compute_perc_interval, compute_proportion_ci,
    compute_wald_ci, compute_wilson_ci, compute_woolf_ci, CiInfo,
};
pub use math_utils::{is_bad_data, BAD_DATA};
pub use multicategory::{compute_mcts_stats_ci, MctsInfo, MctsTable};
pub use neighborhood::{
    compute_nbrcnt_stats_ci, compute_nbrcts_stats_ci, NbrCntInfo, NbrCtsInfo,
};
pub use rng::BootRng;
pub use sample::PairedSample;
pub use summary::{compute_mean_stdev, compute_mean_stdev_ci, SummaryInfo};
pub use thresh::{ThreshOp, Threshold};
