use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sidechannels_frame::{IncomingMessage, OutgoingMessage};

use crate::error::{ParamsError, Result};

/// Wire tag for [`Sampler::Uniform`].
pub const UNIFORM: i32 = 0;
/// Wire tag for [`Sampler::Gaussian`].
pub const GAUSSIAN: i32 = 1;
/// Wire tag for [`Sampler::MultiRangeUniform`].
pub const MULTI_RANGE_UNIFORM: i32 = 2;

/// A distribution the environment draws one parameter value from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sampler {
    Uniform { min: f32, max: f32 },
    Gaussian { mean: f32, stddev: f32 },
    /// Flattened `[min0, max0, min1, max1, ...]` interval bounds.
    MultiRangeUniform { intervals: Vec<f32> },
}

impl Sampler {
    /// Wire tag of this sampler kind.
    pub fn kind(&self) -> i32 {
        match self {
            Sampler::Uniform { .. } => UNIFORM,
            Sampler::Gaussian { .. } => GAUSSIAN,
            Sampler::MultiRangeUniform { .. } => MULTI_RANGE_UNIFORM,
        }
    }

    /// Draw one value. The same sampler and seed always give the same value.
    pub fn sample(&self, seed: i32) -> Result<f32> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(u64::from(seed as u32));

        let value = match self {
            Sampler::Uniform { min, max } => min + rng.gen::<f32>() * (max - min),
            Sampler::Gaussian { mean, stddev } => {
                // Box-Muller; u1 in (0, 1] keeps ln finite.
                let u1 = 1.0 - rng.gen::<f32>();
                let u2 = 1.0 - rng.gen::<f32>();
                let standard = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
                mean + stddev * standard
            }
            Sampler::MultiRangeUniform { intervals } => {
                let widths: Vec<f32> = intervals.chunks_exact(2).map(|b| b[1] - b[0]).collect();
                let total: f32 = widths.iter().sum();

                let chosen = pick_interval(&widths, total, rng.gen::<f32>());
                let min = intervals[2 * chosen];
                min + rng.gen::<f32>() * widths[chosen]
            }
        };
        Ok(value)
    }

    /// Append the kind tag and parameters.
    pub fn write_to(&self, msg: &mut OutgoingMessage) {
        msg.write_i32(self.kind());
        match self {
            Sampler::Uniform { min, max } => {
                msg.write_f32(*min);
                msg.write_f32(*max);
            }
            Sampler::Gaussian { mean, stddev } => {
                msg.write_f32(*mean);
                msg.write_f32(*stddev);
            }
            Sampler::MultiRangeUniform { intervals } => msg.write_float_list(intervals),
        }
    }

    /// Read a kind tag and its parameters. Missing parameters read as zero.
    pub fn read_from(msg: &mut IncomingMessage) -> Result<Self> {
        match msg.read_i32(-1) {
            UNIFORM => Ok(Sampler::Uniform {
                min: msg.read_f32(0.0),
                max: msg.read_f32(0.0),
            }),
            GAUSSIAN => Ok(Sampler::Gaussian {
                mean: msg.read_f32(0.0),
                stddev: msg.read_f32(0.0),
            }),
            MULTI_RANGE_UNIFORM => Ok(Sampler::MultiRangeUniform {
                intervals: msg.read_float_list(Vec::new()),
            }),
            other => Err(ParamsError::UnknownSampler(other)),
        }
    }

    /// Check that the parameters can produce a value.
    pub fn validate(&self) -> Result<()> {
        match self {
            Sampler::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(invalid(format!("uniform bounds must be finite ({min}, {max})")));
                }
                if !(max - min).is_finite() {
                    return Err(invalid(format!("uniform range overflows ({min}, {max})")));
                }
            }
            Sampler::Gaussian { mean, stddev } => {
                if !mean.is_finite() || !stddev.is_finite() || *stddev < 0.0 {
                    return Err(invalid(format!(
                        "gaussian needs a finite mean and non-negative stddev ({mean}, {stddev})"
                    )));
                }
            }
            Sampler::MultiRangeUniform { intervals } => {
                if intervals.is_empty() || intervals.len() % 2 != 0 {
                    return Err(invalid(format!(
                        "multi-range needs min/max pairs, got {} bounds",
                        intervals.len()
                    )));
                }
                if intervals.iter().any(|bound| !bound.is_finite()) {
                    return Err(invalid("multi-range bounds must be finite".to_string()));
                }
                let mut total = 0.0f32;
                for pair in intervals.chunks_exact(2) {
                    if pair[1] < pair[0] {
                        return Err(invalid(format!(
                            "multi-range interval [{}, {}] is reversed",
                            pair[0], pair[1]
                        )));
                    }
                    total += pair[1] - pair[0];
                }
                if !total.is_finite() {
                    return Err(invalid("multi-range total width overflows".to_string()));
                }
                if total <= 0.0 {
                    return Err(invalid("multi-range intervals have zero total width".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Index of the interval whose share of `total` covers `pick`.
///
/// Rounding can leave the running sum short of 1.0; picks past it land on
/// the last interval with a non-zero width.
fn pick_interval(widths: &[f32], total: f32, pick: f32) -> usize {
    let mut cumulative = 0.0f32;
    for (i, width) in widths.iter().enumerate() {
        cumulative += width / total;
        if pick < cumulative {
            return i;
        }
    }
    widths
        .iter()
        .rposition(|width| *width > 0.0)
        .unwrap_or(widths.len().saturating_sub(1))
}

fn invalid(message: String) -> ParamsError {
    ParamsError::InvalidSampler(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_deterministic_per_seed() {
        let sampler = Sampler::Uniform { min: 1.0, max: 5.0 };

        let a = sampler.sample(1234).unwrap();
        let b = sampler.sample(1234).unwrap();
        assert_eq!(a, b);
        assert!((1.0..5.0).contains(&a));

        let distinct: std::collections::HashSet<u32> = (0..16)
            .map(|seed| sampler.sample(seed).unwrap().to_bits())
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn uniform_with_equal_bounds_returns_bound() {
        let sampler = Sampler::Uniform { min: 3.0, max: 3.0 };
        assert_eq!(sampler.sample(9).unwrap(), 3.0);
    }

    #[test]
    fn gaussian_centers_on_mean() {
        let fixed = Sampler::Gaussian {
            mean: 2.5,
            stddev: 0.0,
        };
        assert_eq!(fixed.sample(77).unwrap(), 2.5);

        let spread = Sampler::Gaussian {
            mean: 10.0,
            stddev: 1.0,
        };
        let n = 2000;
        let mean: f32 = (0..n).map(|seed| spread.sample(seed).unwrap()).sum::<f32>() / n as f32;
        assert!((mean - 10.0).abs() < 0.2, "sample mean {mean}");
        assert_eq!(spread.sample(5).unwrap(), spread.sample(5).unwrap());
    }

    #[test]
    fn gaussian_rejects_negative_stddev() {
        let sampler = Sampler::Gaussian {
            mean: 0.0,
            stddev: -1.0,
        };
        assert!(matches!(sampler.sample(0), Err(ParamsError::InvalidSampler(_))));
    }

    #[test]
    fn multi_range_stays_inside_intervals() {
        let sampler = Sampler::MultiRangeUniform {
            intervals: vec![0.0, 1.0, 10.0, 12.0],
        };

        let mut low = 0;
        let mut high = 0;
        for seed in 0..500 {
            let value = sampler.sample(seed).unwrap();
            if (0.0..=1.0).contains(&value) {
                low += 1;
            } else if (10.0..=12.0).contains(&value) {
                high += 1;
            } else {
                panic!("value {value} outside every interval");
            }
        }
        assert!(low > 0 && high > low);
    }

    #[test]
    fn multi_range_skips_zero_width_intervals() {
        let sampler = Sampler::MultiRangeUniform {
            intervals: vec![5.0, 5.0, 20.0, 21.0],
        };
        for seed in 0..50 {
            let value = sampler.sample(seed).unwrap();
            assert!((20.0..=21.0).contains(&value), "{value}");
        }
    }

    #[test]
    fn pick_past_rounded_sum_avoids_zero_width_tail() {
        let widths = [0.3, 0.7, 0.0];
        assert_eq!(pick_interval(&widths, 1.0, 0.1), 0);
        assert_eq!(pick_interval(&widths, 1.0, 0.5), 1);
        assert_eq!(pick_interval(&widths, 1.0, 1.0), 1);
        assert_eq!(pick_interval(&[0.0, 2.0, 0.0, 0.0], 2.0, 1.0), 1);
    }

    #[test]
    fn overflowing_ranges_are_rejected() {
        let uniform = Sampler::Uniform {
            min: -3e38,
            max: 3e38,
        };
        assert!(matches!(uniform.validate(), Err(ParamsError::InvalidSampler(_))));
        assert!(uniform.sample(1).is_err());

        let multi = Sampler::MultiRangeUniform {
            intervals: vec![-3e38, 3e38, 0.0, 1.0],
        };
        assert!(matches!(multi.sample(1), Err(ParamsError::InvalidSampler(_))));

        let wide = Sampler::Uniform {
            min: -1e38,
            max: 1e38,
        };
        assert!(wide.sample(5).unwrap().is_finite());
    }

    #[test]
    fn multi_range_rejects_unusable_lists() {
        for intervals in [vec![], vec![1.0, 2.0, 3.0], vec![4.0, 4.0], vec![2.0, 1.0]] {
            let sampler = Sampler::MultiRangeUniform { intervals };
            assert!(
                matches!(sampler.sample(1), Err(ParamsError::InvalidSampler(_))),
                "{sampler:?}"
            );
        }
    }

    #[test]
    fn wire_layout_matches_kind_and_parameters() {
        let mut msg = OutgoingMessage::new();
        Sampler::Gaussian {
            mean: 1.0,
            stddev: 0.5,
        }
        .write_to(&mut msg);

        let bytes = msg.to_bytes();
        assert_eq!(&bytes[..4], &GAUSSIAN.to_le_bytes());
        assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[8..], &0.5f32.to_le_bytes());
    }

    #[test]
    fn reads_back_multi_range() {
        let sampler = Sampler::MultiRangeUniform {
            intervals: vec![0.0, 1.0, 2.0, 3.0],
        };
        let mut out = OutgoingMessage::new();
        sampler.write_to(&mut out);

        let mut msg = IncomingMessage::new(out.to_bytes());
        assert_eq!(Sampler::read_from(&mut msg).unwrap(), sampler);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut out = OutgoingMessage::new();
        out.write_i32(9);
        let mut msg = IncomingMessage::new(out.to_bytes());

        assert!(matches!(
            Sampler::read_from(&mut msg),
            Err(ParamsError::UnknownSampler(9))
        ));
    }

    #[test]
    fn json_uses_kind_tag() {
        let sampler: Sampler =
            serde_json::from_str(r#"{"kind":"uniform","min":0.5,"max":1.5}"#).unwrap();
        assert_eq!(sampler, Sampler::Uniform { min: 0.5, max: 1.5 });

        let json = serde_json::to_string(&Sampler::MultiRangeUniform {
            intervals: vec![1.0, 2.0],
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"multi_range_uniform","intervals":[1.0,2.0]}"#);
    }
}
