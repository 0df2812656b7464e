use log::info;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use motifcal_core::errors::MotifCalError;
use motifcal_core::models::{SequenceRecord, SequenceSet, SetKind};
use motifcal_core::PipelineWarning;

use crate::context::RunContext;

///
/// Draws `times x |input|` background windows of a fixed length from a
/// background pool.
///
#[derive(Debug, Clone)]
pub struct BackgroundSampler {
    pub times: usize,
    pub length: usize,
    /// Fall back to sampling with replacement when the pool is too small.
    pub allow_replacement: bool,
}

/// A drawn background set and the seed that reproduces it.
#[derive(Debug, Clone)]
pub struct BackgroundSample {
    pub set: SequenceSet,
    pub with_replacement: bool,
    pub seed: u64,
}

impl BackgroundSampler {
    pub fn new(times: usize, length: usize, allow_replacement: bool) -> Result<Self, MotifCalError> {
        if times == 0 {
            return Err(MotifCalError::configuration("times must be at least 1"));
        }
        if length == 0 {
            return Err(MotifCalError::configuration("length must be at least 1"));
        }
        Ok(Self {
            times,
            length,
            allow_replacement,
        })
    }

    pub fn required(&self, n_input: usize) -> usize {
        self.times * n_input
    }

    ///
    /// Sample the background for `n_input` input sequences, seeded from the
    /// run context. A sampling-with-replacement fallback is recorded as a
    /// warning on the context.
    ///
    pub fn sample(
        &self,
        pool: &SequenceSet,
        n_input: usize,
        ctx: &RunContext,
    ) -> Result<BackgroundSample, MotifCalError> {
        let sample = self.sample_with_seed(pool, n_input, ctx.seed())?;
        if sample.with_replacement {
            ctx.warn(PipelineWarning::SamplingWithReplacement {
                requested: self.required(n_input),
                available: self.usable(pool).len(),
            });
        }
        Ok(sample)
    }

    pub fn sample_with_seed(
        &self,
        pool: &SequenceSet,
        n_input: usize,
        seed: u64,
    ) -> Result<BackgroundSample, MotifCalError> {
        let required = self.required(n_input);
        let usable = self.usable(pool);

        if required == 0 {
            return Err(MotifCalError::configuration(
                "no input sequences to size the background sample",
            ));
        }

        if usable.is_empty() || (usable.len() < required && !self.allow_replacement) {
            return Err(MotifCalError::InsufficientBackground {
                required,
                available: usable.len(),
                length: self.length,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let with_replacement = usable.len() < required;

        let picks: Vec<usize> = if with_replacement {
            (0..required)
                .map(|_| rng.random_range(0..usable.len()))
                .collect()
        } else {
            index::sample(&mut rng, usable.len(), required).into_vec()
        };

        let records = picks
            .into_iter()
            .enumerate()
            .map(|(n, pick)| {
                let source = usable[pick];
                let offset = rng.random_range(0..=source.len() - self.length);
                SequenceRecord::new(
                    format!("bg{}_{}:{}-{}", n + 1, source.id, offset, offset + self.length),
                    source.seq[offset..offset + self.length].to_vec(),
                )
            })
            .collect::<Vec<_>>();

        info!(
            "Sampled {} background sequences of length {} from {} usable pool sequences{}",
            records.len(),
            self.length,
            usable.len(),
            if with_replacement { " (with replacement)" } else { "" }
        );

        Ok(BackgroundSample {
            set: SequenceSet::new(format!("{}_sample", pool.id), SetKind::Background, records),
            with_replacement,
            seed,
        })
    }

    /// Pool sequences long enough to cut a window from.
    fn usable<'a>(&self, pool: &'a SequenceSet) -> Vec<&'a SequenceRecord> {
        pool.records
            .iter()
            .filter(|r| r.len() >= self.length)
            .collect()
    }
}

///
/// Fail fast when an already-sampled background is too small for the input.
///
pub fn check_sample_size(
    background: &SequenceSet,
    n_input: usize,
    times: usize,
    length: usize,
) -> Result<(), MotifCalError> {
    let required = times * n_input;
    if background.len() < required {
        return Err(MotifCalError::InsufficientBackground {
            required,
            available: background.len(),
            length,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn pool(n: usize, len: usize) -> SequenceSet {
        let records = (0..n)
            .map(|i| {
                let seq: Vec<u8> = (0..len).map(|j| b"ACGT"[(i + j) % 4]).collect();
                SequenceRecord::new(format!("pool{}", i), seq)
            })
            .collect();
        SequenceSet::new("pool", SetKind::Background, records)
    }

    #[rstest]
    fn test_draws_times_input_sequences() {
        let sampler = BackgroundSampler::new(10, 400, false).unwrap();
        let sample = sampler.sample_with_seed(&pool(1000, 500), 80, 1).unwrap();
        assert_eq!(sample.set.len(), 800);
        assert!(!sample.with_replacement);
        assert!(sample.set.records.iter().all(|r| r.len() == 400));
    }

    #[rstest]
    fn test_small_pool_without_replacement_fails() {
        let sampler = BackgroundSampler::new(10, 400, false).unwrap();
        let err = sampler.sample_with_seed(&pool(500, 500), 80, 1).unwrap_err();
        assert!(matches!(
            err,
            MotifCalError::InsufficientBackground {
                required: 800,
                available: 500,
                ..
            }
        ));
    }

    #[rstest]
    fn test_small_pool_with_replacement_warns() {
        let ctx = RunContext::new(Some(3)).unwrap();
        let sampler = BackgroundSampler::new(10, 400, true).unwrap();
        let sample = sampler.sample(&pool(500, 500), 80, &ctx).unwrap();
        assert_eq!(sample.set.len(), 800);
        assert!(sample.with_replacement);
        assert_eq!(
            ctx.warnings(),
            vec![PipelineWarning::SamplingWithReplacement {
                requested: 800,
                available: 500
            }]
        );
    }

    #[rstest]
    fn test_short_sequences_are_unusable() {
        let sampler = BackgroundSampler::new(2, 400, true).unwrap();
        let err = sampler.sample_with_seed(&pool(50, 399), 5, 1).unwrap_err();
        assert!(matches!(err, MotifCalError::InsufficientBackground { available: 0, .. }));
    }

    #[rstest]
    fn test_same_seed_same_sample() {
        let sampler = BackgroundSampler::new(3, 20, false).unwrap();
        let background = pool(100, 60);
        let a = sampler.sample_with_seed(&background, 10, 99).unwrap();
        let b = sampler.sample_with_seed(&background, 10, 99).unwrap();
        assert_eq!(a.set.records, b.set.records);
    }

    #[rstest]
    fn test_check_sample_size() {
        assert!(check_sample_size(&pool(800, 10), 80, 10, 10).is_ok());
        assert!(check_sample_size(&pool(799, 10), 80, 10, 10).is_err());
    }
}
