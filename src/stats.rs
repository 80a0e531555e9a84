//! Incremental statistics over unbounded observation streams.

use std::sync::Arc;

use lockfree_object_pool::{LinearObjectPool, LinearOwnedReusable};
use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// A sample checked out of a [`Pool`]; returns to the pool on drop.
pub(crate) type PooledSample = LinearOwnedReusable<Sample>;

/// A thread-safe pool of reset sample buffers.
///
/// Aggregated instruments swap their live buffer for a pooled one at report
/// time; the drained buffer flows back into the pool when the reporter is
/// done with it.
#[derive(Clone)]
pub(crate) struct Pool {
    inner: Arc<LinearObjectPool<Sample>>,
}

impl Pool {
    /// Creates a pool of samples with the given reservoir capacity.
    pub(crate) fn new(reservoir: usize) -> Pool {
        Pool {
            inner: Arc::new(LinearObjectPool::new(
                move || Sample::with_capacity(reservoir),
                Sample::reset,
            )),
        }
    }

    /// Returns a reset sample from the pool, creating one if necessary.
    pub(crate) fn get(&self) -> PooledSample {
        self.inner.pull_owned()
    }
}

/// Calculates incremental statistics over a stream of observations: mean,
/// variance, standard deviation, sum, min, max, and estimated percentiles.
///
/// Moments use a shifted-mean update with the first observation as the
/// reference point, which avoids catastrophic cancellation on streams far
/// from zero.  Percentiles are estimated from a fixed-size reservoir where
/// every observation has equal retention probability.
pub(crate) struct Sample {
    sum: f64,
    max: f64,
    min: f64,

    k: f64,
    n: i64,
    ex: f64,
    ex2: f64,

    limit: usize,
    perc: Vec<f64>,

    rng: Xoshiro256StarStar,
}

impl Sample {
    /// Creates a sample with the given reservoir capacity.
    pub(crate) fn with_capacity(reservoir: usize) -> Sample {
        Sample {
            sum: 0.0,
            max: 0.0,
            min: 0.0,
            k: 0.0,
            n: 0,
            ex: 0.0,
            ex2: 0.0,
            limit: reservoir,
            perc: Vec::with_capacity(reservoir),
            rng: Xoshiro256StarStar::try_from_rng(&mut OsRng).unwrap(),
        }
    }

    /// Adds an observation.
    pub(crate) fn add(&mut self, v: f64) {
        if self.n == 0 {
            self.k = v;
            self.max = v;
            self.min = v;
        }

        self.n += 1;
        self.ex += v - self.k;
        self.ex2 += (v - self.k) * (v - self.k);

        self.sum += v;

        if v > self.max {
            self.max = v;
        } else if v < self.min {
            self.min = v;
        }

        if self.perc.len() < self.limit {
            self.perc.push(v);
        } else {
            let r = self.rng.random_range(0..self.n) as usize;
            if r < self.perc.len() {
                self.perc[r] = v;
            }
        }
    }

    /// Resets the sample, keeping the reservoir's allocation.
    pub(crate) fn reset(&mut self) {
        self.n = 0;
        self.max = 0.0;
        self.min = 0.0;
        self.sum = 0.0;
        self.ex = 0.0;
        self.ex2 = 0.0;
        self.perc.clear();
    }

    /// Returns the number of observations.
    pub(crate) fn count(&self) -> i64 {
        self.n
    }

    /// Returns the sum of the observations.
    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the smallest observation.
    pub(crate) fn min(&self) -> f64 {
        self.min
    }

    /// Returns the largest observation.
    pub(crate) fn max(&self) -> f64 {
        self.max
    }

    /// Returns the mean of the observations.
    pub(crate) fn mean(&self) -> f64 {
        self.k + self.ex / self.n as f64
    }

    /// Returns the population variance of the observations.
    pub(crate) fn variance(&self) -> f64 {
        (self.ex2 - (self.ex * self.ex) / self.n as f64) / self.n as f64
    }

    /// Returns the standard deviation of the observations.
    pub(crate) fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Returns the estimated percentiles of the observations.
    ///
    /// Undefined when the sample is empty; callers guard on `count`.
    pub(crate) fn percentiles(&mut self, ps: &[f64]) -> Vec<f64> {
        self.perc.sort_unstable_by(|a, b| a.total_cmp(b));

        ps.iter().map(|p| self.percentile(*p)).collect()
    }

    fn percentile(&self, p: f64) -> f64 {
        let i = p / 100.0 * self.perc.len() as f64;
        self.perc[clamp(i, 0, self.perc.len() - 1)]
    }
}

fn clamp(i: f64, min: usize, max: usize) -> usize {
    if i < min as f64 {
        return min;
    }
    if i > max as f64 {
        return max;
    }
    i as usize
}
