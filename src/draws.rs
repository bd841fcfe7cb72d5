use anyhow::Result;
use rand::distr::Uniform;
use rand::prelude::*;

/// A stream of uniform draws in `[0, 1)` consumed by the engine's Bernoulli checks.
pub trait DrawSource {
    fn next_unit(&mut self) -> f64;
}

/// Draws backed by a seeded `StdRng`, reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct SeededDraws {
    rng: StdRng,
    unit_dist: Uniform<f64>,
}

impl SeededDraws {
    pub fn new(seed: u64) -> Result<Self> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            unit_dist: Uniform::new(0.0f64, 1.0f64)?,
        })
    }
}

impl DrawSource for SeededDraws {
    fn next_unit(&mut self) -> f64 {
        self.rng.sample(self.unit_dist)
    }
}

/// Replays a fixed list of draws in order, cycling when exhausted.
///
/// Lets tests pin down exactly which Bernoulli checks succeed.
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedDraws {
    pub fn new(values: Vec<f64>) -> Self {
        ScriptedDraws { values, cursor: 0 }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        ScriptedDraws::new(vec![value])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl DrawSource for ScriptedDraws {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_draws_are_reproducible_and_in_range() {
        let mut a = SeededDraws::new(7).unwrap();
        let mut b = SeededDraws::new(7).unwrap();
        for _ in 0..1000 {
            let x = a.next_unit();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x, b.next_unit());
        }
    }

    #[test]
    fn scripted_draws_cycle() {
        let mut d = ScriptedDraws::new(vec![0.1, 0.9]);
        assert_eq!(d.next_unit(), 0.1);
        assert_eq!(d.next_unit(), 0.9);
        assert_eq!(d.next_unit(), 0.1);
        assert_eq!(d.consumed(), 3);
    }
}
