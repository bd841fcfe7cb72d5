use serde::{Deserialize, Serialize};

/// Upper bound of every user-facing parameter (they are percentages).
pub const PARAMETER_MAX: f64 = 100.0;

/// The three scalar inputs of an outbreak, each a percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Population density.
    #[serde(default = "default_density")]
    pub density: f64,
    /// Degree of animal domestication, a proxy for zoonotic spillover pressure.
    #[serde(default = "default_domesticity")]
    pub domesticity: f64,
    /// Disease lethality.
    #[serde(default = "default_virulence")]
    pub virulence: f64,
}

fn default_density() -> f64 {
    50.0
}

fn default_domesticity() -> f64 {
    50.0
}

fn default_virulence() -> f64 {
    60.0
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            density: default_density(),
            domesticity: default_domesticity(),
            virulence: default_virulence(),
        }
    }
}

impl SimulationParameters {
    pub fn new(density: f64, domesticity: f64, virulence: f64) -> Self {
        SimulationParameters { density, domesticity, virulence }
    }

    /// Returns a copy with every parameter forced into `[0, 100]`. NaN becomes 0.
    pub fn clamped(&self) -> Self {
        SimulationParameters {
            density: clamp_or_zero(self.density, 0.0, PARAMETER_MAX),
            domesticity: clamp_or_zero(self.domesticity, 0.0, PARAMETER_MAX),
            virulence: clamp_or_zero(self.virulence, 0.0, PARAMETER_MAX),
        }
    }

    /// True when any parameter lies outside `[0, 100]` or is NaN.
    pub fn is_out_of_range(&self) -> bool {
        [self.density, self.domesticity, self.virulence]
            .iter()
            .any(|v| v.is_nan() || *v < 0.0 || *v > PARAMETER_MAX)
    }
}

/// Scale constants turning parameters into per-tick probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateScales {
    #[serde(default = "default_transmission_scale")]
    pub transmission_scale: f64,
    #[serde(default = "default_mortality_scale")]
    pub mortality_scale: f64,
    /// Constant recovery probability, independent of the parameters.
    #[serde(default = "default_recovery_rate")]
    pub recovery_rate: f64,
}

fn default_transmission_scale() -> f64 {
    0.1
}

fn default_mortality_scale() -> f64 {
    0.05
}

fn default_recovery_rate() -> f64 {
    0.05
}

impl Default for RateScales {
    fn default() -> Self {
        RateScales {
            transmission_scale: default_transmission_scale(),
            mortality_scale: default_mortality_scale(),
            recovery_rate: default_recovery_rate(),
        }
    }
}

/// Per-tick Bernoulli probabilities used by a step. Always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRates {
    pub transmission: f64,
    pub mortality: f64,
    pub recovery: f64,
}

impl TransitionRates {
    /// Derives the rates for `params` under `scales`.
    ///
    /// Parameters are clamped to `[0, 100]` first and each resulting rate is
    /// clamped to `[0, 1]`, so any input yields well-defined probabilities.
    pub fn derive(params: &SimulationParameters, scales: &RateScales) -> Self {
        let p = params.clamped();
        let transmission =
            (p.density / PARAMETER_MAX) * (p.domesticity / PARAMETER_MAX) * scales.transmission_scale;
        let mortality = (p.virulence / PARAMETER_MAX) * scales.mortality_scale;

        TransitionRates {
            transmission: clamp_or_zero(transmission, 0.0, 1.0),
            mortality: clamp_or_zero(mortality, 0.0, 1.0),
            recovery: clamp_or_zero(scales.recovery_rate, 0.0, 1.0),
        }
    }
}

/// Clamps a value between a minimum and maximum, mapping NaN to `min`.
pub fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.max(min).min(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn reference_rates_match_formulas() {
        let rates = TransitionRates::derive(&SimulationParameters::new(50.0, 50.0, 60.0), &RateScales::default());
        assert!(approx(rates.transmission, 0.025));
        assert!(approx(rates.mortality, 0.03));
        assert!(approx(rates.recovery, 0.05));
    }

    #[test]
    fn zero_density_or_domesticity_disables_transmission() {
        let scales = RateScales::default();
        assert_eq!(TransitionRates::derive(&SimulationParameters::new(0.0, 100.0, 50.0), &scales).transmission, 0.0);
        assert_eq!(TransitionRates::derive(&SimulationParameters::new(100.0, 0.0, 50.0), &scales).transmission, 0.0);
    }

    #[test]
    fn out_of_range_parameters_are_clamped() {
        let params = SimulationParameters::new(-20.0, 400.0, f64::NAN);
        assert!(params.is_out_of_range());
        let clamped = params.clamped();
        assert_eq!(clamped, SimulationParameters::new(0.0, 100.0, 0.0));
        assert!(!clamped.is_out_of_range());
    }

    #[test]
    fn oversized_scales_still_yield_probabilities() {
        let scales = RateScales { transmission_scale: 7.0, mortality_scale: 3.0, recovery_rate: 1.5 };
        let rates = TransitionRates::derive(&SimulationParameters::new(100.0, 100.0, 100.0), &scales);
        assert_eq!(rates.transmission, 1.0);
        assert_eq!(rates.mortality, 1.0);
        assert_eq!(rates.recovery, 1.0);
    }
}
