use serde::{Deserialize, Serialize};

/// Aggregate state of the grid after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// The tick at which the counts were taken (0 before the first step).
    pub tick: u32,
    pub healthy: u32,
    pub infected: u32,
    pub immune: u32,
    pub dead: u32,
    /// Cells that have ever become infected, the seed included.
    pub total_ever_infected: u32,
}

impl StepResult {
    /// Total number of cells; always the grid side squared.
    pub fn population(&self) -> u32 {
        self.healthy + self.infected + self.immune + self.dead
    }

    /// Cells that are not dead.
    pub fn survivors(&self) -> u32 {
        self.population() - self.dead
    }

    /// Share of the population in each status, as percentages (infected, dead, immune).
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.population().max(1) as f64;
        (
            self.infected as f64 / total * 100.0,
            self.dead as f64 / total * 100.0,
            self.immune as f64 / total * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survivors_exclude_dead() {
        let r = StepResult { tick: 3, healthy: 90, infected: 4, immune: 3, dead: 3, total_ever_infected: 10 };
        assert_eq!(r.population(), 100);
        assert_eq!(r.survivors(), 97);
        let (inf, dead, imm) = r.percentages();
        assert_eq!((inf, dead, imm), (4.0, 3.0, 3.0));
    }
}
