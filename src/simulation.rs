use crate::draws::{DrawSource, SeededDraws};
use crate::grid::{CellStatus, Grid};
use anyhow::Result;
use contagion_common::{RateScales, SimulationConfig, SimulationParameters, StepResult, TransitionRates};
use log::{debug, trace};

/// Tick-based disease automaton over a square grid.
///
/// Each tick, every cell that was infected when the tick began may die, recover or
/// infect its healthy Moore neighbours. All decisions read the statuses captured at
/// the start of the tick, so cells infected during a tick only act on the next one.
pub struct ContagionSimulation<D: DrawSource = SeededDraws> {
    grid: Grid,
    draws: D,
    scales: RateScales,
    /// The run is terminal once `tick` exceeds this value.
    horizon: u32,
    seed_cell: usize,
    tick: u32,
    total_ever_infected: u32,
    /// Statuses at the start of the current tick.
    status_buf: Vec<CellStatus>,
    neighbor_buf: Vec<usize>,
}

impl ContagionSimulation<SeededDraws> {
    /// Builds an engine from a loaded configuration, seeding the RNG from it.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        Self::from_config_with_seed(config, config.initial_conditions.rng_seed)
    }

    /// Same as [`from_config`](Self::from_config) with an explicit RNG seed.
    pub fn from_config_with_seed(config: &SimulationConfig, rng_seed: u64) -> Result<Self> {
        let draws = SeededDraws::new(rng_seed)?;
        let mut sim = Self::new(config.grid.side, config.timing.horizon_ticks, config.grid.seed_cell, draws)?;
        sim.scales = config.rates;
        Ok(sim)
    }
}

impl<D: DrawSource> ContagionSimulation<D> {
    /// Allocates a `grid_side` x `grid_side` grid of healthy cells at tick 0.
    pub fn new(grid_side: usize, horizon: u32, seed_cell: usize, draws: D) -> Result<Self> {
        let grid = Grid::new(grid_side)?;
        if seed_cell >= grid.len() {
            anyhow::bail!(
                "Seed cell {} is outside the {}x{} grid.",
                seed_cell,
                grid_side,
                grid_side
            );
        }
        let population = grid.len();
        debug!("Initialized {}x{} grid, horizon {} ticks.", grid_side, grid_side, horizon);

        Ok(Self {
            grid,
            draws,
            scales: RateScales::default(),
            horizon,
            seed_cell,
            tick: 0,
            total_ever_infected: 0,
            status_buf: Vec::with_capacity(population),
            neighbor_buf: Vec::with_capacity(8),
        })
    }

    /// Replaces the constants used to derive per-tick rates.
    pub fn with_scales(mut self, scales: RateScales) -> Self {
        self.scales = scales;
        self
    }

    /// Infects the designated seed cell.
    pub fn seed(&mut self) {
        let seed_cell = self.seed_cell;
        // seed_cell is checked against the grid in `new`.
        let _ = self.infect(seed_cell);
    }

    /// Infects the cell at `idx`.
    ///
    /// Returns `Ok(true)` if the cell changed state. A cell that is already infected is
    /// left alone and not counted again.
    pub fn infect(&mut self, idx: usize) -> Result<bool> {
        let side = self.grid.side();
        let cell = self
            .grid
            .get_mut(idx)
            .ok_or_else(|| anyhow::anyhow!("Cell {} is outside the {}x{} grid.", idx, side, side))?;
        if cell.status == CellStatus::Infected {
            trace!("Cell {} is already infected; not counted again.", idx);
            return Ok(false);
        }
        cell.infect();
        self.total_ever_infected += 1;
        trace!("Cell {} infected at tick {}.", idx, self.tick);
        Ok(true)
    }

    /// Advances the automaton by one tick and returns the resulting counts.
    pub fn step(&mut self, params: &SimulationParameters) -> StepResult {
        let rates = TransitionRates::derive(params, &self.scales);
        self.step_with_rates(&rates)
    }

    /// Advances one tick using already derived rates.
    pub fn step_with_rates(&mut self, rates: &TransitionRates) -> StepResult {
        self.tick += 1;

        let mut before = std::mem::take(&mut self.status_buf);
        let mut neighbors = std::mem::take(&mut self.neighbor_buf);
        self.grid.statuses_into(&mut before);

        let mut deaths = 0u32;
        let mut recoveries = 0u32;
        let mut infections = 0u32;

        for idx in 0..before.len() {
            if before[idx] != CellStatus::Infected {
                continue;
            }

            // Mortality, then recovery, then transmission; the first that fires ends the cell's turn.
            if self.draws.next_unit() < rates.mortality {
                self.grid.cells_mut()[idx].status = CellStatus::Dead;
                deaths += 1;
                continue;
            }
            if self.draws.next_unit() < rates.recovery {
                self.grid.cells_mut()[idx].status = CellStatus::Immune;
                recoveries += 1;
                continue;
            }

            self.grid.neighbors_into(idx, &mut neighbors);
            for &n in &neighbors {
                // Healthy at the start of the tick and not already caught by another cell.
                if before[n] != CellStatus::Healthy || self.grid.cells()[n].status != CellStatus::Healthy {
                    continue;
                }
                if self.draws.next_unit() < rates.transmission {
                    self.grid.cells_mut()[n].infect();
                    self.total_ever_infected += 1;
                    infections += 1;
                }
            }

            let cell = &mut self.grid.cells_mut()[idx];
            cell.ticks_infected = cell.ticks_infected.saturating_add(1);
        }

        self.status_buf = before;
        self.neighbor_buf = neighbors;

        let result = self.snapshot();
        trace!(
            "Tick {}: +{} infected, +{} dead, +{} immune -> {:?}",
            self.tick,
            infections,
            deaths,
            recoveries,
            result
        );
        result
    }

    /// Aggregate counts for the current state, without advancing.
    pub fn snapshot(&self) -> StepResult {
        let census = self.grid.census();
        StepResult {
            tick: self.tick,
            healthy: census.healthy,
            infected: census.infected,
            immune: census.immune,
            dead: census.dead,
            total_ever_infected: self.total_ever_infected,
        }
    }

    /// True once the tick has passed the horizon.
    pub fn is_terminal(&self) -> bool {
        self.tick > self.horizon
    }

    /// Returns to the freshly initialized state: all healthy, tick 0, nothing counted.
    ///
    /// The draw source is kept, so a reset run continues the same random stream.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.tick = 0;
        self.total_ever_infected = 0;
        debug!("Simulation reset ({}x{} grid).", self.grid.side(), self.grid.side());
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn total_ever_infected(&self) -> u32 {
        self.total_ever_infected
    }

    pub fn scales(&self) -> &RateScales {
        &self.scales
    }

    pub fn draws(&self) -> &D {
        &self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::ScriptedDraws;

    fn scripted(side: usize, draws: Vec<f64>) -> ContagionSimulation<ScriptedDraws> {
        ContagionSimulation::new(side, 500, 0, ScriptedDraws::new(draws)).unwrap()
    }

    fn full_spread() -> SimulationParameters {
        // transmission 0.1, mortality 0.0
        SimulationParameters::new(100.0, 100.0, 0.0)
    }

    #[test]
    fn zero_side_fails_construction() {
        assert!(ContagionSimulation::new(0, 500, 0, ScriptedDraws::constant(0.5)).is_err());
    }

    #[test]
    fn seed_cell_outside_grid_fails_construction() {
        assert!(ContagionSimulation::new(3, 500, 9, ScriptedDraws::constant(0.5)).is_err());
    }

    #[test]
    fn seeding_infects_exactly_one_cell() {
        let mut sim = scripted(10, vec![0.5]);
        sim.seed();
        let r = sim.snapshot();
        assert_eq!(
            r,
            StepResult { tick: 0, healthy: 99, infected: 1, immune: 0, dead: 0, total_ever_infected: 1 }
        );
        assert_eq!(sim.grid().cells()[0].status, CellStatus::Infected);
    }

    #[test]
    fn reseeding_an_infected_cell_is_not_double_counted() {
        let mut sim = scripted(10, vec![0.5]);
        sim.seed();
        sim.seed();
        assert_eq!(sim.total_ever_infected(), 1);
    }

    #[test]
    fn mortality_is_checked_first_and_ends_the_turn() {
        let mut sim = scripted(10, vec![0.0]);
        sim.seed();
        let r = sim.step(&SimulationParameters::new(100.0, 100.0, 100.0));
        assert_eq!(r.tick, 1);
        assert_eq!(r.dead, 1);
        assert_eq!(r.infected, 0);
        assert_eq!(r.total_ever_infected, 1);
        assert_eq!(sim.draws().consumed(), 1);
    }

    #[test]
    fn recovery_skips_transmission() {
        let mut sim = scripted(10, vec![0.99, 0.0]);
        sim.seed();
        let r = sim.step(&full_spread());
        assert_eq!(r.immune, 1);
        assert_eq!(r.healthy, 99);
        assert_eq!(sim.draws().consumed(), 2);
    }

    #[test]
    fn transmission_draws_once_per_healthy_neighbor() {
        // Corner cell 0 has neighbours 1, 10 and 11.
        let mut sim = scripted(10, vec![0.99, 0.99, 0.0, 0.99, 0.05]);
        sim.seed();
        let r = sim.step(&full_spread());
        assert_eq!(r.infected, 3);
        assert_eq!(r.total_ever_infected, 3);
        let cells = sim.grid().cells();
        assert_eq!(cells[1].status, CellStatus::Infected);
        assert_eq!(cells[10].status, CellStatus::Healthy);
        assert_eq!(cells[11].status, CellStatus::Infected);
        assert_eq!(cells[0].ticks_infected, 1);
        assert_eq!(cells[1].ticks_infected, 0);
        // Newly infected cells did not act this tick.
        assert_eq!(sim.draws().consumed(), 5);
    }

    #[test]
    fn shared_neighbor_is_infected_and_counted_once() {
        let mut sim = scripted(3, vec![0.99, 0.99, 0.0, 0.99, 0.99, 0.99, 0.99, 0.99, 0.99]);
        sim.infect(0).unwrap();
        sim.infect(2).unwrap();
        let r = sim.step(&full_spread());
        assert_eq!(r.total_ever_infected, 3);
        assert_eq!(r.infected, 3);
        // Cell 2 skips neighbour 1 (already caught) and draws for 4 and 5 only.
        assert_eq!(sim.draws().consumed(), 9);
    }

    #[test]
    fn immune_and_dead_cells_do_not_act() {
        let mut sim = scripted(3, vec![0.0]);
        sim.seed();
        sim.step(&SimulationParameters::new(100.0, 100.0, 100.0));
        let consumed = sim.draws().consumed();
        let r = sim.step(&SimulationParameters::new(100.0, 100.0, 100.0));
        assert_eq!(sim.draws().consumed(), consumed);
        assert_eq!(r.dead, 1);
        assert_eq!(r.healthy, 8);
    }

    #[test]
    fn terminal_after_passing_horizon() {
        let mut sim = ContagionSimulation::new(2, 3, 0, ScriptedDraws::constant(0.99)).unwrap();
        sim.seed();
        let params = SimulationParameters::default();
        let mut steps = 0;
        while !sim.is_terminal() {
            sim.step(&params);
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(sim.tick(), 4);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut sim = scripted(4, vec![0.99, 0.99, 0.0]);
        sim.seed();
        sim.step(&full_spread());
        sim.reset();
        assert_eq!(
            sim.snapshot(),
            StepResult { tick: 0, healthy: 16, infected: 0, immune: 0, dead: 0, total_ever_infected: 0 }
        );
    }

    #[test]
    fn out_of_range_parameters_are_clamped_not_rejected() {
        let mut sim = scripted(5, vec![0.99]);
        sim.seed();
        let r = sim.step(&SimulationParameters::new(1e6, -5.0, f64::NAN));
        assert_eq!(r.population(), 25);
        // domesticity clamps to 0, so nothing spreads.
        assert_eq!(r.total_ever_infected, 1);
    }

    #[test]
    fn seeded_engines_from_config_agree() {
        let config = SimulationConfig::default();
        let mut a = ContagionSimulation::from_config(&config).unwrap();
        let mut b = ContagionSimulation::from_config(&config).unwrap();
        a.seed();
        b.seed();
        for _ in 0..100 {
            assert_eq!(a.step(&config.parameters), b.step(&config.parameters));
        }
    }
}
