use crate::draws::DrawSource;
use crate::simulation::ContagionSimulation;
use contagion_common::{SimulationParameters, StepResult};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Domesticity above which animal-to-human spillover is flagged at outbreak start.
pub const SPILLOVER_DOMESTICITY: f64 = 70.0;
/// An epidemic counts as ended only once more than this many cells are immune.
pub const EPIDEMIC_END_MIN_IMMUNE: u32 = 10;
/// Share of the population that must be dead to flag high mortality.
pub const HIGH_MORTALITY_FRACTION: f64 = 0.1;

/// Notable events of a run. Each kind is reported at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    OutbreakStarted { parameters: SimulationParameters },
    SpilloverRisk { domesticity: f64 },
    EpidemicEnded { tick: u32 },
    HighMortality { tick: u32, dead: u32 },
    Completed { tick: u32, survivors: u32 },
}

/// Everything a driven run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Snapshots taken at tick 0, every record interval, and at the end.
    pub recorded: Vec<StepResult>,
    pub final_result: StepResult,
    pub peak_infected: u32,
    pub peak_tick: u32,
    pub milestones: Vec<Milestone>,
}

impl RunReport {
    pub fn epidemic_end_tick(&self) -> Option<u32> {
        self.milestones.iter().find_map(|m| match m {
            Milestone::EpidemicEnded { tick } => Some(*tick),
            _ => None,
        })
    }
}

#[derive(Default)]
struct MilestoneTracker {
    epidemic_ended: bool,
    high_mortality: bool,
}

impl MilestoneTracker {
    fn observe(&mut self, result: &StepResult, out: &mut Vec<Milestone>) {
        if !self.epidemic_ended && result.infected == 0 && result.immune > EPIDEMIC_END_MIN_IMMUNE {
            self.epidemic_ended = true;
            info!(
                "Epidemic ended at step {}. Population developed immunity ({} immune).",
                result.tick, result.immune
            );
            out.push(Milestone::EpidemicEnded { tick: result.tick });
        }

        let mortality_threshold = result.population() as f64 * HIGH_MORTALITY_FRACTION;
        if !self.high_mortality && result.dead as f64 > mortality_threshold {
            self.high_mortality = true;
            warn!(
                "High mortality at step {}: {} of {} dead.",
                result.tick,
                result.dead,
                result.population()
            );
            out.push(Milestone::HighMortality { tick: result.tick, dead: result.dead });
        }
    }
}

/// Resets `sim`, seeds the outbreak and steps it until it is terminal.
///
/// `record_interval` controls how often a snapshot is kept; 0 keeps only the first
/// and last. Parameters stay fixed for the whole run.
pub fn run_outbreak<D: DrawSource>(
    sim: &mut ContagionSimulation<D>,
    params: &SimulationParameters,
    record_interval: u32,
) -> RunReport {
    if params.is_out_of_range() {
        warn!("Parameters {:?} fall outside [0, 100]; clamping to {:?}.", params, params.clamped());
    }

    sim.reset();
    sim.seed();

    let mut milestones = vec![Milestone::OutbreakStarted { parameters: *params }];
    info!(
        "Outbreak started: density={}%, domesticity={}%, virulence={}%.",
        params.density, params.domesticity, params.virulence
    );
    if params.domesticity > SPILLOVER_DOMESTICITY {
        warn!("High domestication ({}%): animal-to-human spillover risk.", params.domesticity);
        milestones.push(Milestone::SpilloverRisk { domesticity: params.domesticity });
    }

    let initial = sim.snapshot();
    let mut recorded = vec![initial];
    let mut peak_infected = initial.infected;
    let mut peak_tick = initial.tick;
    let mut tracker = MilestoneTracker::default();
    let mut last = initial;

    while !sim.is_terminal() {
        let result = sim.step(params);
        if result.infected > peak_infected {
            peak_infected = result.infected;
            peak_tick = result.tick;
        }
        tracker.observe(&result, &mut milestones);

        let is_record_step = record_interval > 0 && result.tick % record_interval == 0;
        if is_record_step {
            recorded.push(result);
        }
        if result.tick % 100 == 0 {
            debug!(
                "Step [{}/{}] | Healthy: {} | Infected: {} | Immune: {} | Dead: {}",
                result.tick,
                sim.horizon() + 1,
                result.healthy,
                result.infected,
                result.immune,
                result.dead
            );
        } else {
            trace!("Step {} completed: {:?}", result.tick, result);
        }
        last = result;
    }

    if recorded.last() != Some(&last) {
        recorded.push(last);
    }

    info!(
        "Simulation complete after {} steps. {} survivors remaining ({} ever infected).",
        last.tick,
        last.survivors(),
        last.total_ever_infected
    );
    milestones.push(Milestone::Completed { tick: last.tick, survivors: last.survivors() });

    RunReport { recorded, final_result: last, peak_infected, peak_tick, milestones }
}
