//! Tick-based cellular automaton for disease spread on a square grid.
//!
//! [`ContagionSimulation`] owns the grid and the transition rules; [`runner`] drives a
//! run to its horizon, [`sweep`] fans independent runs out over rayon and [`output`]
//! persists what they recorded.

pub mod draws;
pub mod grid;
pub mod output;
pub mod runner;
pub mod simulation;
pub mod sweep;

pub use contagion_common::{RateScales, SimulationConfig, SimulationParameters, StepResult, TransitionRates};
pub use draws::{DrawSource, ScriptedDraws, SeededDraws};
pub use grid::{Cell, CellStatus, Grid};
pub use runner::{run_outbreak, Milestone, RunReport};
pub use simulation::ContagionSimulation;
pub use sweep::{run_replicates, ReplicateSummary};
