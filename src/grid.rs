use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Health status of one individual. Exactly one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Healthy,
    Infected,
    Immune,
    Dead,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Healthy => "healthy",
            CellStatus::Infected => "infected",
            CellStatus::Immune => "immune",
            CellStatus::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub status: CellStatus,
    /// Consecutive ticks spent infected; only meaningful while `Infected`.
    pub ticks_infected: u32,
}

impl Cell {
    pub const HEALTHY: Cell = Cell { status: CellStatus::Healthy, ticks_infected: 0 };

    /// Moves the cell into `Infected` with a fresh infection clock.
    pub fn infect(&mut self) {
        self.status = CellStatus::Infected;
        self.ticks_infected = 0;
    }
}

/// Per-status population counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub healthy: u32,
    pub infected: u32,
    pub immune: u32,
    pub dead: u32,
}

/// Square grid of cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    side: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Allocates a `side` x `side` grid with every cell healthy.
    pub fn new(side: usize) -> Result<Self> {
        if side == 0 {
            anyhow::bail!("grid side must be at least 1.");
        }
        let len = side
            .checked_mul(side)
            .ok_or_else(|| anyhow::anyhow!("grid side {} overflows the cell count.", side))?;
        Ok(Grid { side, cells: vec![Cell::HEALTHY; len] })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Resets every cell to healthy, keeping the allocation.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::HEALTHY);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Cell> {
        self.cells.get_mut(idx)
    }

    #[inline(always)]
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.side + col
    }

    #[inline(always)]
    pub fn position_of(&self, idx: usize) -> (usize, usize) {
        (idx / self.side, idx % self.side)
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Copies every cell's status into `out`, used as the read-only view of a tick.
    pub fn statuses_into(&self, out: &mut Vec<CellStatus>) {
        out.clear();
        out.extend(self.cells.iter().map(|c| c.status));
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for cell in &self.cells {
            match cell.status {
                CellStatus::Healthy => census.healthy += 1,
                CellStatus::Infected => census.infected += 1,
                CellStatus::Immune => census.immune += 1,
                CellStatus::Dead => census.dead += 1,
            }
        }
        census
    }

    /// Collects the Moore neighbours of `idx` (up to 8) into `out`, clipped at the edges.
    ///
    /// Neighbours are produced row by row, top-left first. `out` is cleared first so the
    /// buffer can be reused across cells.
    pub fn neighbors_into(&self, idx: usize, out: &mut Vec<usize>) {
        out.clear();
        self.for_each_neighbor(idx, |n| out.push(n));
    }

    /// Calls `f` for each Moore neighbour of `idx`, in row-major order.
    #[inline(always)]
    pub fn for_each_neighbor<F>(&self, idx: usize, mut f: F)
    where
        F: FnMut(usize),
    {
        if idx >= self.cells.len() {
            log::error!("Cell index {} out of bounds for a {}x{} grid.", idx, self.side, self.side);
            return;
        }
        let (row, col) = self.position_of(idx);
        let row_lo = row.saturating_sub(1);
        let row_hi = (row + 1).min(self.side - 1);
        let col_lo = col.saturating_sub(1);
        let col_hi = (col + 1).min(self.side - 1);

        for r in row_lo..=row_hi {
            for c in col_lo..=col_hi {
                if r != row || c != col {
                    f(self.index_of(r, c));
                }
            }
        }
    }
}
