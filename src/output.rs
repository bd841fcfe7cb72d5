use crate::grid::Grid;
use crate::sweep::ReplicateSummary;
use anyhow::{Context, Result};
use contagion_common::{OutputConfig, OutputFormat, StepResult};
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Resolves the configured snapshot format, falling back to JSON on unknown names.
pub fn resolve_format(output: &OutputConfig) -> OutputFormat {
    let name = output.format.as_deref().unwrap_or("json");
    OutputFormat::from_name(name).unwrap_or_else(|| {
        error!("Unknown output format: {}. Using JSON instead.", name);
        OutputFormat::Json
    })
}

/// Writes recorded snapshots next to `output.base_filename` and returns the file written.
pub fn save_snapshots(snapshots: &[StepResult], output: &OutputConfig) -> Result<PathBuf> {
    let format = resolve_format(output);
    let filename = PathBuf::from(format!("{}_snapshots.{}", output.base_filename, format.extension()));
    write_snapshots(snapshots, format, &filename)?;
    info!("{} snapshots saved to {}", snapshots.len(), filename.display());
    Ok(filename)
}

pub fn write_snapshots(snapshots: &[StepResult], format: OutputFormat, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, snapshots).context("Error serializing snapshots to JSON")?;
        }
        OutputFormat::Bincode => {
            bincode::serialize_into(&mut writer, snapshots).context("Error serializing snapshots to bincode")?;
        }
        OutputFormat::MessagePack => {
            rmp_serde::encode::write(&mut writer, snapshots)
                .context("Error serializing snapshots to MessagePack")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Reads snapshots back from a file written by [`write_snapshots`].
pub fn read_snapshots(format: OutputFormat, path: &Path) -> Result<Vec<StepResult>> {
    let file = File::open(path).with_context(|| format!("Error opening snapshot file '{}'", path.display()))?;
    let reader = std::io::BufReader::new(file);
    let snapshots: Vec<StepResult> = match format {
        OutputFormat::Json => serde_json::from_reader(reader)?,
        OutputFormat::Bincode => bincode::deserialize_from(reader)?,
        OutputFormat::MessagePack => rmp_serde::decode::from_read(reader)?,
    };
    Ok(snapshots)
}

/// Writes one CSV row per cell: row, column, status and infection age.
pub fn save_final_grid(grid: &Grid, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating grid CSV '{}'", path.display()))?;
    writer.write_record(["row", "col", "status", "ticks_infected"])?;
    for (idx, cell) in grid.cells().iter().enumerate() {
        let (row, col) = grid.position_of(idx);
        writer.write_record(&[
            row.to_string(),
            col.to_string(),
            cell.status.as_str().to_string(),
            cell.ticks_infected.to_string(),
        ])?;
    }
    writer.flush()?;
    info!("Final grid saved to {}", path.display());
    Ok(())
}

pub fn save_replicate_summaries(summaries: &[ReplicateSummary], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating replicate CSV '{}'", path.display()))?;
    writer.write_record([
        "replicate",
        "rng_seed",
        "healthy",
        "infected",
        "immune",
        "dead",
        "total_ever_infected",
        "peak_infected",
        "peak_tick",
        "epidemic_end_tick",
    ])?;
    for s in summaries {
        let r = &s.final_result;
        writer.write_record(&[
            s.replicate.to_string(),
            s.rng_seed.to_string(),
            r.healthy.to_string(),
            r.infected.to_string(),
            r.immune.to_string(),
            r.dead.to_string(),
            r.total_ever_infected.to_string(),
            s.peak_infected.to_string(),
            s.peak_tick.to_string(),
            s.epidemic_end_tick.map(|t| t.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    info!("Replicate summaries saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellStatus;

    fn sample() -> Vec<StepResult> {
        vec![
            StepResult { tick: 0, healthy: 8, infected: 1, immune: 0, dead: 0, total_ever_infected: 1 },
            StepResult { tick: 1, healthy: 6, infected: 2, immune: 1, dead: 0, total_ever_infected: 3 },
        ]
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("contagion_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn snapshots_survive_every_format() {
        for format in [OutputFormat::Json, OutputFormat::Bincode, OutputFormat::MessagePack] {
            let path = temp_path(&format!("snapshots.{}", format.extension()));
            write_snapshots(&sample(), format, &path).unwrap();
            assert_eq!(read_snapshots(format, &path).unwrap(), sample());
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        let output = OutputConfig { format: Some("yaml".to_string()), ..OutputConfig::default() };
        assert_eq!(resolve_format(&output), OutputFormat::Json);
    }

    #[test]
    fn final_grid_csv_has_one_row_per_cell() {
        let mut grid = Grid::new(2).unwrap();
        grid.get_mut(3).unwrap().infect();
        let path = temp_path("grid.csv");
        save_final_grid(&grid, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[3][0], "1");
        assert_eq!(&rows[3][1], "1");
        assert_eq!(&rows[3][2], CellStatus::Infected.as_str());
        let _ = std::fs::remove_file(&path);
    }
}
