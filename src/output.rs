//! Run output files.
//!
//! The iteration log is append-only and flushed row by row so that every row
//! written before an abort survives it. The statistics file is rewritten once
//! at the end of a run. All files are tab-delimited with a single header line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::evolve::stats::RunningStats;
use crate::model::{Model, Scores, ZERO_GUARD};

pub const ITERATIONS_FILE: &str = "iterations.txt";
pub const STATISTICS_FILE: &str = "statistics.txt";
pub const OAT_SENSITIVITY_FILE: &str = "sensitivity_analysis.txt";
pub const RANDOM_SENSITIVITY_FILE: &str = "random_sensitivity.txt";

/// Mutation fields of one log row. Rows without a surviving mutation
/// (rejected, unstable, initial) print the placeholder key `_`.
#[derive(Debug, Clone)]
pub struct LoggedMutation {
    pub key: String,
    pub previous: f64,
    pub value: f64,
}

#[derive(Debug)]
pub struct IterationLog {
    writer: BufWriter<File>,
}

impl IterationLog {
    pub fn create(path: &Path, model: &Model) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        write!(
            writer,
            "iteration\taccepted\trejected\tunstable\tparam_key\tparam_previous\tparam_value"
        )?;
        for sp in model.variable_species() {
            write!(writer, "\t{}", sp.id)?;
        }
        for rx in &model.reactions {
            write!(writer, "\t{}", rx.id)?;
        }
        writeln!(
            writer,
            "\twild_sum\tmutant_sum\tsum_dist_abs\tsum_dist_rel\tmoma_abs\tmoma_rel\tmoma_all_abs\tmoma_all_rel"
        )?;
        writer.flush()?;
        Ok(Self { writer })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_row(
        &mut self,
        iteration: u64,
        accepted: u64,
        rejected: u64,
        unstable: u32,
        mutation: Option<&LoggedMutation>,
        model: &Model,
        scores: &Scores,
    ) -> io::Result<()> {
        write!(
            self.writer,
            "{iteration}\t{accepted}\t{rejected}\t{unstable}"
        )?;
        match mutation {
            Some(m) => write!(self.writer, "\t{}\t{}\t{}", m.key, m.previous, m.value)?,
            None => write!(self.writer, "\t_\t0\t0")?,
        }
        for sp in model.variable_species() {
            write!(self.writer, "\t{}", sp.mutant_value)?;
        }
        for rx in &model.reactions {
            write!(self.writer, "\t{}", rx.mutant_flux)?;
        }
        writeln!(
            self.writer,
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            scores.wild_sum,
            scores.mutant_sum,
            scores.sum_dist_abs,
            scores.sum_dist_rel,
            scores.moma_abs,
            scores.moma_rel,
            scores.moma_all_abs,
            scores.moma_all_rel,
        )?;
        self.writer.flush()
    }
}

/// Final per-quantity statistics: one row per variable species and per
/// reaction, derived with `n` accepted iterations.
pub fn write_statistics(
    path: &Path,
    model: &Model,
    species_stats: &[RunningStats],
    flux_stats: &[RunningStats],
    n: u64,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "kind\tid\twild\tmean\tvar\tCV\tER")?;
    for (sp, stats) in model.variable_species().zip(species_stats) {
        let d = stats.derive(n);
        writeln!(
            writer,
            "species\t{}\t{}\t{}\t{}\t{}\t{}",
            sp.id, sp.wild_value, d.mean, d.var, d.cv, d.evolution_rate
        )?;
    }
    for (rx, stats) in model.reactions.iter().zip(flux_stats) {
        let d = stats.derive(n);
        writeln!(
            writer,
            "reaction\t{}\t{}\t{}\t{}\t{}\t{}",
            rx.id, rx.wild_flux, d.mean, d.var, d.cv, d.evolution_rate
        )?;
    }
    writer.flush()
}

/// Per-trial sensitivity records. The first data row is the wild baseline
/// (absolute values); every trial row records wild-relative changes, `NA`
/// where the wild reference is below the zero floor.
pub struct SensitivityLog {
    writer: BufWriter<File>,
}

impl SensitivityLog {
    pub fn create(path: &Path, model: &Model) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        write!(writer, "param\tfactor\tvalue")?;
        for sp in model.variable_species() {
            write!(writer, "\t{}", sp.id)?;
        }
        for rx in &model.reactions {
            write!(writer, "\t{}", rx.id)?;
        }
        writeln!(writer)?;

        // Baseline row: the wild steady state itself.
        write!(writer, "wild\t0\t0")?;
        for sp in model.variable_species() {
            write!(writer, "\t{}", sp.wild_value)?;
        }
        for rx in &model.reactions {
            write!(writer, "\t{}", rx.wild_flux)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn write_trial(
        &mut self,
        model: &Model,
        param_key: &str,
        factor: f64,
        param_value: f64,
    ) -> io::Result<()> {
        write!(self.writer, "{param_key}\t{factor}\t{param_value}")?;
        for sp in model.variable_species() {
            write_relative(&mut self.writer, sp.mutant_value, sp.wild_value)?;
        }
        for rx in &model.reactions {
            write_relative(&mut self.writer, rx.mutant_flux, rx.wild_flux)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

fn write_relative<W: Write>(writer: &mut W, value: f64, wild: f64) -> io::Result<()> {
    if wild.abs() > ZERO_GUARD {
        write!(writer, "\t{}", (value - wild) / wild)
    } else {
        write!(writer, "\tNA")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::NetworkDescription;

    fn model() -> Model {
        let network: NetworkDescription = toml::from_str(
            r#"
[[species]]
id = "A"
initial = 2.0

[[species]]
id = "Ext"
constant = true
initial = 1.0

[[parameters]]
id = "k1"
value = 1.0

[[reactions]]
id = "v1"
"#,
        )
        .unwrap();
        Model::from_description(network).unwrap()
    }

    #[test]
    fn iteration_log_has_one_column_per_tracked_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ITERATIONS_FILE);
        let model = model();
        let mut log = IterationLog::create(&path, &model).unwrap();
        log.write_row(0, 0, 0, 0, None, &model, &Scores::default())
            .unwrap();
        drop(log);

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().unwrap().split('\t').collect();
        let row: Vec<&str> = lines.next().unwrap().split('\t').collect();
        // 7 bookkeeping + 1 species + 1 reaction + 8 scores.
        assert_eq!(header.len(), 17);
        assert_eq!(row.len(), header.len());
        assert_eq!(row[4], "_");
        assert!(!header.contains(&"Ext"), "constant species are not logged");
    }

    #[test]
    fn sensitivity_trial_reports_na_for_zero_wild_flux() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OAT_SENSITIVITY_FILE);
        let mut model = model();
        model.species[0].wild_value = 2.0;
        model.species[0].mutant_value = 3.0;
        // Wild flux stays 0.0: relative change is undefined.
        let mut log = SensitivityLog::create(&path, &model).unwrap();
        log.write_trial(&model, "k1", 0.1, 1.25).unwrap();
        drop(log);

        let text = std::fs::read_to_string(&path).unwrap();
        let last = text.lines().last().unwrap();
        let fields: Vec<&str> = last.split('\t').collect();
        assert_eq!(fields[3], "0.5");
        assert_eq!(fields[4], "NA");
    }
}
