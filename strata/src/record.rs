//! Recorders writing to files.
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use log::warn;
use std::{fs::File, path::Path};
use strata_core::record::{Record, RecordValue, Recorder};

/// Columns of [`CsvRecorder`], in order.
pub const CSV_COLUMNS: [&str; 10] = [
    "iteration",
    "env_steps",
    "opt_steps",
    "fps",
    "actor_loss",
    "critic_loss",
    "entropy",
    "rollout_avg_return",
    "eval_avg_return",
    "eval_std_return",
];

/// Writes the records of training iterations as rows of a CSV file.
///
/// A header row is written on construction. Keys missing in a record give
/// empty cells, keys not in [`CSV_COLUMNS`] are ignored.
pub struct CsvRecorder {
    wtr: Writer<File>,
}

impl CsvRecorder {
    /// Creates the file and writes the header.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(CSV_COLUMNS)?;
        Ok(Self { wtr })
    }

    fn row(record: &Record) -> Vec<String> {
        CSV_COLUMNS
            .iter()
            .map(|k| match record.get(k) {
                Some(RecordValue::Scalar(v)) => v.to_string(),
                Some(RecordValue::String(s)) => s.clone(),
                _ => String::new(),
            })
            .collect()
    }
}

impl Recorder for CsvRecorder {
    fn write(&mut self, record: Record) {
        if let Err(e) = self.wtr.write_record(Self::row(&record)) {
            warn!("Failed to write a record to CSV: {}", e);
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_csv_recorder() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("train.csv");

        let mut recorder = CsvRecorder::new(&path)?;
        let mut record = Record::from_scalar("iteration", 1.0);
        record.insert("actor_loss", RecordValue::Scalar(0.5));
        record.insert("not_a_column", RecordValue::Scalar(9.0));
        recorder.write(record);
        recorder.write(Record::from_scalar("iteration", 2.0));
        recorder.flush()?;

        let mut rdr = csv::Reader::from_path(&path)?;
        assert_eq!(rdr.headers()?.iter().collect::<Vec<_>>(), CSV_COLUMNS.to_vec());
        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][4], "0.5");
        assert_eq!(&rows[0][5], "");
        assert_eq!(&rows[1][0], "2");
        assert_eq!(&rows[1][4], "");
        Ok(())
    }
}
