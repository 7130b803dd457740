use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use get_size::GetSize;
use tracing::{error, info};
use uom::si::power::{kilowatt, watt};

use crate::{
    common::{
        range::Range,
        series::{Series, TimeSeries},
    },
    formats::telemetry::{self, RecordLayout, TelemetryRecord},
};

/// A single column of a telemetry dump, as plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Cpu,
    Ram,
    Disk,
    Bandwidth,
    Fpga,
    TurnedOnMachines,
    SlaViolations,
    AveragePower,
    TotalPowerKw,
}

impl Column {
    /// Series name used in chart labels.
    pub fn name(self) -> &'static str {
        match self {
            Column::Cpu => "CPU",
            Column::Ram => "RAM",
            Column::Disk => "Disk",
            Column::Bandwidth => "Bandwidth",
            Column::Fpga => "FPGA",
            Column::TurnedOnMachines => "Machines",
            Column::SlaViolations => "SLA Violations",
            Column::AveragePower => "Avg Power",
            Column::TotalPowerKw => "Total Power (kW)",
        }
    }

    /// `None` if the record doesn't carry this column.
    pub fn value(self, record: &TelemetryRecord) -> Option<f64> {
        Some(match self {
            Column::Cpu => record.cpu,
            Column::Ram => record.ram,
            Column::Disk => record.disk,
            Column::Bandwidth => record.bandwidth,
            Column::Fpga => return record.fpga,
            Column::TurnedOnMachines => record.turned_on_machine_count as f64,
            Column::SlaViolations => record.number_of_slavs as f64,
            Column::AveragePower => record.average_power_consumption.get::<watt>(),
            Column::TotalPowerKw => record.total_power_consumption.get::<kilowatt>(),
        })
    }
}

/// One decoded dump plus the label it is shown under.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub label: String,
    pub path: PathBuf,
    pub layout: RecordLayout,
    records: Vec<TelemetryRecord>,
}

impl Dataset {
    /// Fails on empty records, which no decoded dump can produce.
    pub fn new(
        label: String,
        path: PathBuf,
        layout: RecordLayout,
        records: Vec<TelemetryRecord>,
    ) -> Result<Self, telemetry::Error> {
        if records.is_empty() {
            return Err(telemetry::Error::Empty);
        }
        Ok(Self {
            label,
            path,
            layout,
            records,
        })
    }

    pub fn load(path: &Path, layout: RecordLayout) -> Result<Self, telemetry::Error> {
        let records = telemetry::decode_file(path, layout)?;
        Self::new(label_for(path), path.to_path_buf(), layout, records)
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn time(&self) -> Series {
        self.records.iter().map(|r| r.time).collect()
    }

    pub fn column(&self, column: Column) -> Option<TimeSeries> {
        let values = self
            .records
            .iter()
            .map(|r| column.value(r))
            .collect::<Option<Series>>()?;
        Some(TimeSeries::new(self.time(), values))
    }

    /// Columns present in this dataset's layout, in plotting order.
    pub fn utilization_columns(&self) -> &'static [Column] {
        if self.layout.has_fpga() {
            &[
                Column::Cpu,
                Column::Ram,
                Column::Disk,
                Column::Bandwidth,
                Column::Fpga,
            ]
        } else {
            &[Column::Cpu, Column::Ram, Column::Disk, Column::Bandwidth]
        }
    }

    pub fn heap_size(&self) -> usize {
        self.label.get_heap_size() + self.records.get_heap_size()
    }

    pub fn summary(&self) -> Summary {
        let kw = |r: &TelemetryRecord| r.total_power_consumption.get::<kilowatt>();
        let first = &self.records[0];
        let last = &self.records[self.records.len() - 1];

        Summary {
            records: self.records.len(),
            time: Range::new(first.time, last.time),
            peak_machines: self
                .records
                .iter()
                .map(|r| r.turned_on_machine_count)
                .max()
                .unwrap_or_default(),
            peak_total_power_kw: self.records.iter().map(kw).fold(f64::NAN, f64::max),
            mean_total_power_kw: self.records.iter().map(kw).sum::<f64>()
                / self.records.len() as f64,
            final_sla_violations: last.number_of_slavs,
        }
    }
}

/// Headline numbers of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub records: usize,
    /// First and last timestamp in file order.
    pub time: Range<f64>,
    pub peak_machines: u64,
    pub peak_total_power_kw: f64,
    pub mean_total_power_kw: f64,
    pub final_sla_violations: u64,
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "records:              {}", self.records)?;
        writeln!(f, "time:                 {} .. {}", self.time.min, self.time.max)?;
        writeln!(f, "peak machines:        {}", self.peak_machines)?;
        writeln!(f, "peak total power:     {:.3} kW", self.peak_total_power_kw)?;
        writeln!(f, "mean total power:     {:.3} kW", self.mean_total_power_kw)?;
        write!(f, "final SLA violations: {}", self.final_sla_violations)
    }
}

/// Display label of a dump: its file name.
pub fn label_for(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: Vec<(PathBuf, telemetry::Error)>,
}

/// The datasets open in one window or CLI run, all sharing one layout.
#[derive(Debug, Default)]
pub struct Session {
    layout: RecordLayout,
    datasets: Vec<Dataset>,
}

impl Session {
    pub fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            datasets: Vec::new(),
        }
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Loads every path in order and appends the ones that decode.
    ///
    /// Files that fail are logged and skipped. Loading the same path again
    /// appends another dataset.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> LoadReport {
        let mut report = LoadReport::default();
        for path in paths {
            let path = path.as_ref();
            match Dataset::load(path, self.layout) {
                Ok(dataset) => {
                    info!(
                        "Loaded {} records ({} bytes) from {:?}",
                        dataset.len(),
                        dataset.heap_size(),
                        path
                    );
                    self.datasets.push(dataset);
                    report.loaded += 1;
                }
                Err(err) => {
                    error!("Error reading {:?}: {}", path, err);
                    report.failed.push((path.to_path_buf(), err));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::formats::telemetry::{encode, tests::record};

    fn write_dump(dir: &Path, name: &str, count: u64, layout: RecordLayout) -> PathBuf {
        let records: Vec<_> = (0..count).map(|i| record(i, layout)).collect();
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&encode(&records, layout)).unwrap();
        path
    }

    #[test]
    fn label_is_file_name() {
        assert_eq!(label_for(Path::new("/runs/ILPDQN128_10e3.bin")), "ILPDQN128_10e3.bin");
        assert_eq!(label_for(Path::new("run.bin")), "run.bin");
    }

    #[test]
    fn loading_twice_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dump(dir.path(), "a.bin", 4, RecordLayout::WithFpga);

        let mut session = Session::new(RecordLayout::WithFpga);
        let report = session.load_files([&path, &path]);

        assert_eq!(report.loaded, 2);
        assert!(report.failed.is_empty());
        assert_eq!(session.datasets().len(), 2);
        assert_eq!(session.datasets()[0].records(), session.datasets()[1].records());
        assert_eq!(session.datasets()[1].label, "a.bin");
    }

    #[test]
    fn bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_dump(dir.path(), "good.bin", 3, RecordLayout::WithoutFpga);
        let empty = dir.path().join("empty.bin");
        std::fs::File::create(&empty).unwrap();
        let partial = dir.path().join("partial.bin");
        std::fs::write(&partial, [0u8; 100]).unwrap();
        let missing = dir.path().join("missing.bin");

        let mut session = Session::new(RecordLayout::WithoutFpga);
        let report = session.load_files([&empty, &good, &partial, &missing]);

        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed.len(), 3);
        assert_eq!(session.datasets().len(), 1);
        assert_eq!(session.datasets()[0].label, "good.bin");
        assert_eq!(session.datasets()[0].len(), 3);
    }

    #[test]
    fn total_power_in_kilowatts() {
        let layout = RecordLayout::WithFpga;
        let records: Vec<_> = (0..3).map(|i| record(i, layout)).collect();
        let dataset = Dataset::new("x".into(), "x".into(), layout, records).unwrap();

        let total = dataset.column(Column::TotalPowerKw).unwrap();
        let values: Vec<_> = total.values.iter().collect();
        for (value, expected) in values.iter().zip([1.0, 2.0, 3.0]) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn fpga_column_depends_on_layout() {
        let with = Dataset::new(
            "a".into(),
            "a".into(),
            RecordLayout::WithFpga,
            vec![record(0, RecordLayout::WithFpga)],
        )
        .unwrap();
        let without = Dataset::new(
            "b".into(),
            "b".into(),
            RecordLayout::WithoutFpga,
            vec![record(0, RecordLayout::WithoutFpga)],
        )
        .unwrap();

        assert!(with.column(Column::Fpga).is_some());
        assert!(without.column(Column::Fpga).is_none());
        assert_eq!(with.utilization_columns().len(), 5);
        assert_eq!(without.utilization_columns().len(), 4);
    }

    #[test]
    fn summary() {
        let layout = RecordLayout::WithoutFpga;
        let records: Vec<_> = (0..4).map(|i| record(i, layout)).collect();
        let dataset = Dataset::new("x".into(), "x".into(), layout, records).unwrap();
        let summary = dataset.summary();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.time, Range::new(0.0, 900.0));
        assert_eq!(summary.peak_machines, 13);
        assert!((summary.peak_total_power_kw - 4.0).abs() < 1e-9);
        assert!((summary.mean_total_power_kw - 2.5).abs() < 1e-9);
        assert_eq!(summary.final_sla_violations, 6);
        assert!(summary.to_string().starts_with("records:              4\n"));
    }

    #[test]
    #[should_panic]
    fn empty_dataset() {
        Dataset::new("a".into(), "a".into(), RecordLayout::WithFpga, vec![]).unwrap();
    }
}
