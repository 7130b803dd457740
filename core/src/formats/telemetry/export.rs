use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use uom::si::power::watt;

use super::TelemetryRecord;

#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] csv::Error);

#[derive(Debug, Serialize)]
struct CsvRow {
    time: f64,
    cpu: f64,
    ram: f64,
    disk: f64,
    bandwidth: f64,
    fpga: Option<f64>,
    #[serde(rename = "turnedOnMachineCount")]
    turned_on_machine_count: u64,
    #[serde(rename = "averagePowerConsumption")]
    average_power_consumption: f64,
    #[serde(rename = "totalPowerConsumption")]
    total_power_consumption: f64,
    #[serde(rename = "numberOfSLAVs")]
    number_of_slavs: u64,
}

impl From<&TelemetryRecord> for CsvRow {
    fn from(r: &TelemetryRecord) -> Self {
        Self {
            time: r.time,
            cpu: r.cpu,
            ram: r.ram,
            disk: r.disk,
            bandwidth: r.bandwidth,
            fpga: r.fpga,
            turned_on_machine_count: r.turned_on_machine_count,
            average_power_consumption: r.average_power_consumption.get::<watt>(),
            total_power_consumption: r.total_power_consumption.get::<watt>(),
            number_of_slavs: r.number_of_slavs,
        }
    }
}

/// Writes the records as CSV with one header line.
///
/// Power columns are in watts, exactly as stored in the dump. The `fpga`
/// column is left empty for dumps without it.
pub fn write_csv(wtr: impl Write, records: &[TelemetryRecord]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(wtr);
    for record in records {
        wtr.serialize(CsvRow::from(record))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
