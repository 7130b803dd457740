//! Fixed-width telemetry dumps written by the data-center simulator.
//!
//! A dump is a raw array of records with no header, magic number or version
//! field. Two record layouts exist on disk and they cannot be told apart from
//! the bytes alone, so every decode call takes the [`RecordLayout`] explicitly.

use std::{
    io::{Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use derive_more::Display;
use get_size::GetSize;
use tracing::{debug, instrument};
use uom::si::{f64::Power, power::watt};

pub use self::err::Error;

pub mod err;
pub mod export;

/// Size of every primitive in a record.
const FIELD_SIZE: usize = 8;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordLayout {
    /// `time, cpu, ram, disk, bandwidth, fpga, machines, avg power, total power, SLAVs`
    #[default]
    #[display(fmt = "with-fpga")]
    WithFpga,
    /// Same as [`RecordLayout::WithFpga`] without the `fpga` column.
    #[display(fmt = "without-fpga")]
    WithoutFpga,
}

impl RecordLayout {
    pub fn has_fpga(self) -> bool {
        matches!(self, RecordLayout::WithFpga)
    }

    pub fn field_count(self) -> usize {
        if self.has_fpga() {
            10
        } else {
            9
        }
    }

    pub fn record_size(self) -> usize {
        self.field_count() * FIELD_SIZE
    }
}

/// One sample of the simulated data center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub time: f64,
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub bandwidth: f64,
    /// Only present in [`RecordLayout::WithFpga`] dumps.
    pub fpga: Option<f64>,
    pub turned_on_machine_count: u64,
    pub average_power_consumption: Power,
    pub total_power_consumption: Power,
    pub number_of_slavs: u64,
}

// Can't use derive because no `GetSize` implementation for `uom` types exists.
// The record has no heap allocations anyway.
impl GetSize for TelemetryRecord {}

impl TelemetryRecord {
    pub fn from_reader(mut rdr: impl Read, layout: RecordLayout) -> Result<Self, std::io::Error> {
        let time = rdr.read_f64::<LittleEndian>()?;
        let cpu = rdr.read_f64::<LittleEndian>()?;
        let ram = rdr.read_f64::<LittleEndian>()?;
        let disk = rdr.read_f64::<LittleEndian>()?;
        let bandwidth = rdr.read_f64::<LittleEndian>()?;
        let fpga = match layout {
            RecordLayout::WithFpga => Some(rdr.read_f64::<LittleEndian>()?),
            RecordLayout::WithoutFpga => None,
        };
        let turned_on_machine_count = rdr.read_u64::<LittleEndian>()?;
        let average_power_consumption = Power::new::<watt>(rdr.read_f64::<LittleEndian>()?);
        let total_power_consumption = Power::new::<watt>(rdr.read_f64::<LittleEndian>()?);
        let number_of_slavs = rdr.read_u64::<LittleEndian>()?;

        Ok(Self {
            time,
            cpu,
            ram,
            disk,
            bandwidth,
            fpga,
            turned_on_machine_count,
            average_power_consumption,
            total_power_consumption,
            number_of_slavs,
        })
    }

    /// Writes the record the way the simulator does.
    ///
    /// A missing `fpga` value is written as `0.0` for [`RecordLayout::WithFpga`],
    /// and a present one is dropped for [`RecordLayout::WithoutFpga`].
    pub fn write_to(&self, mut wtr: impl Write, layout: RecordLayout) -> Result<(), std::io::Error> {
        wtr.write_f64::<LittleEndian>(self.time)?;
        wtr.write_f64::<LittleEndian>(self.cpu)?;
        wtr.write_f64::<LittleEndian>(self.ram)?;
        wtr.write_f64::<LittleEndian>(self.disk)?;
        wtr.write_f64::<LittleEndian>(self.bandwidth)?;
        if layout.has_fpga() {
            wtr.write_f64::<LittleEndian>(self.fpga.unwrap_or_default())?;
        }
        wtr.write_u64::<LittleEndian>(self.turned_on_machine_count)?;
        wtr.write_f64::<LittleEndian>(self.average_power_consumption.get::<watt>())?;
        wtr.write_f64::<LittleEndian>(self.total_power_consumption.get::<watt>())?;
        wtr.write_u64::<LittleEndian>(self.number_of_slavs)?;
        Ok(())
    }
}

/// Decodes a complete dump held in memory.
///
/// Fails instead of producing a truncated record if `bytes` is empty or its
/// length is not a multiple of [`RecordLayout::record_size`].
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode(bytes: &[u8], layout: RecordLayout) -> Result<Vec<TelemetryRecord>, Error> {
    let record_size = layout.record_size();
    if bytes.is_empty() {
        return Err(Error::Empty);
    }
    if bytes.len() % record_size != 0 {
        return Err(Error::TrailingBytes {
            len: bytes.len(),
            record_size,
            layout,
        });
    }

    let records = bytes
        .chunks_exact(record_size)
        .map(|chunk| TelemetryRecord::from_reader(chunk, layout))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Decoded {} records", records.len());
    Ok(records)
}

/// Reads the whole file and decodes it, see [`decode`].
#[instrument]
pub fn decode_file(path: &Path, layout: RecordLayout) -> Result<Vec<TelemetryRecord>, Error> {
    // TODO: Consider memory mapping once files get large enough for it to matter
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes, layout)
}

/// Encodes records into a dump, the inverse of [`decode`].
pub fn encode(records: &[TelemetryRecord], layout: RecordLayout) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.len() * layout.record_size());
    for record in records {
        // Writing into a Vec can't fail
        let _ = record.write_to(&mut buf, layout);
    }
    buf
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(i: u64, layout: RecordLayout) -> TelemetryRecord {
        let f = i as f64;
        TelemetryRecord {
            time: f * 300.0,
            cpu: 0.1 + f / 100.0,
            ram: 0.2 + f / 100.0,
            disk: 0.3 + f / 100.0,
            bandwidth: 0.4 + f / 100.0,
            fpga: layout.has_fpga().then_some(0.5 + f / 100.0),
            turned_on_machine_count: 10 + i,
            average_power_consumption: Power::new::<watt>(150.5 + f),
            total_power_consumption: Power::new::<watt>(1000.0 * (f + 1.0)),
            number_of_slavs: i * 2,
        }
    }

    #[test]
    fn record_sizes() {
        assert_eq!(RecordLayout::WithFpga.record_size(), 80);
        assert_eq!(RecordLayout::WithoutFpga.record_size(), 72);
    }

    #[test]
    fn decodes_exact_multiple() {
        for layout in [RecordLayout::WithFpga, RecordLayout::WithoutFpga] {
            let records: Vec<_> = (0..5).map(|i| record(i, layout)).collect();
            let bytes = encode(&records, layout);
            assert_eq!(bytes.len(), 5 * layout.record_size());

            let decoded = decode(&bytes, layout).unwrap();
            assert_eq!(decoded, records);
        }
    }

    #[test]
    fn field_order_matches_simulator() {
        let mut bytes = Vec::new();
        for v in [1.5f64, 0.25, 0.5, 0.75, 0.125, 0.0625] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&42u64.to_le_bytes());
        bytes.extend_from_slice(&210.0f64.to_le_bytes());
        bytes.extend_from_slice(&8820.0f64.to_le_bytes());
        bytes.extend_from_slice(&7u64.to_le_bytes());

        let records = decode(&bytes, RecordLayout::WithFpga).unwrap();
        assert_eq!(records.len(), 1);
        let r = records[0];
        assert_eq!(r.time, 1.5);
        assert_eq!(r.cpu, 0.25);
        assert_eq!(r.ram, 0.5);
        assert_eq!(r.disk, 0.75);
        assert_eq!(r.bandwidth, 0.125);
        assert_eq!(r.fpga, Some(0.0625));
        assert_eq!(r.turned_on_machine_count, 42);
        assert_eq!(r.average_power_consumption.get::<watt>(), 210.0);
        assert_eq!(r.total_power_consumption.get::<watt>(), 8820.0);
        assert_eq!(r.number_of_slavs, 7);
    }

    #[test]
    fn without_fpga_has_no_fpga_column() {
        let bytes = encode(&[record(3, RecordLayout::WithoutFpga)], RecordLayout::WithoutFpga);
        let records = decode(&bytes, RecordLayout::WithoutFpga).unwrap();
        assert_eq!(records[0].fpga, None);
        assert_eq!(records[0].turned_on_machine_count, 13);
    }

    #[test]
    fn rejects_partial_record() {
        let bytes = encode(&[record(0, RecordLayout::WithFpga)], RecordLayout::WithFpga);
        for len in 1..bytes.len() {
            assert!(matches!(
                decode(&bytes[..len], RecordLayout::WithFpga),
                Err(Error::TrailingBytes { .. })
            ));
        }

        let mut two = encode(&[record(0, RecordLayout::WithFpga)], RecordLayout::WithFpga);
        two.extend_from_slice(&[0; 8]);
        assert!(decode(&two, RecordLayout::WithFpga).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            decode(&[], RecordLayout::WithoutFpga),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn wrong_layout_is_detected_when_sizes_disagree() {
        // 9 records of 80 bytes = 720 bytes = 10 records of 72 bytes, so only
        // lengths that aren't a common multiple can be caught.
        let records: Vec<_> = (0..2).map(|i| record(i, RecordLayout::WithFpga)).collect();
        let bytes = encode(&records, RecordLayout::WithFpga);
        assert!(decode(&bytes, RecordLayout::WithoutFpga).is_err());
    }

    #[test]
    fn missing_file() {
        let err = decode_file(
            Path::new("this/path/does/not/exist.bin"),
            RecordLayout::WithFpga,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn layout_names() {
        assert_eq!(RecordLayout::WithFpga.to_string(), "with-fpga");
        assert_eq!(RecordLayout::WithoutFpga.to_string(), "without-fpga");
    }
}
