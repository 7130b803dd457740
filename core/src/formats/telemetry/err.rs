use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use super::RecordLayout;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Telemetry dump is empty")]
    #[diagnostic(code(cdc_viewer::telemetry::empty))]
    Empty,

    #[error("Telemetry dump of {len} bytes is not a multiple of the {layout} record size ({record_size} bytes)")]
    #[diagnostic(
        code(cdc_viewer::telemetry::trailing_bytes),
        help("The file was probably written with the other record layout, or the simulator was interrupted mid-record")
    )]
    TrailingBytes {
        len: usize,
        record_size: usize,
        layout: RecordLayout,
    },

    #[error("Could not read {path:?}: {source}")]
    #[diagnostic(code(cdc_viewer::telemetry::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    #[diagnostic(code(cdc_viewer::telemetry::read))]
    Read(#[from] std::io::Error),
}
