//! Six-panel comparison chart of one or more telemetry datasets.
//!
//! [`Figure::build`] decides which series go into which panel and how they are
//! labelled and coloured. [`render`] draws a finished figure with `plotters`.

use plotters::style::{RGBColor, BLACK, BLUE, CYAN, GREEN, MAGENTA, RED, YELLOW};
use uom::si::{f64::Power, power::kilowatt};

use crate::{
    common::{range::Range, series::TimeSeries},
    dataset::{Column, Dataset},
};

pub mod render;

/// Colours assigned to datasets in load order, wrapping around.
pub const PALETTE: [RGBColor; 7] = [BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, BLACK];

pub const ROWS: usize = 3;
pub const COLS: usize = 2;

pub fn dataset_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Utilization,
    Machines,
    SlaViolations,
    AveragePower,
    TotalPower,
    PowerDifference,
}

impl PanelKind {
    /// Row-major order on the grid, also the order of [`Figure::panels`].
    pub const ALL: [PanelKind; ROWS * COLS] = [
        PanelKind::Utilization,
        PanelKind::Machines,
        PanelKind::SlaViolations,
        PanelKind::AveragePower,
        PanelKind::TotalPower,
        PanelKind::PowerDifference,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Utilization => "Resource Utilization",
            PanelKind::Machines => "Turned On Machines",
            PanelKind::SlaViolations => "SLA Violations",
            PanelKind::AveragePower => "Average Power Consumption",
            PanelKind::TotalPower => "Total Power Consumption (kW)",
            PanelKind::PowerDifference => "Total Power Difference (kW)",
        }
    }

    fn columns(self, dataset: &Dataset) -> &'static [Column] {
        match self {
            PanelKind::Utilization => dataset.utilization_columns(),
            PanelKind::Machines => &[Column::TurnedOnMachines],
            PanelKind::SlaViolations => &[Column::SlaViolations],
            PanelKind::AveragePower => &[Column::AveragePower],
            PanelKind::TotalPower => &[Column::TotalPowerKw],
            PanelKind::PowerDifference => &[],
        }
    }
}

/// Sign of one point of the power difference, drawn red or green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffSign {
    Positive,
    NonPositive,
}

impl DiffSign {
    pub fn between(a: Power, b: Power) -> Self {
        if a > b {
            DiffSign::Positive
        } else {
            DiffSign::NonPositive
        }
    }

    pub fn color(self) -> RGBColor {
        match self {
            DiffSign::Positive => RED,
            DiffSign::NonPositive => GREEN,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Marks {
    Line { color: RGBColor },
    /// One sign per point.
    Scatter { signs: Vec<DiffSign> },
}

#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub label: String,
    pub data: TimeSeries,
    pub marks: Marks,
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub kind: PanelKind,
    pub series: Vec<PlotSeries>,
}

impl Panel {
    fn new(kind: PanelKind) -> Self {
        Self {
            kind,
            series: Vec::new(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn has_legend(&self) -> bool {
        !self.series.is_empty()
    }

    /// Axis ranges covering every finite point, `None` for an empty panel.
    pub fn bounds(&self) -> Option<(Range<f64>, Range<f64>)> {
        self.series
            .iter()
            .filter_map(|s| s.data.bounds())
            .reduce(|(ax, ay), (bx, by)| (ax.max(bx), ay.max(by)))
    }
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub panels: [Panel; ROWS * COLS],
}

impl Figure {
    pub fn build(datasets: &[Dataset]) -> Self {
        let mut panels = PanelKind::ALL.map(Panel::new);

        for (i, dataset) in datasets.iter().enumerate() {
            let color = dataset_color(i);
            for panel in panels.iter_mut() {
                for &column in panel.kind.columns(dataset) {
                    let Some(data) = dataset.column(column) else {
                        continue;
                    };
                    panel.series.push(PlotSeries {
                        label: format!("{} - {}", dataset.label, column.name()),
                        data,
                        marks: Marks::Line { color },
                    });
                }
            }
        }

        if let [a, b] = datasets {
            panels[PanelKind::PowerDifference.index()]
                .series
                .push(power_difference(a, b));
        }

        Self { panels }
    }

    pub fn panel(&self, kind: PanelKind) -> &Panel {
        &self.panels[kind.index()]
    }
}

/// Index-aligned `a - b` of total power in kW, truncated to the shorter dataset.
fn power_difference(a: &Dataset, b: &Dataset) -> PlotSeries {
    let (points, signs): (Vec<_>, Vec<_>) = a
        .records()
        .iter()
        .zip(b.records())
        .map(|(ra, rb)| {
            let diff = (ra.total_power_consumption - rb.total_power_consumption).get::<kilowatt>();
            let sign = DiffSign::between(ra.total_power_consumption, rb.total_power_consumption);
            ((ra.time, diff), sign)
        })
        .unzip();
    let (time, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();

    PlotSeries {
        label: format!("{} - {}", a.label, b.label),
        data: TimeSeries::new(time.into_iter().collect(), values.into_iter().collect()),
        marks: Marks::Scatter { signs },
    }
}
