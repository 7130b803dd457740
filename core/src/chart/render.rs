use std::path::Path;

use plotters::{
    coord::Shift,
    prelude::{
        BitMapBackend, ChartBuilder, Circle, DrawingArea, DrawingAreaErrorKind, DrawingBackend,
        IntoDrawingArea, PathElement, SeriesLabelPosition,
    },
    series::LineSeries,
    style::{Color, BLACK, WHITE},
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{Figure, Marks, Panel, COLS, ROWS};
use crate::common::range::Range;

pub const DEFAULT_SIZE: (u32, u32) = (1200, 800);

const LINE_ALPHA: f64 = 0.7;
const SCATTER_RADIUS: i32 = 2;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Drawing error: {0}")]
    Draw(String),
    #[error("Image size {0}x{1} is too small for the chart grid")]
    TooSmall(u32, u32),
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Draw(err.to_string())
}

/// Draws the whole figure onto `root`, one panel per grid cell.
pub fn draw_figure<DB: DrawingBackend>(
    figure: &Figure,
    root: &DrawingArea<DB, Shift>,
) -> Result<(), Error> {
    root.fill(&WHITE).map_err(draw_err)?;

    let cells = root.split_evenly((ROWS, COLS));
    for (panel, cell) in figure.panels.iter().zip(cells.iter()) {
        draw_panel(panel, cell)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    panel: &Panel,
    area: &DrawingArea<DB, Shift>,
) -> Result<(), Error> {
    let (x_range, y_range) = match panel.bounds() {
        Some((x, y)) => (x.widen_degenerate(), y.widen_degenerate().pad(0.05)),
        None => (Range::new(0.0, 1.0), Range::new(0.0, 1.0)),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title(), ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range.into_range(), y_range.into_range())
        .map_err(draw_err)?;

    chart.configure_mesh().draw().map_err(draw_err)?;

    for series in &panel.series {
        match &series.marks {
            Marks::Line { color } => {
                let color = *color;
                chart
                    .draw_series(LineSeries::new(
                        series.data.iter(),
                        color.mix(LINE_ALPHA).stroke_width(1),
                    ))
                    .map_err(draw_err)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }
            Marks::Scatter { signs } => {
                let legend_color = signs.first().map(|s| s.color()).unwrap_or(BLACK);
                chart
                    .draw_series(series.data.iter().zip(signs.iter()).map(|(point, sign)| {
                        Circle::new(point, SCATTER_RADIUS, sign.color().filled())
                    }))
                    .map_err(draw_err)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| {
                        Circle::new((x + 10, y), SCATTER_RADIUS + 1, legend_color.filled())
                    });
            }
        }
    }

    if panel.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;
    }

    debug!("Drew panel {:?} with {} series", panel.kind, panel.series.len());
    Ok(())
}

fn check_size((width, height): (u32, u32)) -> Result<(), Error> {
    // Below this the label areas alone don't fit into a cell
    if width < 100 * COLS as u32 || height < 100 * ROWS as u32 {
        return Err(Error::TooSmall(width, height));
    }
    Ok(())
}

#[instrument(skip(figure))]
pub fn render_png(figure: &Figure, path: &Path, size: (u32, u32)) -> Result<(), Error> {
    check_size(size)?;
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_figure(figure, &root)?;
    info!("Wrote chart to {:?}", path);
    Ok(())
}

/// Renders into a tightly packed RGB8 buffer of `width * height * 3` bytes.
pub fn render_rgb(figure: &Figure, size: (u32, u32)) -> Result<Vec<u8>, Error> {
    check_size(size)?;
    let mut buf = vec![0u8; size.0 as usize * size.1 as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
        draw_figure(figure, &root)?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use uom::si::{f64::Power, power::watt};

    use super::*;
    use crate::{
        dataset::Dataset,
        formats::telemetry::{tests::record, RecordLayout},
    };

    fn dataset(label: &str, count: u64, offset: f64) -> Dataset {
        let records = (0..count)
            .map(|i| {
                let mut r = record(i, RecordLayout::WithFpga);
                r.total_power_consumption = Power::new::<watt>(1000.0 * i as f64 + offset);
                r
            })
            .collect();
        Dataset::new(label.to_string(), label.into(), RecordLayout::WithFpga, records).unwrap()
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn renders_comparison() {
        let figure = Figure::build(&[dataset("a.bin", 20, 0.0), dataset("b.bin", 15, 500.0)]);
        let buf = render_rgb(&figure, (600, 450)).unwrap();
        assert_eq!(buf.len(), 600 * 450 * 3);
        // Background is filled
        assert!(buf.iter().any(|&b| b == 255));
        // Something other than the background was drawn
        assert!(buf.iter().any(|&b| b != 255));
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn renders_empty_and_single_point() {
        render_rgb(&Figure::build(&[]), (400, 300)).unwrap();
        render_rgb(&Figure::build(&[dataset("a.bin", 1, 0.0)]), (400, 300)).unwrap();
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        render_png(&Figure::build(&[dataset("a.bin", 5, 0.0)]), &path, DEFAULT_SIZE).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn rejects_tiny_images() {
        assert!(matches!(
            render_rgb(&Figure::build(&[]), (10, 10)),
            Err(Error::TooSmall(10, 10))
        ));
    }
}
