#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use cdc_viewer_core::{
    chart::{render, Figure},
    dataset::Session,
    formats::telemetry::RecordLayout,
};
use clap::Parser;
use eframe::egui;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dumps were written without the fpga column
    #[arg(long)]
    without_fpga: bool,
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let layout = if args.without_fpga {
        RecordLayout::WithoutFpga
    } else {
        RecordLayout::WithFpga
    };
    info!("Reading dumps as {}", layout);

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(800.0, 600.0)),
        ..Default::default()
    };
    eframe::run_native(
        "Dataset Comparison Tool",
        options,
        Box::new(move |_cc| Box::new(CdcViewerApp::new(layout))),
    )
}

struct CdcViewerApp {
    session: Session,
    chart: Option<ChartWindow>,
}

struct ChartWindow {
    texture: egui::TextureHandle,
    open: bool,
}

impl CdcViewerApp {
    fn new(layout: RecordLayout) -> Self {
        Self {
            session: Session::new(layout),
            chart: None,
        }
    }

    fn load_files(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .set_title("Select Binary Files")
            .add_filter("Binary Files", &["bin"])
            .pick_files()
        else {
            debug!("File dialog cancelled");
            return;
        };

        let report = self.session.load_files(&paths);
        info!(
            "Loaded {} of {} file(s), {} dataset(s) open",
            report.loaded,
            paths.len(),
            self.session.datasets().len()
        );
    }

    fn plot(&mut self, ctx: &egui::Context) {
        if self.session.datasets().is_empty() {
            return;
        }

        let figure = Figure::build(self.session.datasets());
        let (width, height) = render::DEFAULT_SIZE;
        let pixels = match render::render_rgb(&figure, (width, height)) {
            Ok(pixels) => pixels,
            Err(err) => {
                error!("Could not render chart: {}", err);
                return;
            }
        };

        let image = egui::ColorImage::from_rgb([width as usize, height as usize], &pixels);
        let texture = ctx.load_texture("telemetry-chart", image, Default::default());
        self.chart = Some(ChartWindow {
            texture,
            open: true,
        });
    }
}

impl eframe::App for CdcViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if ui.button("Load Binary File(s)").clicked() {
                self.load_files();
            }

            egui::ScrollArea::vertical()
                .max_height(ui.available_height() - 40.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for dataset in self.session.datasets() {
                        ui.label(dataset.path.display().to_string());
                    }
                });

            if ui.button("Plot Data").clicked() {
                self.plot(ctx);
            }
        });

        if let Some(chart) = &mut self.chart {
            let texture = &chart.texture;
            egui::Window::new("Telemetry")
                .open(&mut chart.open)
                .default_size(egui::vec2(900.0, 620.0))
                .show(ctx, |ui| {
                    egui::ScrollArea::both().show(ui, |ui| {
                        ui.image(texture.id(), texture.size_vec2());
                    });
                });
            if !chart.open {
                self.chart = None;
            }
        }
    }
}
