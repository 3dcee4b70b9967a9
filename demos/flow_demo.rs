//! Example animating a synthetic river network onto a text surface.
//!
//! Loads a few meandering rivers through an in-memory provider, animates
//! them for one second, switches month, then pans away while a slow load is
//! still in flight.
//!
//! Run with: RUST_LOG=debug cargo run --example flow_demo

use riverflow::prelude::*;
use riverflow::{LoadStatus, MonthlySummary};
use tokio_util::sync::CancellationToken;

/// Coarse character grid that keeps the most recent strokes visible.
struct TextSurface {
    width: u32,
    height: u32,
    cells: Vec<f64>,
}

impl TextSurface {
    const COLS: usize = 60;
    const ROWS: usize = 20;

    fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: vec![0.0; Self::COLS * Self::ROWS],
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in self.cells.chunks(Self::COLS) {
            for &alpha in row {
                out.push(match alpha {
                    a if a > 0.6 => '#',
                    a if a > 0.3 => '+',
                    a if a > 0.05 => '.',
                    _ => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl Surface for TextSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0.0);
    }

    fn fade(&mut self, alpha: f64) {
        self.cells.iter_mut().for_each(|c| *c *= alpha);
    }

    fn stroke(&mut self, segment: &Segment) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let col = (segment.to.x() / f64::from(self.width) * Self::COLS as f64) as usize;
        let row = (segment.to.y() / f64::from(self.height) * Self::ROWS as f64) as usize;
        if col < Self::COLS && row < Self::ROWS {
            self.cells[row * Self::COLS + col] = 1.0;
        }
    }
}

/// Three east-flowing rivers with a spring flood peak, in map coordinates.
fn rivers() -> Vec<FlowRecord> {
    let mut records = Vec::new();
    for (r, base) in [(0, 2_000.0), (1, 400.0), (2, 90.0)] {
        let center = 150.0 + f64::from(r) * 250.0;
        for i in 0..250 {
            let x = f64::from(i) * 4.0;
            let y = center + 40.0 * (x / 120.0).sin();
            let slope = 40.0 / 120.0 * (x / 120.0).cos();
            let azimuth = 90.0 + slope.atan().to_degrees();
            let flows: [f64; 12] = std::array::from_fn(|m| {
                let season = 1.0 + (std::f64::consts::PI * (m as f64 - 1.0) / 6.0).sin();
                base * season.max(0.2)
            });
            records.push(
                FlowRecord::new(x, 800.0 - y)
                    .with_flows(azimuth, flows)
                    .with("V", base)
                    .with("D", 1.0),
            );
        }
    }
    records
}

fn level(zoom: u8) -> Level {
    Level {
        zoom,
        buffer: 5.0,
        hash_size: 20.0,
        search_radius: 12.0,
        polyline_count: 300,
        segment_length: 6.0,
        segment_count_min: 5,
        segment_count_max: 40,
        url: "memory://rivers".to_string(),
    }
}

async fn animate_for(engine: &SharedEngine, surface: &mut TextSurface, duration: Duration) -> u64 {
    let shutdown = CancellationToken::new();
    let (frames, ()) = tokio::join!(engine.animate(surface, shutdown.clone()), async {
        tokio::time::sleep(duration).await;
        shutdown.cancel();
    });
    frames
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== River Flow Demo ===\n");

    let config = Config::default()
        .with_level(level(5))
        .with_level(level(6))
        .with_display(DisplayMode::Flow);
    let engine = SharedEngine::new(
        EngineBuilder::new()
            .config(config)
            .viewport(Viewport::pixels(1000, 800))
            .zoom(5)
            .build()?,
    );
    let provider = MemoryProvider::new(rivers());

    println!("1. Loading rivers");
    let status = engine.load(&provider).await;
    let stats = engine.stats();
    println!("   {:?}: {} samples in {} cells", status, stats.samples, stats.cells);
    println!("   {} streamlines\n", stats.streamlines);

    let summary = engine.lock().summary();
    if let Some(summary) = summary {
        print_summary(&summary);
    }

    println!("2. Animating {} for one second", engine.stats().month.name());
    let mut surface = TextSurface::new();
    let frames = animate_for(&engine, &mut surface, Duration::from_secs(1)).await;
    println!("   {} frames\n{}", frames, surface.render());

    let may = Month::new(5).ok_or(FlowError::InvalidMonth(5))?;
    println!("3. Switching to {}", may.name());
    let report = engine.set_month(may).await;
    println!(
        "   {} streamlines after {} seeds ({} dead)",
        report.pool_size, report.attempts, report.dead_seeds
    );
    animate_for(&engine, &mut surface, Duration::from_millis(500)).await;
    println!("{}", surface.render());

    println!("4. Panning while a slow load is in flight");
    let slow = MemoryProvider::new(rivers()).with_latency(Duration::from_secs(2));
    let (first, ()) = tokio::join!(engine.load(&slow), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.reset();
    });
    println!("   Interrupted load: {:?}", first);
    let status = engine
        .pan(Viewport::new(0.0, 0.0, 500.0, 400.0, 1000, 800), 6, &provider)
        .await;
    let stats = engine.stats();
    println!(
        "   New view: {:?}, {} samples, {} streamlines",
        status, stats.samples, stats.streamlines
    );
    assert!(matches!(status, LoadStatus::Loaded { .. }));

    println!("\nDemo completed after {} frames", engine.stats().frames);
    Ok(())
}

fn print_summary(summary: &MonthlySummary) {
    println!("   Monthly means over {} samples:", summary.samples);
    for month in Month::all() {
        let percent = summary
            .percent_of_average(month)
            .map(|p| format!("{:.0}% of average", p))
            .unwrap_or_default();
        println!(
            "   {:>9}: {:>8.1} m3/s {}",
            month.name(),
            summary.mean_flow(month),
            percent
        );
    }
    println!();
}
