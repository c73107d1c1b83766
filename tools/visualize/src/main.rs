//! Diagnostic visualizer: runs a canned fluvial simulation and writes three
//! PNG debug images to data/debug/. Not part of the main pipeline; no tests.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use massif_core::fields::DRAINAGE_AREA;
use massif_core::metrics::local_relief;
use massif_core::{BoundaryConfig, FluvialConfig, HillslopeConfig, LandscapeModel, RunConfig};

const ROWS: usize = 96;
const COLS: usize = 144;
const STEPS: u64 = 400;

// ── Colour helpers ────────────────────────────────────────────────────────────

/// Normalized elevation → hypsometric ramp: green lowlands, brown uplands,
/// white peaks.
fn hypsometric(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        lerp([70, 140, 60], [150, 110, 60], t / 0.5)
    } else {
        lerp([150, 110, 60], [245, 245, 245], (t - 0.5) / 0.5)
    }
}

/// Normalized log drainage area → white (hilltops) to deep blue (trunks).
fn drainage_blue(t: f32) -> [u8; 3] {
    lerp([255, 255, 255], [20, 60, 180], t.clamp(0.0, 1.0))
}

/// Value in [0, 1] → grayscale.
fn gray(t: f32) -> [u8; 3] {
    let c = (t.clamp(0.0, 1.0) * 255.0) as u8;
    [c, c, c]
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Map node values to [0, 1] over their finite range.
fn normalize(values: &[f64]) -> Vec<f32> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let span = (hi - lo).max(1e-12);
    values
        .iter()
        .map(|&v| if v.is_finite() { ((v - lo) / span) as f32 } else { 0.0 })
        .collect()
}

fn save_png(path: &Path, values: &[f32], color: impl Fn(f32) -> [u8; 3]) {
    let mut img = RgbImage::new(COLS as u32, ROWS as u32);
    for r in 0..ROWS {
        for c in 0..COLS {
            let [red, green, blue] = color(values[r * COLS + c]);
            img.put_pixel(c as u32, r as u32, Rgb([red, green, blue]));
        }
    }
    img.save(path).expect("cannot write PNG");
    println!("wrote {}", path.display());
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let config = RunConfig {
        rows: ROWS,
        cols: COLS,
        spacing: 100.0,
        boundaries: BoundaryConfig::all_open(),
        dt: Some(2000.0),
        uplift_rate: 1e-3,
        hillslope: Some(HillslopeConfig::Linear { diffusivity: 0.05 }),
        fluvial: Some(FluvialConfig {
            erodibility: 2e-5,
            ..FluvialConfig::default()
        }),
        perturbation_amplitude: 1.0,
        seed: 42,
        ..RunConfig::default()
    };

    let mut model = LandscapeModel::new(config).expect("canned config is valid");
    println!("Running {STEPS} steps on a {ROWS}x{COLS} grid…");
    model.run(STEPS).expect("simulation run");

    let out_dir = Path::new("data/debug");
    fs::create_dir_all(out_dir).expect("cannot create data/debug/");

    // 1. Elevation, hypsometric.
    let z = normalize(model.elevation());
    save_png(&out_dir.join("elevation.png"), &z, hypsometric);

    // 2. Drainage area, log-scaled blues.
    let area = model.fields().get(DRAINAGE_AREA).expect("fluvial run");
    let log_area: Vec<f64> = area.iter().map(|&a| a.max(1.0).log10()).collect();
    let t = normalize(&log_area);
    save_png(&out_dir.join("drainage.png"), &t, drainage_blue);

    // 3. Local relief in a 500 m window.
    let relief = local_relief(model.grid(), model.elevation(), 500.0);
    let t = normalize(&relief);
    save_png(&out_dir.join("relief.png"), &t, gray);
}
