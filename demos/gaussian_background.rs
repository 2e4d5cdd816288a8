//! Fit a Gaussian peak on a quadratic background and print the report and a
//! terminal plot.
//!
//! Run with `cargo run --example gaussian_background`.

use fit_curves::plot::render_ascii_plot;
use fit_curves::report::format_fit_report;
use fit_curves::{FitOptions, FnModel, ModelKind, fit};

const X: [f64; 25] = [
    4.2105303, 5.2631601, 6.2405997, 7.5187997, 8.7218, 9.7744402, 10.676691, 11.65414, 12.63158, 13.83459,
    14.887219, 16.015039, 17.06767, 18.270679, 19.24812, 20.300751, 21.50376, 23.157888, 25.789471, 28.345871,
    30.601501, 33.458643, 39.022559, 46.015039, 48.270679,
];

const Y: [f64; 25] = [
    0.18942001, 0.2099, 0.23891001, 0.27816002, 0.31911, 0.35836001, 0.39932001, 0.43686003, 0.46416002, 0.49829001,
    0.51536004, 0.52556, 0.51876995, 0.5, 0.47271, 0.44026, 0.39249001, 0.33106002, 0.24060, 0.17746, 0.13311001,
    0.11262, 0.095566, 0.095566, 0.095566,
];

fn main() -> fit_curves::Result<()> {
    // N, mu, sigma, a, b, c
    let peak_on_background = FnModel::new("gaus+pol2", 6, |p: &[f64], x: f64| {
        p[0] * (-0.5 * ((x - p[1]) / p[2]).powi(2)).exp() + p[3] * x * x + p[4] * x + p[5]
    });

    let opts = FitOptions::default().with_default_pars(vec![0.45, 16.0, 7.0, 0.0, 0.0, 0.08]);
    let result = fit(&peak_on_background, &X, &Y, &opts)?;
    println!("{}", format_fit_report(&result));
    println!("{}", render_ascii_plot(&X, &Y, &result.curve, 72, 20));

    // The plain Gaussian with estimated starting parameters, for comparison.
    let plain = fit(&ModelKind::Gaus, &X, &Y, &FitOptions::default())?;
    println!("{}", format_fit_report(&plain));

    Ok(())
}
