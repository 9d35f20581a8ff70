use efield_core::{ChargeSnapshot, DipoleArrayConfig, PointChargeSource, VisualizationConfig};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Compute one frame. `charges_json` is a list of
/// `{"position": [x, y], "charge": q, "exclusion_radius": r}`; `config_json`
/// may be any subset of the visualization config. Returns render data JSON.
#[pyfunction]
fn compute_frame_json(config_json: &str, charges_json: &str) -> PyResult<String> {
    let config: VisualizationConfig = serde_json::from_str(config_json).map_err(value_error)?;
    let sources: Vec<PointChargeSource> =
        serde_json::from_str(charges_json).map_err(value_error)?;
    let snapshot = ChargeSnapshot::from_sources(sources).map_err(value_error)?;
    let frame = efield_core::compute_frame(&snapshot, &config).map_err(value_error)?;
    serde_json::to_string(&frame).map_err(value_error)
}

/// Charge list for a dipole array, as JSON.
#[pyfunction]
fn regenerate_dipole_json(config_json: &str) -> PyResult<String> {
    let config: DipoleArrayConfig = serde_json::from_str(config_json).map_err(value_error)?;
    let sources = efield_core::regenerate(&config).map_err(value_error)?;
    serde_json::to_string(&sources).map_err(value_error)
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(compute_frame_json, m)?)?;
    m.add_function(wrap_pyfunction!(regenerate_dipole_json, m)?)?;
    Ok(())
}
