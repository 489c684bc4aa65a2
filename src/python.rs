use agroalloc_core::python::planning;
use pyo3::prelude::*;
use pyo3::wrap_pymodule;

#[pymodule]
#[pyo3(name = "_lib")]
fn agroalloc(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_wrapped(wrap_pymodule!(planning))?;
    expose_submodule(m, "planning")?;
    Ok(())
}

/// Make `import agroalloc._lib.<name>` resolve to an already attached submodule.
fn expose_submodule(m: &Bound<'_, PyModule>, name: &str) -> PyResult<()> {
    let submodule = m.getattr(name)?;
    let modules = m.py().import("sys")?.getattr("modules")?;
    modules.set_item(format!("agroalloc._lib.{name}"), submodule)
}
