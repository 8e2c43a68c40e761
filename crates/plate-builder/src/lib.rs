//! Build orchestration for parametric weight plates.
//!
//! [`PlateBuilder`] drives a [`cad_backend::CadBackend`] through five fixed
//! stages (blank, bore, recess, fillet, finalize) and guarantees the CAD
//! document is closed on every exit path once the session is attached.

pub mod builder;
pub mod config;
pub mod errors;
pub mod naming;
pub mod session;
pub mod state;

pub use builder::{BuildReport, PlateBuilder};
pub use config::BuildConfig;
pub use errors::{BuildError, ConfigError};
pub use naming::output_file_name;
pub use session::CadSession;
pub use state::{BuildState, BuildTrace, EdgeTreatment, Stage};
