use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use cad_backend::{
    BasePlane, CadBackend, CadError, CutSpec, Direction, EdgeSelection, SketchId, SketchPlane,
};
use chrono::NaiveDateTime;
use plate_params::{format_mm, validate_all, ParameterSet};
use uuid::Uuid;

use crate::config::BuildConfig;
use crate::errors::{BuildError, ConfigError};
use crate::naming::output_file_name;
use crate::session::CadSession;
use crate::state::{BuildState, BuildTrace, EdgeTreatment, Stage};

/// The blank is extruded along +Z from this plane.
const BASE_PLANE: BasePlane = BasePlane::Xy;

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub output_path: PathBuf,
    pub trace: BuildTrace,
    pub edges: EdgeTreatment,
    /// Wall time of each completed stage, in execution order.
    pub stage_timings: Vec<(Stage, Duration)>,
}

impl BuildReport {
    pub fn total_time(&self) -> Duration {
        self.stage_timings.iter().map(|(_, elapsed)| *elapsed).sum()
    }
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Runs the blank, bore, recess, fillet and finalize stages against a CAD
/// backend.
pub struct PlateBuilder {
    config: BuildConfig,
    clock: Clock,
}

impl fmt::Debug for PlateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlateBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PlateBuilder {
    /// Fails if `config` does not pass [`BuildConfig::validate`].
    pub fn new(config: BuildConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Box::new(|| chrono::Local::now().naive_local()),
        })
    }

    /// Replace the timestamp source used for output file names.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Validate, then build. Invalid parameters never reach the backend.
    pub fn build_checked(
        &self,
        params: &ParameterSet,
        cad: &mut dyn CadBackend,
    ) -> Result<BuildReport, BuildError> {
        validate_all(params)
            .into_result()
            .map_err(BuildError::Validation)?;
        self.build(params, cad)
    }

    /// Build a plate and save it under the configured output directory.
    ///
    /// Once the backend is attached the document is closed exactly once,
    /// whether or not the stages succeed. A stage failure takes precedence
    /// over a failure to close.
    pub fn build(
        &self,
        params: &ParameterSet,
        cad: &mut dyn CadBackend,
    ) -> Result<BuildReport, BuildError> {
        let build_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "plate_build",
            %build_id,
            outer_diameter = params.outer_diameter(),
            thickness = params.thickness(),
        );
        let _enter = span.enter();

        let mut progress = Progress::new();
        let mut session = CadSession::attach(cad).map_err(|source| BuildError::Backend {
            stage: Stage::Blank,
            source,
        })?;
        progress.reach(BuildState::Attached);

        let outcome = self.run_stages(&mut *session, params, &mut progress);
        let closed = session.close();
        progress.reach(BuildState::Closed);

        match (outcome, closed) {
            (Ok((output_path, edges)), Ok(())) => {
                tracing::info!(path = %output_path.display(), ?edges, "plate saved");
                Ok(BuildReport {
                    build_id,
                    output_path,
                    trace: progress.trace,
                    edges,
                    stage_timings: progress.timings,
                })
            }
            (Ok(_), Err(source)) => {
                tracing::warn!(error = %source, "plate saved but the document did not close");
                Err(BuildError::Cleanup { source })
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "failed to close CAD document after a failed build");
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        cad: &mut dyn CadBackend,
        params: &ParameterSet,
        progress: &mut Progress,
    ) -> Result<(PathBuf, EdgeTreatment), BuildError> {
        progress.time(Stage::Blank, |p| blank(cad, params, p))?;

        let bore_depth = params.thickness() * self.config.through_all_factor;
        progress.time(Stage::Bore, |p| bore(cad, params, bore_depth, p))?;

        check_recess_depth(params)?;
        progress.time(Stage::Recess, |p| recess(cad, params, p))?;

        let edges = progress.time(Stage::Fillet, |p| fillet(cad, params, p))?;

        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).map_err(|source| BuildError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(output_file_name(
            params,
            (self.clock)(),
            &self.config.file_extension,
        ));
        progress.time(Stage::Finalize, |p| {
            cad.save_as(&path)?;
            p.reach(BuildState::Saved);
            Ok(())
        })?;
        Ok((path, edges))
    }
}

struct Progress {
    trace: BuildTrace,
    timings: Vec<(Stage, Duration)>,
}

impl Progress {
    fn new() -> Self {
        Self {
            trace: BuildTrace::new(),
            timings: Vec::with_capacity(Stage::ORDER.len()),
        }
    }

    fn reach(&mut self, state: BuildState) {
        let moved = self.trace.advance(state);
        debug_assert!(moved, "illegal transition {:?} -> {state:?}", self.trace.current());
    }

    fn time<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce(&mut Self) -> Result<T, CadError>,
    ) -> Result<T, BuildError> {
        tracing::debug!(%stage, "stage start");
        let started = Instant::now();
        let value = f(self).map_err(|source| BuildError::Backend { stage, source })?;
        self.timings.push((stage, started.elapsed()));
        Ok(value)
    }
}

fn circle_sketch(
    cad: &mut dyn CadBackend,
    plane: SketchPlane,
    radius: f64,
) -> Result<SketchId, CadError> {
    let sketch = cad.create_sketch(plane)?;
    cad.draw_circle(sketch, [0.0, 0.0], radius)?;
    cad.finish_sketch(sketch)?;
    Ok(sketch)
}

fn blank(cad: &mut dyn CadBackend, params: &ParameterSet, p: &mut Progress) -> Result<(), CadError> {
    cad.create_document()?;
    p.reach(BuildState::DocumentCreated);

    let sketch = circle_sketch(
        cad,
        SketchPlane::base(BASE_PLANE),
        params.outer_diameter() / 2.0,
    )?;
    cad.boss_extrude(sketch, BASE_PLANE.normal_axis(), params.thickness())?;
    p.reach(BuildState::BlankBuilt);
    Ok(())
}

fn bore(
    cad: &mut dyn CadBackend,
    params: &ParameterSet,
    depth: f64,
    p: &mut Progress,
) -> Result<(), CadError> {
    let sketch = circle_sketch(
        cad,
        SketchPlane::base(BASE_PLANE),
        params.hole_diameter() / 2.0,
    )?;
    cad.cut_extrude(sketch, CutSpec::through_all(depth, Direction::Forward))?;
    p.reach(BuildState::BoreCut);
    Ok(())
}

fn check_recess_depth(params: &ParameterSet) -> Result<(), BuildError> {
    let (depth, thickness) = (params.recess_depth(), params.thickness());
    let within = depth > 0.0 && depth < thickness;
    if within {
        return Ok(());
    }
    Err(BuildError::Precondition {
        stage: Stage::Recess,
        reason: format!(
            "recess depth G={} must satisfy 0 < G < T={}",
            format_mm(depth),
            format_mm(thickness)
        ),
    })
}

/// Same radius and depth on both faces: forward from the base plane, and
/// back from a plane offset by the thickness.
fn recess(cad: &mut dyn CadBackend, params: &ParameterSet, p: &mut Progress) -> Result<(), CadError> {
    let radius = params.recess_radius();
    let depth = params.recess_depth();

    let bottom = circle_sketch(cad, SketchPlane::base(BASE_PLANE), radius)?;
    cad.cut_extrude(bottom, CutSpec::blind(depth, Direction::Forward))?;

    let top = circle_sketch(
        cad,
        SketchPlane::offset(BASE_PLANE, params.thickness()),
        radius,
    )?;
    cad.cut_extrude(top, CutSpec::blind(depth, Direction::Reverse))?;

    p.reach(BuildState::RecessCut);
    Ok(())
}

/// A backend without a fillet operator leaves the edges sharp instead of
/// failing the build; every other fillet error stops it.
fn fillet(
    cad: &mut dyn CadBackend,
    params: &ParameterSet,
    p: &mut Progress,
) -> Result<EdgeTreatment, CadError> {
    let radius = params.chamfer_radius();
    let edges = if radius > 0.0 {
        match cad.fillet(radius, &EdgeSelection::All) {
            Ok(()) => EdgeTreatment::Filleted,
            Err(CadError::NotSupported { operation }) => {
                tracing::warn!(radius, %operation, "backend cannot fillet, edges left sharp");
                EdgeTreatment::Unsupported
            }
            Err(e) => return Err(e),
        }
    } else {
        tracing::debug!(radius, "non-positive fillet radius, edges left sharp");
        EdgeTreatment::Skipped
    };
    p.reach(BuildState::Filleted);
    Ok(edges)
}
