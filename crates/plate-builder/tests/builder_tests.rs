use cad_backend::{BasePlane, CadCall, CadOp, CutSpec, Direction, EdgeSelection, MockCad, TruckCad};
use chrono::{NaiveDate, NaiveDateTime};
use plate_builder::{
    BuildConfig, BuildError, BuildState, ConfigError, EdgeTreatment, PlateBuilder, Stage,
};
use std::sync::{Arc, Mutex};

use plate_params::{ParameterId, ParameterSet};
use tempfile::TempDir;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_milli_opt(8, 5, 30, 42))
        .unwrap()
}

fn builder(out: &TempDir) -> PlateBuilder {
    PlateBuilder::new(BuildConfig::default().with_output_dir(out.path()))
        .unwrap()
        .with_clock(fixed_time)
}

fn baseline() -> ParameterSet {
    ParameterSet::from_values(200.0, 20.0, 30.0, 5.0, 50.0, 5.0)
}

fn cuts(cad: &MockCad) -> Vec<(BasePlane, f64, CutSpec)> {
    let mut planes = std::collections::HashMap::new();
    let mut cuts = Vec::new();
    for call in cad.calls() {
        match call {
            CadCall::CreateSketch { id, plane } => {
                planes.insert(*id, *plane);
            }
            CadCall::CutExtrude { sketch, spec } => {
                let plane = planes[sketch];
                cuts.push((plane.base, plane.offset, *spec));
            }
            _ => {}
        }
    }
    cuts
}

fn circle_radii(cad: &MockCad) -> Vec<f64> {
    cad.calls()
        .iter()
        .filter_map(|call| match call {
            CadCall::DrawCircle { radius, .. } => Some(*radius),
            _ => None,
        })
        .collect()
}

#[test]
fn test_successful_build_runs_every_stage_once_in_order() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();

    let report = builder(&out).build(&baseline(), &mut cad).unwrap();

    let stages: Vec<Stage> = report.stage_timings.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, Stage::ORDER);
    assert!(report.trace.is_complete());
    assert_eq!(report.trace.current(), BuildState::Closed);

    assert_eq!(
        cad.ops(),
        vec![
            CadOp::Attach,
            CadOp::CreateDocument,
            // blank
            CadOp::CreateSketch,
            CadOp::DrawCircle,
            CadOp::FinishSketch,
            CadOp::BossExtrude,
            // bore
            CadOp::CreateSketch,
            CadOp::DrawCircle,
            CadOp::FinishSketch,
            CadOp::CutExtrude,
            // recess, both faces
            CadOp::CreateSketch,
            CadOp::DrawCircle,
            CadOp::FinishSketch,
            CadOp::CutExtrude,
            CadOp::CreateSketch,
            CadOp::DrawCircle,
            CadOp::FinishSketch,
            CadOp::CutExtrude,
            CadOp::Fillet,
            CadOp::SaveAs,
            CadOp::CloseDocument,
        ]
    );
    assert_eq!(cad.close_count(), 1);
}

#[test]
fn test_sketch_radii_follow_parameters() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    builder(&out).build(&baseline(), &mut cad).unwrap();

    // D/2, d/2, then L on both faces
    assert_eq!(circle_radii(&cad), vec![100.0, 15.0, 50.0, 50.0]);
    assert!(cad.calls().contains(&CadCall::Fillet {
        radius: 5.0,
        edges: EdgeSelection::All,
    }));
}

#[test]
fn test_blank_is_extruded_by_thickness_along_plane_normal() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    builder(&out).build(&baseline(), &mut cad).unwrap();

    let boss = cad
        .calls()
        .iter()
        .find_map(|call| match call {
            CadCall::BossExtrude { axis, length, .. } => Some((*axis, *length)),
            _ => None,
        })
        .unwrap();
    assert_eq!(boss, (BasePlane::Xy.normal_axis(), 20.0));
}

#[test]
fn test_bore_cuts_through_all_with_margin() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    builder(&out).build(&baseline(), &mut cad).unwrap();

    let (plane, offset, spec) = cuts(&cad)[0];
    assert_eq!(plane, BasePlane::Xy);
    assert_eq!(offset, 0.0);
    assert!(spec.through_all);
    assert_eq!(spec.direction, Direction::Forward);
    assert!((spec.depth - 24.0).abs() < 1e-9);
}

#[test]
fn test_through_all_factor_comes_from_config() {
    let out = TempDir::new().unwrap();
    let mut config = BuildConfig::default().with_output_dir(out.path());
    config.through_all_factor = 2.0;
    let mut cad = MockCad::new();
    PlateBuilder::new(config)
        .unwrap()
        .build(&baseline(), &mut cad)
        .unwrap();

    assert_eq!(cuts(&cad)[0].2.depth, 40.0);
}

#[test]
fn test_builder_rejects_factor_that_would_not_cut_through() {
    for factor in [1.0, 0.5, f64::NAN] {
        let mut config = BuildConfig::default();
        config.through_all_factor = factor;
        let err = PlateBuilder::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{factor}: {err}");
    }
}

#[test]
fn test_recess_is_symmetric_on_both_faces() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let params = ParameterSet::from_values(450.0, 45.0, 28.0, 5.0, 120.0, 15.0);
    builder(&out).build(&params, &mut cad).unwrap();

    let recess = &cuts(&cad)[1..];
    assert_eq!(recess.len(), 2);
    let (bottom, top) = (recess[0], recess[1]);

    assert_eq!(bottom.1, 0.0);
    assert_eq!(top.1, 45.0);
    assert_eq!(bottom.2, CutSpec::blind(15.0, Direction::Forward));
    assert_eq!(top.2, CutSpec::blind(15.0, Direction::Reverse));

    let radii = circle_radii(&cad);
    assert_eq!(radii[2], 120.0);
    assert_eq!(radii[3], 120.0);
}

#[test]
fn test_output_file_is_saved_under_configured_dir() {
    let out = TempDir::new().unwrap();
    let nested = out.path().join("plates").join("models");
    let builder = PlateBuilder::new(BuildConfig::default().with_output_dir(&nested))
        .unwrap()
        .with_clock(fixed_time);
    let mut cad = MockCad::new();

    let report = builder.build(&baseline(), &mut cad).unwrap();

    assert!(nested.is_dir());
    assert_eq!(
        report.output_path,
        nested.join("WeightPlate_D200_T20_d30_R5_L50_G5_20240309_080530_042.step")
    );
    assert_eq!(cad.saved_paths(), [report.output_path.clone()]);
    assert!(report.output_path.is_file());
}

#[test]
fn test_non_positive_fillet_radius_skips_edge_treatment() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let mut params = baseline();
    params.set_chamfer_radius(0.0);

    let report = builder(&out).build(&params, &mut cad).unwrap();

    assert_eq!(cad.count(CadOp::Fillet), 0);
    assert_eq!(report.edges, EdgeTreatment::Skipped);
    assert!(report.trace.states().contains(&BuildState::Filleted));
    assert!(report.trace.is_complete());
}

#[test]
fn test_fillet_applied_when_backend_supports_it() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let report = builder(&out).build(&baseline(), &mut cad).unwrap();
    assert_eq!(report.edges, EdgeTreatment::Filleted);
}

#[test]
fn test_unsupported_fillet_leaves_edges_sharp_and_saves() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new().without_fillet();

    let report = builder(&out).build(&baseline(), &mut cad).unwrap();

    assert_eq!(report.edges, EdgeTreatment::Unsupported);
    assert_eq!(cad.count(CadOp::Fillet), 1);
    assert_eq!(cad.count(CadOp::SaveAs), 1);
    assert!(report.trace.is_complete());
    assert!(report.output_path.is_file());
}

#[test]
fn test_close_runs_exactly_once_whatever_fails() {
    let failing = [
        (CadOp::CreateDocument, 1, Stage::Blank),
        (CadOp::BossExtrude, 1, Stage::Blank),
        (CadOp::CutExtrude, 1, Stage::Bore),
        (CadOp::CutExtrude, 2, Stage::Recess),
        (CadOp::CutExtrude, 3, Stage::Recess),
        (CadOp::DrawCircle, 3, Stage::Recess),
        (CadOp::Fillet, 1, Stage::Fillet),
        (CadOp::SaveAs, 1, Stage::Finalize),
    ];
    for (op, nth, stage) in failing {
        let out = TempDir::new().unwrap();
        let mut cad = MockCad::new().fail_on(op, nth);

        let err = builder(&out).build(&baseline(), &mut cad).unwrap_err();

        assert!(
            matches!(err, BuildError::Backend { stage: s, .. } if s == stage),
            "{op:?} #{nth}: {err}"
        );
        assert_eq!(cad.close_count(), 1, "{op:?} #{nth}");
        assert_eq!(cad.ops().last(), Some(&CadOp::CloseDocument), "{op:?} #{nth}");
    }
}

#[test]
fn test_failure_stops_remaining_stages() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new().fail_on(CadOp::CutExtrude, 1);

    builder(&out).build(&baseline(), &mut cad).unwrap_err();

    assert_eq!(cad.count(CadOp::CutExtrude), 1);
    assert_eq!(cad.count(CadOp::Fillet), 0);
    assert_eq!(cad.count(CadOp::SaveAs), 0);
}

#[test]
fn test_failed_attach_does_not_close() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new().fail_on(CadOp::Attach, 1);

    let err = builder(&out).build(&baseline(), &mut cad).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Blank));
    assert_eq!(cad.close_count(), 0);
    assert_eq!(cad.ops(), vec![CadOp::Attach]);
}

#[test]
fn test_stage_error_wins_over_close_error() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new()
        .fail_on(CadOp::Fillet, 1)
        .fail_on(CadOp::CloseDocument, 1);

    let err = builder(&out).build(&baseline(), &mut cad).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Fillet));
    assert_eq!(cad.close_count(), 1);
}

#[test]
fn test_close_failure_after_save_is_cleanup_error() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new().fail_on(CadOp::CloseDocument, 1);

    let err = builder(&out).build(&baseline(), &mut cad).unwrap_err();

    assert!(matches!(err, BuildError::Cleanup { .. }));
    assert_eq!(cad.saved_paths().len(), 1);
    assert_eq!(cad.close_count(), 1);
}

#[test]
fn test_recess_depth_is_rechecked_before_cutting() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let mut params = baseline();
    params.set_recess_depth(25.0);

    let err = builder(&out).build(&params, &mut cad).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Precondition {
            stage: Stage::Recess,
            ..
        }
    ));
    // blank and bore ran, nothing of the recess did
    assert_eq!(cad.count(CadOp::CutExtrude), 1);
    assert_eq!(cad.count(CadOp::CreateSketch), 2);
    assert_eq!(cad.close_count(), 1);
}

#[test]
fn test_unwritable_output_dir_still_closes() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("occupied");
    std::fs::write(&blocker, "not a directory").unwrap();
    let builder =
        PlateBuilder::new(BuildConfig::default().with_output_dir(blocker.join("models"))).unwrap();
    let mut cad = MockCad::new();

    let err = builder.build(&baseline(), &mut cad).unwrap_err();

    assert!(matches!(err, BuildError::OutputDir { .. }));
    assert_eq!(cad.count(CadOp::SaveAs), 0);
    assert_eq!(cad.close_count(), 1);
}

#[test]
fn test_checked_build_rejects_invalid_parameters_without_touching_backend() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let mut params = baseline();
    params.set_thickness(30.0);

    let err = builder(&out).build_checked(&params, &mut cad).unwrap_err();

    match err {
        BuildError::Validation(report) => {
            let implicated = report.implicated();
            assert!(implicated.contains(&ParameterId::Thickness));
            assert!(implicated.contains(&ParameterId::OuterDiameter));
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert!(cad.calls().is_empty());
}

#[test]
fn test_checked_build_of_valid_parameters_succeeds() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();

    let report = builder(&out).build_checked(&baseline(), &mut cad).unwrap();

    assert!(report.output_path.starts_with(out.path()));
}

#[test]
fn test_every_preset_builds() {
    for preset in plate_params::presets::all() {
        let Some(params) = preset.parameters() else {
            continue;
        };
        let out = TempDir::new().unwrap();
        let mut cad = MockCad::new();
        builder(&out)
            .build_checked(params, &mut cad)
            .unwrap_or_else(|e| panic!("{preset}: {e}"));
        assert_eq!(cad.close_count(), 1);
    }
}

#[test]
fn test_builds_get_distinct_ids() {
    let out = TempDir::new().unwrap();
    let builder = builder(&out);
    let mut cad = MockCad::new();
    let first = builder.build(&baseline(), &mut cad).unwrap();
    let second = builder.build(&baseline(), &mut cad).unwrap();
    assert_ne!(first.build_id, second.build_id);
    assert_eq!(cad.close_count(), 2);
}

#[test]
fn test_truck_build_of_average_plate_writes_step() {
    let out = TempDir::new().unwrap();
    let mut cad = TruckCad::new();
    let params = ParameterSet::from_values(450.0, 45.0, 50.0, 3.0, 150.0, 15.0);

    let report = builder(&out).build_checked(&params, &mut cad).unwrap();

    assert_eq!(report.edges, EdgeTreatment::Unsupported);
    assert!(report.trace.is_complete());
    let text = std::fs::read_to_string(&report.output_path).unwrap();
    assert!(text.contains("ISO-10303-21"));
    assert!(!cad.has_body(), "document closed after the build");
}

/// Records the name and field names of every span opened.
#[derive(Clone, Default)]
struct SpanFields(Arc<Mutex<Vec<(String, Vec<String>)>>>);

impl<S: tracing::Subscriber> Layer<S> for SpanFields {
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: Context<'_, S>,
    ) {
        let meta = attrs.metadata();
        let names = meta.fields().iter().map(|f| f.name().to_string()).collect();
        self.0.lock().unwrap().push((meta.name().to_string(), names));
    }
}

#[test]
fn test_build_span_names_its_fields_in_full() {
    let out = TempDir::new().unwrap();
    let mut cad = MockCad::new();
    let spans = SpanFields::default();
    let subscriber = tracing_subscriber::registry().with(spans.clone());

    tracing::subscriber::with_default(subscriber, || {
        builder(&out).build(&baseline(), &mut cad).unwrap();
    });

    let recorded = spans.0.lock().unwrap();
    let (_, fields) = recorded
        .iter()
        .find(|(name, _)| name == "plate_build")
        .unwrap();
    assert_eq!(fields, &["build_id", "outer_diameter", "thickness"]);
}
