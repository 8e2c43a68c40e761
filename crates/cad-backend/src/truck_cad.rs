//! B-rep CAD backend on the truck crates.
//!
//! Sketch circles become planar disc faces, bosses are translational
//! sweeps, cuts subtract a swept tool from the body, and documents are
//! saved as STEP. truck has no fillet operator, so `fillet` reports
//! [`CadError::NotSupported`] and leaves the body untouched.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

use truck_modeling::builder;
use truck_modeling::topology::{Face, Solid, Wire};
use truck_modeling::{Point3, Rad, Vector3};
use truck_stepio::out;

use crate::traits::CadBackend;
use crate::types::*;

/// Tolerance handed to truck's boolean operations.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Cut tools start this far outside the sketch plane and end this far past
/// the requested depth, so tool and body never share a coplanar face.
const COPLANAR_EPS: f64 = 0.01;

struct TruckSketch {
    plane: SketchPlane,
    circles: Vec<([f64; 2], f64)>,
    finished: bool,
}

#[derive(Default)]
struct TruckDocument {
    sketches: HashMap<u64, TruckSketch>,
    body: Option<Solid>,
}

/// B-rep CAD backend backed by the truck crates.
#[derive(Default)]
pub struct TruckCad {
    attached: bool,
    document: Option<TruckDocument>,
    next_sketch: u64,
}

impl TruckCad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_body(&self) -> bool {
        self.document.as_ref().is_some_and(|d| d.body.is_some())
    }

    /// Vertex extent of the body along a principal axis.
    pub fn body_extent(&self, axis: Axis) -> Option<(f64, f64)> {
        let body = self.document.as_ref()?.body.as_ref()?;
        let k = match axis {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        };
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for shell in body.boundaries() {
            for v in shell.vertex_iter() {
                let p = v.point();
                min = min.min(p[k]);
                max = max.max(p[k]);
            }
        }
        (min <= max).then_some((min, max))
    }

    /// Number of faces on the body's boundary shells.
    pub fn face_count(&self) -> Option<usize> {
        let body = self.document.as_ref()?.body.as_ref()?;
        Some(body.boundaries().iter().map(|shell| shell.face_iter().count()).sum())
    }

    fn document_mut(&mut self) -> Result<&mut TruckDocument, CadError> {
        if !self.attached {
            return Err(CadError::NotAttached);
        }
        self.document.as_mut().ok_or(CadError::NoDocument)
    }

    fn usable_sketch(doc: &TruckDocument, id: SketchId) -> Result<&TruckSketch, CadError> {
        let sketch = doc
            .sketches
            .get(&id.0)
            .ok_or(CadError::SketchNotFound { id })?;
        if !sketch.finished {
            return Err(CadError::SketchNotFinished { id });
        }
        if sketch.circles.is_empty() {
            return Err(CadError::EmptySketch { id });
        }
        Ok(sketch)
    }
}

fn vector(a: [f64; 3]) -> Vector3 {
    Vector3::new(a[0], a[1], a[2])
}

fn point(a: [f64; 3]) -> Point3 {
    Point3::new(a[0], a[1], a[2])
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn failed(operation: &str, reason: impl Into<String>) -> CadError {
    CadError::OperationFailed {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}

/// Planar disc wound counter-clockwise about `normal`, seam at `center + u * radius`.
fn disc_face(center: Point3, u: Vector3, normal: Vector3, radius: f64) -> Result<Face, CadError> {
    let v = builder::vertex(center + u * radius);
    let wire: Wire = builder::rsweep(&v, center, normal, Rad(2.0 * PI));
    builder::try_attach_plane(&[wire])
        .map_err(|e| failed("sketch_profile", format!("failed to create disc face: {}", e)))
}

/// One prism per sketch circle, starting `start` along the plane normal and
/// extending `length` further along it.
fn sweep_circles(sketch: &TruckSketch, start: f64, length: f64) -> Result<Vec<Solid>, CadError> {
    let (u, _, n) = sketch.plane.base.frame();
    let normal = vector(n);
    sketch
        .circles
        .iter()
        .map(|&(center, radius)| {
            let c = point(sketch.plane.to_world(center)) + normal * start;
            let face = disc_face(c, vector(u), normal, radius)?;
            Ok(builder::tsweep(&face, normal * length))
        })
        .collect()
}

fn union(a: &Solid, b: &Solid) -> Result<Solid, CadError> {
    truck_shapeops::or(a, b, BOOLEAN_TOLERANCE)
        .ok_or_else(|| failed("boss_extrude", "truck or() returned None"))
}

fn subtract(body: &Solid, tool: &Solid) -> Result<Solid, CadError> {
    // Subtraction = A ∩ ¬B. not() mutates in place.
    let mut tool = tool.clone();
    tool.not();
    truck_shapeops::and(body, &tool, BOOLEAN_TOLERANCE)
        .ok_or_else(|| failed("cut_extrude", "truck and() returned None for subtraction"))
}

fn check_positive(what: &str, value: f64) -> Result<(), CadError> {
    if value.is_nan() || value <= 0.0 {
        return Err(CadError::InvalidArgument {
            reason: format!("{what} must be positive, got {value}"),
        });
    }
    Ok(())
}

impl CadBackend for TruckCad {
    fn attach(&mut self) -> Result<(), CadError> {
        self.attached = true;
        Ok(())
    }

    fn create_document(&mut self) -> Result<(), CadError> {
        if !self.attached {
            return Err(CadError::NotAttached);
        }
        self.document = Some(TruckDocument::default());
        Ok(())
    }

    fn create_sketch(&mut self, plane: SketchPlane) -> Result<SketchId, CadError> {
        let id = SketchId(self.next_sketch + 1);
        let doc = self.document_mut()?;
        doc.sketches.insert(
            id.0,
            TruckSketch {
                plane,
                circles: Vec::new(),
                finished: false,
            },
        );
        self.next_sketch += 1;
        Ok(id)
    }

    fn draw_circle(
        &mut self,
        sketch: SketchId,
        center: [f64; 2],
        radius: f64,
    ) -> Result<(), CadError> {
        check_positive("circle radius", radius)?;
        let doc = self.document_mut()?;
        let entry = doc
            .sketches
            .get_mut(&sketch.0)
            .ok_or(CadError::SketchNotFound { id: sketch })?;
        if entry.finished {
            return Err(CadError::SketchClosed { id: sketch });
        }
        entry.circles.push((center, radius));
        Ok(())
    }

    fn finish_sketch(&mut self, sketch: SketchId) -> Result<(), CadError> {
        let doc = self.document_mut()?;
        let entry = doc
            .sketches
            .get_mut(&sketch.0)
            .ok_or(CadError::SketchNotFound { id: sketch })?;
        entry.finished = true;
        Ok(())
    }

    fn boss_extrude(
        &mut self,
        sketch: SketchId,
        axis: Axis,
        length: f64,
    ) -> Result<(), CadError> {
        check_positive("extrude length", length)?;
        let doc = self.document_mut()?;
        let profile = Self::usable_sketch(doc, sketch)?;

        let alignment = dot(axis.unit(), profile.plane.base.normal());
        if alignment.abs() < 0.5 {
            return Err(CadError::InvalidArgument {
                reason: format!("extrude axis {axis:?} lies in the sketch plane"),
            });
        }
        let start = if alignment > 0.0 { 0.0 } else { -length };
        tracing::debug!(?axis, length, start, "truck boss extrude");

        let mut solids = sweep_circles(profile, start, length)?.into_iter();
        let mut body = match doc.body.take() {
            Some(body) => body,
            None => solids.next().ok_or(CadError::EmptySketch { id: sketch })?,
        };
        for solid in solids {
            body = union(&body, &solid)?;
        }
        doc.body = Some(body);
        Ok(())
    }

    fn cut_extrude(&mut self, sketch: SketchId, spec: CutSpec) -> Result<(), CadError> {
        check_positive("cut depth", spec.depth)?;
        let doc = self.document_mut()?;
        let profile = Self::usable_sketch(doc, sketch)?;

        let length = spec.depth + 2.0 * COPLANAR_EPS;
        let start = match spec.direction {
            Direction::Forward => -COPLANAR_EPS,
            Direction::Reverse => -spec.depth - COPLANAR_EPS,
        };
        tracing::debug!(
            depth = spec.depth,
            direction = ?spec.direction,
            through_all = spec.through_all,
            "truck cut extrude"
        );

        let tools = sweep_circles(profile, start, length)?;
        let mut body = doc.body.take().ok_or(CadError::NoBody)?;
        for tool in &tools {
            match subtract(&body, tool) {
                Ok(next) => body = next,
                Err(e) => {
                    // Keep the uncut body so the document stays consistent.
                    doc.body = Some(body);
                    return Err(e);
                }
            }
        }
        doc.body = Some(body);
        Ok(())
    }

    fn fillet(&mut self, radius: f64, edges: &EdgeSelection) -> Result<(), CadError> {
        check_positive("fillet radius", radius)?;
        let doc = self.document_mut()?;
        if doc.body.is_none() {
            return Err(CadError::NoBody);
        }
        tracing::debug!(radius, ?edges, "truck fillet requested");
        Err(CadError::NotSupported {
            operation: "fillet".to_string(),
        })
    }

    fn save_as(&mut self, path: &Path) -> Result<(), CadError> {
        let doc = self.document_mut()?;
        let body = doc.body.as_ref().ok_or(CadError::NoBody)?;

        let step = out::CompleteStepDisplay::new(
            out::StepModel::from(&body.compress()),
            out::StepHeaderDescriptor {
                organization_system: "weight-plate".to_owned(),
                ..Default::default()
            },
        )
        .to_string();

        std::fs::write(path, step).map_err(|e| CadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "truck document saved as STEP");
        Ok(())
    }

    fn close_document(&mut self) -> Result<(), CadError> {
        self.document = None;
        Ok(())
    }
}
