//! Deterministic recording double implementing CadBackend.
//!
//! Tracks session, document and sketch state like a real backend would,
//! records every call in order, and can be told to fail a given call.
//! Used by plate-builder to test stage ordering and cleanup.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::traits::CadBackend;
use crate::types::*;

/// Operation kinds, for failure injection and log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadOp {
    Attach,
    CreateDocument,
    CreateSketch,
    DrawCircle,
    FinishSketch,
    BossExtrude,
    CutExtrude,
    Fillet,
    SaveAs,
    CloseDocument,
}

impl CadOp {
    pub fn name(self) -> &'static str {
        match self {
            CadOp::Attach => "attach",
            CadOp::CreateDocument => "create_document",
            CadOp::CreateSketch => "create_sketch",
            CadOp::DrawCircle => "draw_circle",
            CadOp::FinishSketch => "finish_sketch",
            CadOp::BossExtrude => "boss_extrude",
            CadOp::CutExtrude => "cut_extrude",
            CadOp::Fillet => "fillet",
            CadOp::SaveAs => "save_as",
            CadOp::CloseDocument => "close_document",
        }
    }
}

/// One recorded backend call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CadCall {
    Attach,
    CreateDocument,
    CreateSketch {
        id: SketchId,
        plane: SketchPlane,
    },
    DrawCircle {
        sketch: SketchId,
        center: [f64; 2],
        radius: f64,
    },
    FinishSketch {
        sketch: SketchId,
    },
    BossExtrude {
        sketch: SketchId,
        axis: Axis,
        length: f64,
    },
    CutExtrude {
        sketch: SketchId,
        spec: CutSpec,
    },
    Fillet {
        radius: f64,
        edges: EdgeSelection,
    },
    SaveAs {
        path: PathBuf,
    },
    CloseDocument,
}

impl CadCall {
    pub fn op(&self) -> CadOp {
        match self {
            CadCall::Attach => CadOp::Attach,
            CadCall::CreateDocument => CadOp::CreateDocument,
            CadCall::CreateSketch { .. } => CadOp::CreateSketch,
            CadCall::DrawCircle { .. } => CadOp::DrawCircle,
            CadCall::FinishSketch { .. } => CadOp::FinishSketch,
            CadCall::BossExtrude { .. } => CadOp::BossExtrude,
            CadCall::CutExtrude { .. } => CadOp::CutExtrude,
            CadCall::Fillet { .. } => CadOp::Fillet,
            CadCall::SaveAs { .. } => CadOp::SaveAs,
            CadCall::CloseDocument => CadOp::CloseDocument,
        }
    }
}

#[derive(Debug, Clone)]
struct MockSketch {
    plane: SketchPlane,
    circles: Vec<([f64; 2], f64)>,
    finished: bool,
}

#[derive(Debug, Clone, Default)]
struct MockDocument {
    sketches: HashMap<u64, MockSketch>,
    /// Feature log of the body, in creation order. Empty means no body.
    features: Vec<String>,
}

/// Recording test double for the CAD capability.
#[derive(Debug, Default)]
pub struct MockCad {
    attached: bool,
    document: Option<MockDocument>,
    next_sketch: u64,
    calls: Vec<CadCall>,
    op_counts: HashMap<CadOp, usize>,
    /// (operation, 1-based occurrence) pairs that should fail.
    failures: Vec<(CadOp, usize)>,
    close_count: usize,
    saved: Vec<PathBuf>,
    no_fillet: bool,
}

impl MockCad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` call (1-based) of `op` fail with `OperationFailed`.
    pub fn fail_on(mut self, op: CadOp, nth: usize) -> Self {
        self.failures.push((op, nth));
        self
    }

    /// Answer every fillet with `NotSupported`, like a kernel without edge
    /// blending.
    pub fn without_fillet(mut self) -> Self {
        self.no_fillet = true;
        self
    }

    /// Every call made so far, including failed ones.
    pub fn calls(&self) -> &[CadCall] {
        &self.calls
    }

    pub fn ops(&self) -> Vec<CadOp> {
        self.calls.iter().map(CadCall::op).collect()
    }

    pub fn count(&self, op: CadOp) -> usize {
        self.op_counts.get(&op).copied().unwrap_or(0)
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }

    pub fn saved_paths(&self) -> &[PathBuf] {
        &self.saved
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_document_open(&self) -> bool {
        self.document.is_some()
    }

    /// Features applied to the body of the open document.
    pub fn body_features(&self) -> Vec<String> {
        self.document
            .as_ref()
            .map(|d| d.features.clone())
            .unwrap_or_default()
    }

    /// Forget recorded calls and counters, keeping injected failures.
    pub fn clear_log(&mut self) {
        self.calls.clear();
        self.op_counts.clear();
        self.close_count = 0;
        self.saved.clear();
    }

    fn record(&mut self, call: CadCall) -> Result<(), CadError> {
        let op = call.op();
        self.calls.push(call);
        let count = self.op_counts.entry(op).or_insert(0);
        *count += 1;
        let n = *count;
        if self.failures.contains(&(op, n)) {
            return Err(CadError::OperationFailed {
                operation: op.name().to_string(),
                reason: format!("injected failure on call #{n}"),
            });
        }
        Ok(())
    }

    fn document_mut(&mut self) -> Result<&mut MockDocument, CadError> {
        if !self.attached {
            return Err(CadError::NotAttached);
        }
        self.document.as_mut().ok_or(CadError::NoDocument)
    }

    /// A finished, non-empty sketch ready to be consumed by a feature.
    fn usable_sketch(&mut self, id: SketchId) -> Result<&MockSketch, CadError> {
        let doc = self.document_mut()?;
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

    fn describe(sketch: &MockSketch) -> String {
        let circles: Vec<String> = sketch
            .circles
            .iter()
            .map(|(c, r)| format!("circle(({}, {}), r={})", c[0], c[1], r))
            .collect();
        format!(
            "{:?}+{} [{}]",
            sketch.plane.base,
            sketch.plane.offset,
            circles.join(", ")
        )
    }
}

impl CadBackend for MockCad {
    fn attach(&mut self) -> Result<(), CadError> {
        self.record(CadCall::Attach)?;
        self.attached = true;
        Ok(())
    }

    fn create_document(&mut self) -> Result<(), CadError> {
        self.record(CadCall::CreateDocument)?;
        if !self.attached {
            return Err(CadError::NotAttached);
        }
        self.document = Some(MockDocument::default());
        Ok(())
    }

    fn create_sketch(&mut self, plane: SketchPlane) -> Result<SketchId, CadError> {
        let id = SketchId(self.next_sketch + 1);
        self.record(CadCall::CreateSketch { id, plane })?;
        let doc = self.document_mut()?;
        doc.sketches.insert(
            id.0,
            MockSketch {
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
        self.record(CadCall::DrawCircle {
            sketch,
            center,
            radius,
        })?;
        if radius.is_nan() || radius <= 0.0 {
            return Err(CadError::InvalidArgument {
                reason: format!("circle radius must be positive, got {radius}"),
            });
        }
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
        self.record(CadCall::FinishSketch { sketch })?;
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
        self.record(CadCall::BossExtrude {
            sketch,
            axis,
            length,
        })?;
        if length.is_nan() || length <= 0.0 {
            return Err(CadError::InvalidArgument {
                reason: format!("extrude length must be positive, got {length}"),
            });
        }
        let line = format!(
            "boss {} along {:?} by {}",
            Self::describe(self.usable_sketch(sketch)?),
            axis,
            length
        );
        self.document_mut()?.features.push(line);
        Ok(())
    }

    fn cut_extrude(&mut self, sketch: SketchId, spec: CutSpec) -> Result<(), CadError> {
        self.record(CadCall::CutExtrude { sketch, spec })?;
        if spec.depth.is_nan() || spec.depth <= 0.0 {
            return Err(CadError::InvalidArgument {
                reason: format!("cut depth must be positive, got {}", spec.depth),
            });
        }
        let line = format!(
            "cut {} {:?} by {}{}",
            Self::describe(self.usable_sketch(sketch)?),
            spec.direction,
            spec.depth,
            if spec.through_all { " (through all)" } else { "" }
        );
        let doc = self.document_mut()?;
        if doc.features.is_empty() {
            return Err(CadError::NoBody);
        }
        doc.features.push(line);
        Ok(())
    }

    fn fillet(&mut self, radius: f64, edges: &EdgeSelection) -> Result<(), CadError> {
        self.record(CadCall::Fillet {
            radius,
            edges: edges.clone(),
        })?;
        if self.no_fillet {
            return Err(CadError::NotSupported {
                operation: CadOp::Fillet.name().to_string(),
            });
        }
        if radius.is_nan() || radius <= 0.0 {
            return Err(CadError::InvalidArgument {
                reason: "fillet radius must be positive".to_string(),
            });
        }
        let doc = self.document_mut()?;
        if doc.features.is_empty() {
            return Err(CadError::NoBody);
        }
        let target = match edges {
            EdgeSelection::All => "all edges".to_string(),
            EdgeSelection::Edges(ids) => format!("{} edges", ids.len()),
        };
        doc.features.push(format!("fillet {target} r={radius}"));
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<(), CadError> {
        self.record(CadCall::SaveAs {
            path: path.to_path_buf(),
        })?;
        let doc = self.document_mut()?;
        let mut text = String::from("mock-cad document\n");
        for feature in &doc.features {
            let _ = writeln!(text, "{feature}");
        }
        std::fs::write(path, text).map_err(|e| CadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.saved.push(path.to_path_buf());
        Ok(())
    }

    fn close_document(&mut self) -> Result<(), CadError> {
        self.close_count += 1;
        self.record(CadCall::CloseDocument)?;
        self.document = None;
        Ok(())
    }
}
