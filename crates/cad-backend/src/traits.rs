use std::path::Path;

use crate::types::*;

/// The modeling capability a build drives.
///
/// Session based: `attach` first, then `create_document`; every sketch and
/// feature lives in the active document until `close_document`. Calls are
/// synchronous and not reentrant. Implemented by TruckCad (real B-rep via
/// truck) and MockCad (recording test double).
pub trait CadBackend {
    /// Attach to a running CAD session, launching one if needed.
    fn attach(&mut self) -> Result<(), CadError>;

    /// Create a new, empty 3D part document and make it active.
    fn create_document(&mut self) -> Result<(), CadError>;

    /// Open a sketch on a plane of the active document.
    fn create_sketch(&mut self, plane: SketchPlane) -> Result<SketchId, CadError>;

    /// Add a circle to an open sketch, in the sketch's plane coordinates.
    fn draw_circle(
        &mut self,
        sketch: SketchId,
        center: [f64; 2],
        radius: f64,
    ) -> Result<(), CadError>;

    /// Close a sketch for editing so features can consume it.
    fn finish_sketch(&mut self, sketch: SketchId) -> Result<(), CadError>;

    /// Add material by extruding the sketch profiles along an axis.
    fn boss_extrude(&mut self, sketch: SketchId, axis: Axis, length: f64)
        -> Result<(), CadError>;

    /// Remove material by extruding the sketch profiles into the body.
    fn cut_extrude(&mut self, sketch: SketchId, spec: CutSpec) -> Result<(), CadError>;

    /// Round the selected edges of the body. Kernels without edge blending
    /// return [`CadError::NotSupported`] and leave the body as it was.
    fn fillet(&mut self, radius: f64, edges: &EdgeSelection) -> Result<(), CadError>;

    /// Write the active document to `path`.
    fn save_as(&mut self, path: &Path) -> Result<(), CadError>;

    /// Close the active document, discarding unsaved state.
    /// Closing when no document is open is not an error.
    fn close_document(&mut self) -> Result<(), CadError>;
}
