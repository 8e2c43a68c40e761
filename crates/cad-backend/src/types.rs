use serde::{Deserialize, Serialize};

/// Handle to a sketch inside the active document.
/// Valid only until the document is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SketchId(pub u64);

/// Backend-specific edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u64);

/// One of the three principal planes of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasePlane {
    Xy,
    Xz,
    Yz,
}

impl BasePlane {
    /// In-plane axes `(u, v)` and the normal `u × v`.
    pub fn frame(self) -> ([f64; 3], [f64; 3], [f64; 3]) {
        match self {
            BasePlane::Xy => ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            BasePlane::Xz => ([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
            BasePlane::Yz => ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        }
    }

    pub fn normal(self) -> [f64; 3] {
        self.frame().2
    }

    /// The principal axis perpendicular to this plane.
    pub fn normal_axis(self) -> Axis {
        match self {
            BasePlane::Xy => Axis::Z,
            BasePlane::Xz => Axis::Y,
            BasePlane::Yz => Axis::X,
        }
    }
}

/// A sketch plane: a base plane, optionally shifted along its normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    pub base: BasePlane,
    pub offset: f64,
}

impl SketchPlane {
    pub fn base(base: BasePlane) -> Self {
        Self { base, offset: 0.0 }
    }

    pub fn offset(base: BasePlane, offset: f64) -> Self {
        Self { base, offset }
    }

    /// Plane origin in document coordinates.
    pub fn origin(&self) -> [f64; 3] {
        let n = self.base.normal();
        [n[0] * self.offset, n[1] * self.offset, n[2] * self.offset]
    }

    /// Map in-plane coordinates to document coordinates.
    pub fn to_world(&self, uv: [f64; 2]) -> [f64; 3] {
        let (u, v, _) = self.base.frame();
        let o = self.origin();
        [
            o[0] + u[0] * uv[0] + v[0] * uv[1],
            o[1] + u[1] * uv[0] + v[1] * uv[1],
            o[2] + u[2] * uv[0] + v[2] * uv[1],
        ]
    }
}

/// Principal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> [f64; 3] {
        match self {
            Axis::X => [1.0, 0.0, 0.0],
            Axis::Y => [0.0, 1.0, 0.0],
            Axis::Z => [0.0, 0.0, 1.0],
        }
    }
}

/// Extrusion direction relative to the sketch plane normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Along the plane normal.
    Forward,
    /// Against the plane normal.
    Reverse,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// How far and which way a cut-extrude removes material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutSpec {
    pub depth: f64,
    pub direction: Direction,
    /// The caller intends full penetration; `depth` already exceeds the
    /// part so backends without a native through-all can cut blind.
    pub through_all: bool,
}

impl CutSpec {
    pub fn blind(depth: f64, direction: Direction) -> Self {
        Self {
            depth,
            direction,
            through_all: false,
        }
    }

    pub fn through_all(depth: f64, direction: Direction) -> Self {
        Self {
            depth,
            direction,
            through_all: true,
        }
    }
}

/// Which edges a fillet applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EdgeSelection {
    /// Every edge of the current body.
    #[default]
    All,
    Edges(Vec<EdgeId>),
}

/// Errors from CAD backend operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CadError {
    #[error("no CAD session is attached")]
    NotAttached,

    #[error("no document is open")]
    NoDocument,

    #[error("sketch not found: {id:?}")]
    SketchNotFound { id: SketchId },

    #[error("sketch {id:?} must be finished before it is used by a feature")]
    SketchNotFinished { id: SketchId },

    #[error("sketch {id:?} is already finished")]
    SketchClosed { id: SketchId },

    #[error("sketch {id:?} has no profiles")]
    EmptySketch { id: SketchId },

    #[error("document has no body to modify")]
    NoBody,

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("{operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}
