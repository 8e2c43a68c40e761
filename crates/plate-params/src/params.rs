use serde::{Deserialize, Serialize};

/// Identifies one of the six plate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParameterId {
    /// Plate outer diameter (D).
    OuterDiameter,
    /// Plate thickness (T).
    Thickness,
    /// Central bore diameter (d).
    HoleDiameter,
    /// Edge fillet radius (R).
    ChamferRadius,
    /// Radius of the recess on both faces (L).
    RecessRadius,
    /// Depth of the recess, cut from each face (G).
    RecessDepth,
}

impl ParameterId {
    /// All parameters in declaration order: D, T, d, R, L, G.
    pub const ALL: [ParameterId; 6] = [
        ParameterId::OuterDiameter,
        ParameterId::Thickness,
        ParameterId::HoleDiameter,
        ParameterId::ChamferRadius,
        ParameterId::RecessRadius,
        ParameterId::RecessDepth,
    ];

    /// The single-letter symbol used on drawings and in file names.
    pub fn symbol(self) -> &'static str {
        match self {
            ParameterId::OuterDiameter => "D",
            ParameterId::Thickness => "T",
            ParameterId::HoleDiameter => "d",
            ParameterId::ChamferRadius => "R",
            ParameterId::RecessRadius => "L",
            ParameterId::RecessDepth => "G",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterId::OuterDiameter => "Outer diameter",
            ParameterId::Thickness => "Thickness",
            ParameterId::HoleDiameter => "Hole diameter",
            ParameterId::ChamferRadius => "Chamfer radius",
            ParameterId::RecessRadius => "Recess radius",
            ParameterId::RecessDepth => "Recess depth",
        }
    }
}

impl std::fmt::Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.symbol())
    }
}

/// Errors from parameter set manipulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("no source parameter set to copy from")]
    MissingSource,
}

/// The six-field geometric description of one weight plate, in millimeters.
///
/// Setters never clamp or reject: a form layer can hold in-progress edits
/// here, and [`crate::validate_all`] is the only judge of whether a set is
/// buildable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    outer_diameter: f64,
    thickness: f64,
    hole_diameter: f64,
    chamfer_radius: f64,
    recess_radius: f64,
    recess_depth: f64,
}

impl ParameterSet {
    /// A zeroed parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from values in D, T, d, R, L, G order.
    pub const fn from_values(
        outer_diameter: f64,
        thickness: f64,
        hole_diameter: f64,
        chamfer_radius: f64,
        recess_radius: f64,
        recess_depth: f64,
    ) -> Self {
        Self {
            outer_diameter,
            thickness,
            hole_diameter,
            chamfer_radius,
            recess_radius,
            recess_depth,
        }
    }

    pub fn outer_diameter(&self) -> f64 {
        self.outer_diameter
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn hole_diameter(&self) -> f64 {
        self.hole_diameter
    }

    pub fn chamfer_radius(&self) -> f64 {
        self.chamfer_radius
    }

    pub fn recess_radius(&self) -> f64 {
        self.recess_radius
    }

    pub fn recess_depth(&self) -> f64 {
        self.recess_depth
    }

    pub fn set_outer_diameter(&mut self, value: f64) {
        self.outer_diameter = value;
    }

    pub fn set_thickness(&mut self, value: f64) {
        self.thickness = value;
    }

    pub fn set_hole_diameter(&mut self, value: f64) {
        self.hole_diameter = value;
    }

    pub fn set_chamfer_radius(&mut self, value: f64) {
        self.chamfer_radius = value;
    }

    pub fn set_recess_radius(&mut self, value: f64) {
        self.recess_radius = value;
    }

    pub fn set_recess_depth(&mut self, value: f64) {
        self.recess_depth = value;
    }

    /// Read a field by identifier.
    pub fn get(&self, id: ParameterId) -> f64 {
        match id {
            ParameterId::OuterDiameter => self.outer_diameter,
            ParameterId::Thickness => self.thickness,
            ParameterId::HoleDiameter => self.hole_diameter,
            ParameterId::ChamferRadius => self.chamfer_radius,
            ParameterId::RecessRadius => self.recess_radius,
            ParameterId::RecessDepth => self.recess_depth,
        }
    }

    /// Write a field by identifier. Unconditional, like the named setters.
    pub fn set(&mut self, id: ParameterId, value: f64) {
        match id {
            ParameterId::OuterDiameter => self.outer_diameter = value,
            ParameterId::Thickness => self.thickness = value,
            ParameterId::HoleDiameter => self.hole_diameter = value,
            ParameterId::ChamferRadius => self.chamfer_radius = value,
            ParameterId::RecessRadius => self.recess_radius = value,
            ParameterId::RecessDepth => self.recess_depth = value,
        }
    }

    /// Copy all six values from `source` into `self`.
    ///
    /// Fails without touching `self` when there is no source.
    pub fn copy_from(&mut self, source: Option<&ParameterSet>) -> Result<(), ParamError> {
        let source = source.ok_or(ParamError::MissingSource)?;
        *self = *source;
        Ok(())
    }

    /// Run the full validator over this set.
    pub fn validate(&self) -> crate::ValidationReport {
        crate::validate_all(self)
    }
}
