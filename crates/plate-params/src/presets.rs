//! Catalog of named, ready-to-build plate configurations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// Preset identifiers. `Custom` marks manual input and carries no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetId {
    StandardTraining,
    Olympic50,
    Compact300,
    Dumbbell200,
    Custom,
}

/// A display name plus the parameter set it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    id: PresetId,
    display_name: &'static str,
    parameters: Option<ParameterSet>,
}

impl Preset {
    pub fn id(&self) -> PresetId {
        self.id
    }

    pub fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// `None` only for [`PresetId::Custom`].
    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.parameters.as_ref()
    }

    pub fn is_custom(&self) -> bool {
        self.id == PresetId::Custom
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}

static PRESETS: [Preset; 5] = [
    Preset {
        id: PresetId::StandardTraining,
        display_name: "Standard (Ø450, bore Ø28)",
        parameters: Some(ParameterSet::from_values(450.0, 45.0, 28.0, 5.0, 120.0, 15.0)),
    },
    Preset {
        id: PresetId::Olympic50,
        display_name: "Olympic (Ø450, bore Ø50)",
        parameters: Some(ParameterSet::from_values(450.0, 45.0, 50.0, 3.0, 150.0, 20.0)),
    },
    Preset {
        id: PresetId::Compact300,
        display_name: "Compact (Ø300)",
        parameters: Some(ParameterSet::from_values(300.0, 30.0, 28.0, 3.0, 90.0, 10.0)),
    },
    Preset {
        id: PresetId::Dumbbell200,
        display_name: "Dumbbell / small (Ø200)",
        parameters: Some(ParameterSet::from_values(200.0, 20.0, 26.0, 2.0, 60.0, 8.0)),
    },
    Preset {
        id: PresetId::Custom,
        display_name: "Custom",
        parameters: None,
    },
];

/// Every preset, custom last.
pub fn all() -> &'static [Preset] {
    &PRESETS
}

pub fn by_id(id: PresetId) -> &'static Preset {
    match id {
        PresetId::StandardTraining => &PRESETS[0],
        PresetId::Olympic50 => &PRESETS[1],
        PresetId::Compact300 => &PRESETS[2],
        PresetId::Dumbbell200 => &PRESETS[3],
        PresetId::Custom => &PRESETS[4],
    }
}

/// The preset a fresh form starts on.
pub fn default_id() -> PresetId {
    PresetId::StandardTraining
}
