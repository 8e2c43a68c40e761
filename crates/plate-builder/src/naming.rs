use chrono::NaiveDateTime;
use plate_params::{format_mm, ParameterSet};

pub const FILE_PREFIX: &str = "WeightPlate";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// File name for a saved plate, encoding every parameter and a
/// millisecond timestamp.
///
/// `WeightPlate_D450_T45_d28_R5_L120_G15_20240131_142501_007.step`
pub fn output_file_name(params: &ParameterSet, timestamp: NaiveDateTime, extension: &str) -> String {
    format!(
        "{FILE_PREFIX}_D{}_T{}_d{}_R{}_L{}_G{}_{}.{}",
        format_mm(params.outer_diameter()),
        format_mm(params.thickness()),
        format_mm(params.hole_diameter()),
        format_mm(params.chamfer_radius()),
        format_mm(params.recess_radius()),
        format_mm(params.recess_depth()),
        timestamp.format(TIMESTAMP_FORMAT),
        extension,
    )
}
