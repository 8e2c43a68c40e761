pub mod mock_cad;
pub mod traits;
pub mod truck_cad;
pub mod types;

pub use mock_cad::{CadCall, CadOp, MockCad};
pub use traits::*;
pub use truck_cad::TruckCad;
pub use types::*;
