pub mod calibrator;
pub mod demography;
pub mod watterson;

pub use calibrator::{calibrate, CalibrationInputs};
pub use demography::DemographicFormat;
pub use watterson::watterson_theta;
