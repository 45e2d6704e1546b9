use thiserror::Error;

/// Failures of the placement core. None of these is fatal to a running
/// frame loop; the session logs and retains the previous visual state.
#[derive(Error, Debug)]
pub enum Error {
    #[error("overlay asset calibration failed: {0}")]
    Calibration(String),

    #[error("calibration reference distance is zero")]
    DegenerateCalibration,

    #[error("landmark frame is missing annotation: {0}")]
    MissingAnnotation(&'static str),

    #[error("annotation {0} has no points")]
    EmptyAnnotation(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
