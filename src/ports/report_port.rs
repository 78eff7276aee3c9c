//! Report generation port trait.

use crate::domain::batch::BatchResult;
use crate::domain::error::AatrError;

/// Port for rendering a finished batch. Reports only read the results.
pub trait ReportPort {
    fn write(&self, result: &BatchResult, output_path: &str) -> Result<(), AatrError>;
}
