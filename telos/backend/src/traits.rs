//! Interface for a telos backend.
use crate::rules::PlanLibrary;
use telos_utils::{OutputFile, TelosResult};

/// A backend for the compiled plan library.
pub trait Backend {
    /// The name of this backend.
    fn name(&self) -> &'static str;
    /// Validate the library for emitting using this backend. Returns an
    /// Err(..) if it has unexpected constructs.
    fn validate(lib: &PlanLibrary) -> TelosResult<()>;
    /// Transform the library into a formatted string and write it.
    fn emit(lib: &PlanLibrary, write: &mut OutputFile) -> TelosResult<()>;
    /// Convenience function to validate and emit the library.
    fn run(&self, lib: &PlanLibrary, mut file: OutputFile) -> TelosResult<()> {
        Self::validate(lib)?;
        Self::emit(lib, &mut file)
    }
}
