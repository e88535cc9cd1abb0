//! Loading of a resolved dependency tree.
//!
//! - `state`: per-node resolution records
//! - `attempt`: the direct, extracted and short-name strategies
//! - `driver`: [`NativeLibraryLoader`], tying platform, manifest, host search,
//!   extraction and the dynamic linker together

mod attempt;
mod driver;
mod state;

pub use attempt::{
    AttemptFailureReason, AttemptResult, LoadAttemptFailure, LoadStrategy, LoadedLibrary,
    NodeLoadFailure,
};
pub use driver::{FailedNode, LoadReport, LoadedNode, LoaderBuilder, NativeLibraryLoader};
pub use state::{LoadState, NodeResolution, ResolutionTable};
