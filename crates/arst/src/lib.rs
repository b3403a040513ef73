mod arst;
mod error;
pub mod ir;
mod options;
mod pass;
mod sigmap;

pub(crate) use fxhash::FxHashMap as HashMap;

pub use arst::{
    ArstPass, ArstReport, ConstPropagator, Conversion, ConversionKind, MAX_ITERATIONS,
    PropagationError, Resolved, SignalTracer, TreePruner, clean_case, dispatch_signal,
};
pub use error::ArstError;
pub use options::{ArstOptions, GlobalReset};
pub use pass::DesignPass;
pub use sigmap::SigMap;
