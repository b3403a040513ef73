use crate::ArstError;
use crate::ir::Design;

/// Entry point used by the pass scheduler.
pub trait DesignPass {
    fn name(&self) -> &'static str;
    fn run(&self, design: &mut Design) -> Result<(), ArstError>;
}
