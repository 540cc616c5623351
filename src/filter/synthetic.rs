use crate::{
    analysis::{AccessFlags, MethodDescriptor, MethodGraph},
    filter::{ignore_method, Filter, FilterContext, FilterOutput},
};

/// Skips synthetic methods.
///
/// Lambda bodies are compiled into synthetic methods named `lambda$...`, they contain user
/// code and are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticFilter;

impl Filter for SyntheticFilter {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn filter(
        &self,
        method: &MethodDescriptor,
        graph: &MethodGraph,
        _context: &dyn FilterContext,
        output: &mut dyn FilterOutput,
    ) {
        if !method.access.contains(AccessFlags::SYNTHETIC) || method.name.starts_with("lambda$") {
            return;
        }
        ignore_method(graph, output);
    }
}
