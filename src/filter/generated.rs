use crate::{
    analysis::{MethodDescriptor, MethodGraph},
    filter::{ignore_method, Filter, FilterContext, FilterOutput},
};

/// Skips methods of classes or methods annotated as generated.
///
/// Any annotation whose simple name contains `Generated` counts, e.g. `lombok.Generated` or
/// `javax.annotation.processing.Generated`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedFilter;

impl GeneratedFilter {
    /// Returns `true` if the annotation descriptor marks generated code.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use covscope::filter::GeneratedFilter;
    ///
    /// assert!(GeneratedFilter::is_generated("Llombok/Generated;"));
    /// assert!(!GeneratedFilter::is_generated("Ljava/lang/Deprecated;"));
    /// ```
    #[must_use]
    pub fn is_generated(desc: &str) -> bool {
        let name = desc.trim_end_matches(';');
        let name = name.rsplit(['/', '$']).next().unwrap_or(name);
        name.contains("Generated")
    }
}

impl Filter for GeneratedFilter {
    fn name(&self) -> &'static str {
        "generated"
    }

    fn filter(
        &self,
        method: &MethodDescriptor,
        graph: &MethodGraph,
        context: &dyn FilterContext,
        output: &mut dyn FilterOutput,
    ) {
        let generated = context
            .class_annotations()
            .iter()
            .chain(&method.annotations)
            .any(|desc| Self::is_generated(desc));
        if generated {
            ignore_method(graph, output);
        }
    }
}
