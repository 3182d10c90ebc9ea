//! Ariadne-based diagnostic rendering.
//!
//! Renders `TypeError` values into formatted, labeled reports. Output is
//! colorless so renderings stay stable in test assertions and logs.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use sable_common::Severity;

use crate::error::TypeError;

// ── Error codes ─────────────────────────────────────────────────────────

/// The stable code of a diagnostic kind.
pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::Mismatch { .. } => "E0001",
        TypeError::InfiniteType { .. } => "E0002",
        TypeError::ArityMismatch { .. } => "E0003",
        TypeError::UndefinedName { .. } => "E0004",
        TypeError::NotCallable { .. } => "E0005",
        TypeError::TraitNotSatisfied { .. } => "E0006",
        TypeError::AmbiguousUse { .. } => "E0007",
        TypeError::CircularDependency { .. } => "E0008",
        TypeError::CircularRefinement { .. } => "E0009",
        TypeError::NotEnoughContext { .. } => "E0010",
        TypeError::LabelMismatch { .. } => "E0011",
        TypeError::InvalidGenericArgumentCount { .. } => "E0012",
        TypeError::ExpectedTypeAnnotation { .. } => "E0013",
        TypeError::MissingReturnValue { .. } => "E0014",
        TypeError::InvalidMethodBundleReturn { .. } => "E0015",
        TypeError::DuplicateParameterName { .. } => "E0016",
        TypeError::DuplicateCaptureName { .. } => "E0017",
        TypeError::AmbiguousImplicitCapture { .. } => "E0018",
        TypeError::ConformanceToNonTrait { .. } => "E0019",
        TypeError::NonTraitType { .. } => "E0020",
        TypeError::InvalidSelfReference { .. } => "E0021",
        TypeError::InvalidUseOfAssociatedType { .. } => "E0022",
        TypeError::SumTypeSingleElement { .. } => "E0023",
        TypeError::ValueInSumType { .. } => "E0024",
        TypeError::InvalidConstraint { .. } => "E0025",
        TypeError::CannotExtendBuiltin { .. } => "E0026",
        TypeError::UnsupportedBufferType { .. } => "E0027",
        TypeError::RedundantConformance { .. } => "E0028",
        TypeError::RequirementNotSatisfied { .. } => "E0029",
        TypeError::AmbiguousRequirementWitness { .. } => "E0030",
        TypeError::DuplicateOperator { .. } => "E0031",
        TypeError::NameRefersToValue { .. } => "E0032",
        TypeError::UndefinedOperator { .. } => "E0033",
        TypeError::SumTypeZeroElements { .. } => "W0001",
        TypeError::UnusedResult { .. } => "W0002",
        TypeError::ConformanceConditionUnchecked { .. } => "W0003",
    }
}

// ── Rendering ───────────────────────────────────────────────────────────

/// Render one diagnostic against its source text.
pub fn render_diagnostic(error: &TypeError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    // Ariadne needs a non-empty, in-bounds span.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let start = r.start.min(source_len);
        let end = r.end.min(source_len).max(start);
        if start == end {
            start..end.saturating_add(1).min(source_len).max(start)
        } else {
            start..end
        }
    };

    let kind = match error.severity() {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };
    let primary = clamp(error.span().into());
    let mut builder = Report::build(kind, primary.clone())
        .with_config(config)
        .with_code(error_code(error))
        .with_message(error.to_string());
    builder.add_label(Label::new(primary).with_message(error.to_string()));

    // Secondary sites for diagnostics that carry one.
    match error {
        TypeError::RedundantConformance { previous, .. }
        | TypeError::DuplicateOperator { previous, .. } => {
            let prev = clamp((*previous).into());
            builder.add_label(Label::new(prev).with_message("previously declared here"));
        }
        _ => {}
    }

    let mut buf = Vec::new();
    builder
        .finish()
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render a batch of diagnostics, errors before warnings, each in
/// emission order.
pub fn render_all(diagnostics: &crate::Diagnostics, source: &str) -> String {
    let mut out = String::new();
    for e in diagnostics.errors.iter().chain(diagnostics.warnings.iter()) {
        out.push_str(&render_diagnostic(e, source));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_common::Span;

    #[test]
    fn renders_code_and_message() {
        let err = TypeError::UndefinedName { name: "x".into(), span: Span::new(4, 5) };
        let rendered = render_diagnostic(&err, "let x = y");
        assert!(rendered.contains("E0004"));
        assert!(rendered.contains("undefined name `x`"));
    }

    #[test]
    fn out_of_bounds_spans_are_clamped() {
        let err = TypeError::CircularDependency { span: Span::new(90, 99) };
        let rendered = render_diagnostic(&err, "short");
        assert!(rendered.contains("E0008"));
    }
}
