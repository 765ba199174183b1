//! Diagnostic collection

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Range};

/// Source name attached to every diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "tf-config-lsp";

/// Collects diagnostics during parsing and validation
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration error diagnostic
    pub fn add_error(&mut self, message: String, range: Range) {
        self.diagnostics.push(Diagnostic {
            range,
            severity: Some(DiagnosticSeverity::ERROR),
            code: None,
            code_description: None,
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message,
            related_information: None,
            tags: None,
            data: None,
        });
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Convert into the final list of diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::Position;

    use super::*;

    fn range() -> Range {
        Range {
            start: Position {
                line: 1,
                character: 0,
            },
            end: Position {
                line: 1,
                character: 8,
            },
        }
    }

    #[test]
    fn test_error_severity_and_source() {
        let mut collector = DiagnosticCollector::new();
        assert!(collector.is_empty());

        collector.add_error("first".to_string(), range());
        collector.add_error("second".to_string(), range());
        assert_eq!(collector.len(), 2);

        let diagnostics = collector.into_diagnostics();
        assert!(diagnostics
            .iter()
            .all(|d| d.severity == Some(DiagnosticSeverity::ERROR)));
        assert!(diagnostics
            .iter()
            .all(|d| d.source.as_deref() == Some(DIAGNOSTIC_SOURCE)));
        assert_eq!(diagnostics[0].message, "first");
        assert_eq!(diagnostics[0].range, range());
    }
}
