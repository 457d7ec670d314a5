//! The intent taxonomy.

use serde::{Deserialize, Serialize};

/// Classified purpose of a user request.
///
/// Produced by the classifier, or forced to `PdfAnalysis` when a file is
/// attached. Lives only for the duration of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// General financial-education question answered from the document corpus.
    Rag,
    /// Expense analysis of an uploaded PDF statement.
    PdfAnalysis,
    /// Product and price recommendations.
    Shopping,
    /// Off-topic or unsafe; never forwarded.
    Unreasonable,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 4] = [
        Intent::Rag,
        Intent::PdfAnalysis,
        Intent::Shopping,
        Intent::Unreasonable,
    ];

    /// The lowercase token the classification oracle answers with.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rag => "rag",
            Self::PdfAnalysis => "pdf",
            Self::Shopping => "shopping",
            Self::Unreasonable => "irrazonable",
        }
    }

    /// Exact, case-sensitive match against the oracle labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.label() == label)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
