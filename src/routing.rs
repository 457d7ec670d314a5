//! Static route table: intent → downstream handler and payload shape.
//!
//! Built once at startup and shared read-only across requests. Resolution is
//! an exhaustive `match` over `Intent`, so adding an intent without deciding
//! its route is a compile error.

use serde::Serialize;

use crate::config::HandlerUrls;
use crate::intent::Intent;

/// Message returned to the caller for out-of-policy requests.
pub const REJECTION_MESSAGE: &str = "Solicitud no razonable";

/// How a request is re-packaged before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    Json,
    Multipart,
}

/// Where an intent is forwarded and in what shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// Short handler name, used in logs and error messages.
    pub handler: &'static str,
    /// Absolute URL of the handler endpoint.
    pub url: String,
    pub shape: PayloadShape,
}

/// Signal that an intent must never be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: &'static str,
}

/// Outcome of a route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Forward(&'a RouteEntry),
    Reject(Rejection),
}

/// Read-only mapping from intent to handler.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rag: RouteEntry,
    pdf_analysis: RouteEntry,
    shopping: RouteEntry,
}

impl RouteTable {
    /// Build the table from configured handler URLs.
    pub fn new(urls: &HandlerUrls) -> Self {
        Self {
            rag: RouteEntry {
                handler: "rag",
                url: urls.rag.clone(),
                shape: PayloadShape::Json,
            },
            pdf_analysis: RouteEntry {
                handler: "analyze-pdf",
                url: urls.pdf_analysis.clone(),
                shape: PayloadShape::Multipart,
            },
            shopping: RouteEntry {
                handler: "shopping-advisor",
                url: urls.shopping.clone(),
                shape: PayloadShape::Json,
            },
        }
    }

    /// Resolve an intent. Total over `Intent`; `Unreasonable` always rejects.
    pub fn resolve(&self, intent: Intent) -> Resolution<'_> {
        match intent {
            Intent::Rag => Resolution::Forward(&self.rag),
            Intent::PdfAnalysis => Resolution::Forward(&self.pdf_analysis),
            Intent::Shopping => Resolution::Forward(&self.shopping),
            Intent::Unreasonable => Resolution::Reject(Rejection {
                reason: REJECTION_MESSAGE,
            }),
        }
    }

    /// All forwardable routes, for the inspection endpoint.
    pub fn entries(&self) -> Vec<(Intent, &RouteEntry)> {
        Intent::ALL
            .into_iter()
            .filter_map(|intent| match self.resolve(intent) {
                Resolution::Forward(entry) => Some((intent, entry)),
                Resolution::Reject(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(&HandlerUrls::from_base("http://assistant:5001"))
    }

    #[test]
    fn rag_routes_to_json_handler() {
        let table = table();
        let Resolution::Forward(entry) = table.resolve(Intent::Rag) else {
            panic!("rag must forward");
        };
        assert_eq!(entry.url, "http://assistant:5001/assistant/rag");
        assert_eq!(entry.shape, PayloadShape::Json);
    }

    #[test]
    fn pdf_routes_to_multipart_handler() {
        let table = table();
        let Resolution::Forward(entry) = table.resolve(Intent::PdfAnalysis) else {
            panic!("pdf must forward");
        };
        assert_eq!(entry.url, "http://assistant:5001/assistant/analyze-pdf");
        assert_eq!(entry.shape, PayloadShape::Multipart);
    }

    #[test]
    fn shopping_routes_to_json_handler() {
        let table = table();
        let Resolution::Forward(entry) = table.resolve(Intent::Shopping) else {
            panic!("shopping must forward");
        };
        assert_eq!(entry.url, "http://assistant:5001/assistant/shopping-advisor");
        assert_eq!(entry.shape, PayloadShape::Json);
    }

    #[test]
    fn unreasonable_always_rejects() {
        assert_eq!(
            table().resolve(Intent::Unreasonable),
            Resolution::Reject(Rejection {
                reason: REJECTION_MESSAGE
            })
        );
    }

    #[test]
    fn every_intent_but_unreasonable_has_one_entry() {
        let table = table();
        let entries = table.entries();
        assert_eq!(entries.len(), Intent::ALL.len() - 1);
        assert!(entries.iter().all(|(intent, _)| *intent != Intent::Unreasonable));
    }
}
