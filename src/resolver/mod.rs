//! # Stage Definition: Catalog Identifier Resolution
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: Recognized [`RawRows`] plus a [`CatalogStore`] and an
//!   [`Embedder`] collaborator.
//! - **Outputs**: One [`ResolvedRow`] per input row, tagged with the strategy
//!   that matched it ([`MatchKind`]) or `NotFound`.
//! - **Logging**: Debug-level trace of every strategy decision per row.
//! - **Invariants**:
//!     - Strategy order is fixed: `EXACT_ID`, `ID_IN_TEXT`, `TEXT_MATCH`,
//!       `VECTOR_MATCH`. The first hit wins; later strategies never override
//!       an earlier one.
//!     - The literal code `"0"` is a placeholder, never a usable identifier.
//!     - Text strategies only run for descriptions longer than three
//!       characters; the embedder is not called below that length.
//!     - A row no strategy matches resolves to `NotFound`, not an error.

use std::sync::Arc;

use crate::core::errors::BomError;
use crate::core::traits::{CatalogStore, Embedder};
use crate::domain::{CatalogEntry, CatalogMatch, MatchKind, RawRows, ResolvedRow};

/// Minimum description length (after trimming) for the text and vector
/// strategies. Shorter strings are codes or noise, not descriptions.
const MIN_TEXT_QUERY_LEN: usize = 4;

/// Resolves recognized rows to catalog entries through an ordered chain of
/// increasingly fuzzy strategies.
pub struct IdentifierResolver {
    catalog: Arc<dyn CatalogStore>,
    embedder: Arc<dyn Embedder>,
}

impl IdentifierResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { catalog, embedder }
    }

    /// Resolves every row of `rows`, preserving order. Collaborator failures
    /// abort the batch; an unmatched row does not.
    pub fn resolve_rows(&self, rows: &RawRows) -> Result<Vec<ResolvedRow>, BomError> {
        rows.rows
            .iter()
            .map(|row| {
                let found = self.search(row.raw_code.as_deref(), row.description.as_deref())?;
                let (matched_id, match_kind) = match found {
                    Some(m) => {
                        tracing::debug!(
                            position = row.position,
                            catalog_id = m.entry.internal_id,
                            strategy = %m.kind,
                            "resolved row"
                        );
                        (Some(m.entry.internal_id), m.kind)
                    }
                    None => {
                        tracing::debug!(position = row.position, "row matched no catalog entry");
                        (None, MatchKind::NotFound)
                    }
                };
                Ok(ResolvedRow {
                    row: row.clone(),
                    matched_id,
                    match_kind,
                })
            })
            .collect()
    }

    /// Runs the strategy chain for one code/description pair.
    pub fn search(
        &self,
        raw_code: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<CatalogMatch>, BomError> {
        if let Some(code) = raw_code.map(str::trim).filter(|c| !c.is_empty()) {
            let normalized = normalize_code(code);
            // "0" is what recognizers print for an empty code cell.
            if !normalized.is_empty() && normalized != "0" {
                if let Some(entry) = self.match_exact_id(&normalized)? {
                    return Ok(Some(CatalogMatch {
                        entry,
                        kind: MatchKind::ExactId,
                    }));
                }
                if let Some(entry) = self.catalog.first_entry_with_text(&code.to_lowercase())? {
                    return Ok(Some(CatalogMatch {
                        entry,
                        kind: MatchKind::IdInText,
                    }));
                }
            }
        }

        let Some(text) = description
            .map(str::trim)
            .filter(|t| t.chars().count() >= MIN_TEXT_QUERY_LEN)
        else {
            return Ok(None);
        };
        let text = text.to_lowercase();

        if let Some(entry) = self.catalog.first_entry_with_text(&text)? {
            return Ok(Some(CatalogMatch {
                entry,
                kind: MatchKind::TextMatch,
            }));
        }

        let vector = self.embedder.embed(&text)?;
        Ok(self
            .catalog
            .nearest_by_embedding(&vector)?
            .map(|entry| CatalogMatch {
                entry,
                kind: MatchKind::VectorMatch,
            }))
    }

    /// `EXACT_ID`: the catalog code (or name) must occur inside the
    /// normalized query and cover at least half of it, which tolerates
    /// recognizer noise glued onto a code without letting a two-character
    /// code claim an arbitrary long string. The longest qualifying code
    /// wins.
    fn match_exact_id(&self, normalized: &str) -> Result<Option<CatalogEntry>, BomError> {
        let candidates = self.catalog.find_code_candidates(normalized)?;
        Ok(candidates
            .into_iter()
            .filter(|entry| {
                let code_len = normalize_code(&entry.external_code).chars().count();
                code_len * 2 >= normalized.chars().count()
            })
            .max_by_key(|entry| normalize_code(&entry.external_code).chars().count()))
    }
}

/// Normalization applied to both query codes and catalog codes before
/// comparison: strip all whitespace, lowercase.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
