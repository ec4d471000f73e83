// src/card/splitter.rs
//! Partitions an oversized card into cards Teams will accept.
//!
//! Sections are packed greedily in arrival order: a fragment is closed only
//! when the next section would break the byte or section limit. Sections are
//! never reordered, so concatenating the fragments' sections gives back the
//! original list.

use crate::constants::{TEAMS_MAX_CARD_BYTES, TEAMS_MAX_CARD_SECTIONS};
use crate::error::SplitError;
use crate::model::{RenderedDocument, Section};

/// Structural limits a destination imposes on every card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLimits {
    /// Largest compact JSON encoding accepted, in bytes.
    pub max_bytes: usize,
    /// Most sections accepted in one card.
    pub max_sections: usize,
}

impl CardLimits {
    pub const TEAMS: CardLimits = CardLimits {
        max_bytes: TEAMS_MAX_CARD_BYTES,
        max_sections: TEAMS_MAX_CARD_SECTIONS,
    };
}

impl Default for CardLimits {
    fn default() -> Self {
        Self::TEAMS
    }
}

/// Splits `card` into the fewest in-order fragments that respect `limits`.
///
/// Always returns at least one fragment. A card without sections yields one
/// fragment with an empty section list. A section too large to fit even on
/// its own is placed alone in its own fragment; that fragment exceeds
/// `max_bytes` and nothing smaller can be produced.
pub fn split_card(
    card: &RenderedDocument,
    limits: CardLimits,
) -> Result<Vec<RenderedDocument>, SplitError> {
    let base_bytes = card.with_sections(Vec::new()).serialized_len()?;
    if base_bytes > limits.max_bytes {
        return Err(SplitError::BaseTooLarge {
            base_bytes,
            max_bytes: limits.max_bytes,
        });
    }

    let mut fragments = Vec::new();
    let mut buffer: Vec<Section> = Vec::new();
    let mut buffer_bytes = base_bytes;

    for (index, section) in card.sections().iter().enumerate() {
        let section_bytes = serde_json::to_vec(section)?.len();
        // one comma between array elements
        let separator = usize::from(!buffer.is_empty());
        let fits = buffer_bytes + separator + section_bytes <= limits.max_bytes
            && buffer.len() < limits.max_sections;

        if fits || buffer.is_empty() {
            buffer_bytes += separator + section_bytes;
            buffer.push(section.clone());
        } else {
            fragments.push(card.with_sections(std::mem::take(&mut buffer)));
            buffer_bytes = base_bytes + section_bytes;
            buffer.push(section.clone());
        }

        if base_bytes + section_bytes > limits.max_bytes {
            log::warn!(
                "Section {} alone takes {} bytes with the card fields, above the {} byte limit; sending it unsplit",
                index + 1,
                base_bytes + section_bytes,
                limits.max_bytes
            );
        }
    }

    fragments.push(card.with_sections(buffer));

    log::debug!(
        "Split card of {} sections into {} fragment(s)",
        card.section_count(),
        fragments.len()
    );

    Ok(fragments)
}
