//! Defect label normalization
//!
//! The perception agent describes defects in free text, usually Russian
//! ("царапина на крыле", "умеренная"). These tables map that text onto the
//! closed listing vocabulary.

use crate::models::{DefectCounts, DefectItem, DefectType, Severity};
use crate::types::RawDefect;

/// Severity spellings accepted from agents and from the listing form
const SEVERITY_LABELS: [(&str, Severity); 6] = [
    ("слабая", Severity::Weak),
    ("weak", Severity::Weak),
    ("умеренная", Severity::Moderate),
    ("moderate", Severity::Moderate),
    ("сильная", Severity::Strong),
    ("strong", Severity::Strong),
];

/// Whole-word defect names, matched in order against the label
const DEFECT_TYPE_LABELS: [(&str, DefectType); 8] = [
    ("царапина", DefectType::Scratch),
    ("вмятина", DefectType::Dent),
    ("скол", DefectType::Chip),
    ("коррозия", DefectType::Corrosion),
    ("загрязнение", DefectType::Chip),
    ("окрашена", DefectType::Painted),
    ("перекрашена", DefectType::Painted),
    ("заменена", DefectType::Replaced),
];

/// Word stems tried when no whole-word name matched
const DEFECT_TYPE_STEMS: [(&[&str], DefectType); 6] = [
    (&["царапин"], DefectType::Scratch),
    (&["вмятин", "деформац"], DefectType::Dent),
    (&["скол"], DefectType::Chip),
    (&["коррози", "ржавчин"], DefectType::Corrosion),
    (&["окраш", "перекраш"], DefectType::Painted),
    (&["замен"], DefectType::Replaced),
];

const CANONICAL_TYPES: [DefectType; 6] = [
    DefectType::Scratch,
    DefectType::Dent,
    DefectType::Chip,
    DefectType::Corrosion,
    DefectType::Replaced,
    DefectType::Painted,
];

/// Recognized severity, or `None` for anything else
pub fn severity_from_label(label: &str) -> Option<Severity> {
    let label = label.trim().to_lowercase();
    SEVERITY_LABELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, severity)| *severity)
}

/// Map a free-text defect label onto the listing vocabulary
///
/// Canonical English names pass through. Otherwise the whole-word table is
/// consulted (either string containing the other), then the stems.
/// Anything unrecognized, including an empty label, is a scratch.
pub fn normalize_defect_type(label: &str) -> DefectType {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return DefectType::Scratch;
    }

    if let Some(canonical) = CANONICAL_TYPES.iter().find(|t| t.as_str() == label) {
        return *canonical;
    }

    if let Some((_, defect_type)) = DEFECT_TYPE_LABELS
        .iter()
        .find(|(name, _)| label.contains(name) || name.contains(label.as_str()))
    {
        return *defect_type;
    }

    DEFECT_TYPE_STEMS
        .iter()
        .find(|(stems, _)| stems.iter().any(|stem| label.contains(stem)))
        .map(|(_, defect_type)| *defect_type)
        .unwrap_or(DefectType::Scratch)
}

/// Convert raw agent defects into listing items
///
/// Unknown severities display as weak.
pub fn map_defects(raw: &[RawDefect]) -> Vec<DefectItem> {
    raw.iter()
        .map(|defect| DefectItem {
            defect_type: normalize_defect_type(&defect.defect_type),
            severity: severity_from_label(&defect.severity).unwrap_or_default(),
            location: defect.location.trim().to_string(),
            body_part: defect.body_part.trim().to_string(),
        })
        .collect()
}

/// Severity counts for pricing; unrecognized severities are not counted
pub fn count_raw_severities(raw: &[RawDefect]) -> DefectCounts {
    DefectCounts::tally(raw.iter().map(|d| severity_from_label(&d.severity)))
}

/// Severity counts of an edited listing defect list
pub fn count_listed_severities(items: &[DefectItem]) -> DefectCounts {
    DefectCounts::tally(items.iter().map(|d| Some(d.severity)))
}
