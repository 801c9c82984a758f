use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::model::{FieldSlot, ParsedFields};

pub const TOKEN_DELIMITER: char = '|';

enum Shape {
    Contains(char),
    Pattern(Regex),
}

struct ShapeRule {
    slot: FieldSlot,
    shape: Shape,
}

impl ShapeRule {
    fn pattern(slot: FieldSlot, pattern: &str) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|err| panic!("invalid {slot} pattern '{pattern}': {err}"));
        Self {
            slot,
            shape: Shape::Pattern(regex),
        }
    }

    fn matches(&self, token: &str) -> bool {
        match &self.shape {
            Shape::Contains(ch) => token.contains(*ch),
            Shape::Pattern(regex) => regex.is_match(token),
        }
    }
}

// Priority order matters: the shapes overlap (a serial also looks like a
// device label, a work order also looks like a serial).
static SHAPE_RULES: Lazy<Vec<ShapeRule>> = Lazy::new(|| {
    vec![
        ShapeRule {
            slot: FieldSlot::Email,
            shape: Shape::Contains('@'),
        },
        ShapeRule::pattern(FieldSlot::PhoneNumber, r"\+?[0-9][0-9\s()\-]{5,}"),
        ShapeRule::pattern(FieldSlot::WorkOrder, r"(?i)^WO[A-Za-z0-9_]+"),
        ShapeRule::pattern(FieldSlot::DeviceLabel, r"(?i)^[A-Z]{2,}[A-Z0-9_-]*[0-9]+"),
        ShapeRule::pattern(FieldSlot::Serial, r"^[A-Za-z0-9]{5,}$"),
    ]
});

/// Where a single token of a user info string ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAssignment {
    pub token: String,
    /// `None` when the token was dropped.
    pub slot: Option<FieldSlot>,
}

/// Splits a user info string into its trimmed, non-empty tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(TOKEN_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extracts typed device attributes from a pipe-delimited user info string.
///
/// Never fails: absent or unrecognizable input yields an empty
/// [`ParsedFields`]. Each slot keeps the leftmost token that claimed it.
pub fn parse_user_info<'a>(text: impl Into<Option<&'a str>>) -> ParsedFields {
    let mut fields = ParsedFields::default();
    for assignment in assign_tokens(text) {
        if let Some(slot) = assignment.slot {
            *fields.slot_mut(slot) = Some(assignment.token);
        }
    }
    fields
}

/// Runs the slot assignment and reports the outcome for every token,
/// including the ones that were dropped.
pub fn assign_tokens<'a>(text: impl Into<Option<&'a str>>) -> Vec<TokenAssignment> {
    let Some(text) = text.into() else {
        return Vec::new();
    };

    let mut filled = ParsedFields::default();
    let mut assignments = Vec::new();

    for token in tokenize(text) {
        let slot = claim_slot(&filled, token);
        if let Some(slot) = slot {
            *filled.slot_mut(slot) = Some(token.to_string());
        }
        assignments.push(TokenAssignment {
            token: token.to_string(),
            slot,
        });
    }

    assignments
}

/// First shape whose slot is still open wins. A token that matched some
/// shape never falls back to the name slot.
fn claim_slot(filled: &ParsedFields, token: &str) -> Option<FieldSlot> {
    let mut matched_any = false;

    for rule in SHAPE_RULES.iter() {
        if !rule.matches(token) {
            continue;
        }
        matched_any = true;
        if filled.get(rule.slot).is_none() {
            return Some(rule.slot);
        }
    }

    if !matched_any && filled.get(FieldSlot::FullName).is_none() {
        return Some(FieldSlot::FullName);
    }

    None
}

/// The shape a token has, ignoring which slots are already taken.
pub fn classify_token(token: &str) -> Option<FieldSlot> {
    SHAPE_RULES
        .iter()
        .find(|rule| rule.matches(token))
        .map(|rule| rule.slot)
}
