// Core data structures for the open decks night

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::scheduler::error::NightError;
use crate::utils::normalize_name;

// ============================================================================
// Category
// ============================================================================

/// Self-declared category of a signup
///
/// `Male` and `Duo` are subject to the per-window proportion cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Male,
    Female,
    NonBinary,
    Duo,
    Undisclosed,
}

impl Category {
    /// Get all categories
    pub fn all() -> Vec<Self> {
        vec![
            Self::Male,
            Self::Female,
            Self::NonBinary,
            Self::Duo,
            Self::Undisclosed,
        ]
    }

    /// Get category ID
    pub fn id(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non_binary",
            Self::Duo => "duo",
            Self::Undisclosed => "undisclosed",
        }
    }

    /// Human label used on the board and in exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::NonBinary => "Non-binary",
            Self::Duo => "Duo",
            Self::Undisclosed => "Prefer not to say",
        }
    }

    /// Whether this category counts toward the window cap
    pub fn is_maleish(&self) -> bool {
        matches!(self, Self::Male | Self::Duo)
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Some(Self::Male),
            "female" | "f" | "woman" => Some(Self::Female),
            "non_binary" | "non-binary" | "nonbinary" | "nb" => Some(Self::NonBinary),
            "duo" | "pair" | "b2b" => Some(Self::Duo),
            "undisclosed" | "prefer_not_to_say" | "none" | "-" => Some(Self::Undisclosed),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Category {
    type Err = NightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            NightError::validation("category", format!("Unknown category '{s}'"))
        })
    }
}

// ============================================================================
// Window Identifier
// ============================================================================

/// One of the two playing windows of a night
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowId {
    /// 23:00 – 01:00
    First,
    /// 01:00 – 03:00
    Second,
}

impl WindowId {
    /// Both windows in playing order
    pub fn all() -> [Self; 2] {
        [Self::First, Self::Second]
    }

    /// The other window of the night
    pub fn other(&self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Get numeric index (0-based)
    pub fn index(&self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Get window ID as string
    pub fn id(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
        }
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for WindowId {
    type Err = NightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "first" | "window1" | "w1" => Ok(Self::First),
            "2" | "second" | "window2" | "w2" => Ok(Self::Second),
            _ => Err(NightError::validation(
                "window",
                format!("Unknown window '{s}'. Expected 1 or 2"),
            )),
        }
    }
}

// ============================================================================
// Participant
// ============================================================================

/// A signed-up artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    /// Trimmed, whitespace-collapsed display name
    pub display_name: String,
    pub category: Category,
    pub signed_up_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(display_name: String, category: Category, signed_up_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            category,
            signed_up_at,
        }
    }

    /// De-duplication key
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.display_name)
    }
}

/// Flat record handed to the CSV writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRecord {
    pub name: String,
    pub category: Category,
    pub signed_up_at: DateTime<Utc>,
}

// ============================================================================
// Slot & Assignment
// ============================================================================

/// A fixed-length playing slot inside a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A participant placed into a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub slot_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub participant_name: String,
    /// Category at assignment time; `None` for free-text replacements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Assignment {
    pub fn new(slot: &Slot, participant_name: String, category: Option<Category>) -> Self {
        Self {
            slot_id: slot.id,
            start: slot.start,
            end: slot.end,
            participant_name,
            category,
        }
    }

    pub fn is_maleish(&self) -> bool {
        self.category.is_some_and(|c| c.is_maleish())
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.participant_name)
    }
}

/// Assignment lists for both windows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAssignments {
    pub first: Vec<Assignment>,
    pub second: Vec<Assignment>,
}

impl WindowAssignments {
    pub fn get(&self, window: WindowId) -> &[Assignment] {
        match window {
            WindowId::First => &self.first,
            WindowId::Second => &self.second,
        }
    }

    pub fn get_mut(&mut self, window: WindowId) -> &mut Vec<Assignment> {
        match window {
            WindowId::First => &mut self.first,
            WindowId::Second => &mut self.second,
        }
    }

    /// Iterate assignments of both windows
    pub fn iter_all(&self) -> impl Iterator<Item = &Assignment> {
        self.first.iter().chain(self.second.iter())
    }
}

// ============================================================================
// Night State
// ============================================================================

/// Aggregate root for one session
///
/// Operations never mutate a shared instance; they build a new value which
/// the store swaps in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightState {
    /// Signups in submission order
    pub signups: Vec<Participant>,
    pub assignments: WindowAssignments,
    pub last_draw_at: Option<DateTime<Utc>>,
    pub last_signup_at: Option<DateTime<Utc>>,
}

impl NightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a signup by normalized display name
    pub fn find_signup_by_name(&self, name: &str) -> Option<&Participant> {
        let key = normalize_name(name);
        self.signups.iter().find(|p| p.normalized_name() == key)
    }

    /// Normalized names currently assigned in a window
    pub fn assigned_names(&self, window: WindowId) -> Vec<String> {
        self.assignments
            .get(window)
            .iter()
            .map(Assignment::normalized_name)
            .collect()
    }

    pub fn is_window_drawn(&self, window: WindowId) -> bool {
        !self.assignments.get(window).is_empty()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
