//! Layer visibility and grouping of candidates for rendering.
//!
//! `LayerPresenter` owns all visibility state: one flag per palette group
//! (hidden at start) and the hazard layer, which loads lazily on its first
//! toggle:
//!
//! ```text
//! Unloaded --toggle--> Loading --finish--> Visible <--toggle--> Hidden
//!              ^           |
//!              +--fail-----+
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::classify::{Color, GroupId, PALETTE_SIZE};
use crate::geojson::candidate_collection;
use crate::placement::{Candidate, CandidateSet};

/// Per-group visibility flags, indexed by group id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GroupVisibility {
    groups: [bool; PALETTE_SIZE],
}

impl GroupVisibility {
    pub fn is_visible(&self, g: GroupId) -> bool {
        self.groups.get(g).copied().unwrap_or(false)
    }

    fn flip(&mut self, g: GroupId) -> Option<bool> {
        let flag = self.groups.get_mut(g)?;
        *flag = !*flag;
        Some(*flag)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HazardLayerState {
    #[default]
    Unloaded,
    Loading,
    Visible,
    Hidden,
}

/// What the caller must do after `toggle_hazard_layer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardToggle {
    /// Load hazard geometry, then call `finish_hazard_load` (or `fail_hazard_load`).
    StartLoad,
    /// A load is already in flight; nothing to do.
    Pending,
    Shown,
    Hidden,
}

/// Candidates of one group, borrowed from a set.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateGroup<'a> {
    pub group: GroupId,
    pub color: Color,
    pub candidates: Vec<&'a Candidate>,
}

impl CandidateGroup<'_> {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// FeatureCollection of this group.
    pub fn to_geojson(&self) -> Value {
        candidate_collection(self.candidates.iter().copied())
    }
}

#[derive(Clone, Debug, Default)]
pub struct LayerPresenter {
    visibility: GroupVisibility,
    hazard_layer: HazardLayerState,
}

impl LayerPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self) -> GroupVisibility {
        self.visibility
    }

    pub fn hazard_layer(&self) -> HazardLayerState {
        self.hazard_layer
    }

    /// Partition `set` by group: one entry per palette color, possibly empty,
    /// candidates in set order.
    pub fn compose<'a>(&self, set: &'a CandidateSet) -> BTreeMap<GroupId, CandidateGroup<'a>> {
        let mut out: BTreeMap<GroupId, CandidateGroup<'a>> = Color::ALL
            .into_iter()
            .map(|color| {
                (
                    color.group(),
                    CandidateGroup {
                        group: color.group(),
                        color,
                        candidates: Vec::new(),
                    },
                )
            })
            .collect();
        for c in set {
            match out.get_mut(&c.group) {
                Some(g) => g.candidates.push(c),
                None => tracing::warn!(group = c.group, hazard = %c.source_hazard_id, "candidate outside palette"),
            }
        }
        out
    }

    /// Flip group `g`; returns the new flag, or `None` for a group outside the palette.
    pub fn toggle(&mut self, g: GroupId) -> Option<bool> {
        self.visibility.flip(g)
    }

    pub fn visible_groups(&self) -> Vec<GroupId> {
        (0..PALETTE_SIZE)
            .filter(|&g| self.visibility.is_visible(g))
            .collect()
    }

    /// Groups of `set` that are currently visible.
    pub fn visible_layers<'a>(&self, set: &'a CandidateSet) -> Vec<CandidateGroup<'a>> {
        self.compose(set)
            .into_values()
            .filter(|g| self.visibility.is_visible(g.group))
            .collect()
    }

    pub fn toggle_hazard_layer(&mut self) -> HazardToggle {
        let (next, action) = match self.hazard_layer {
            HazardLayerState::Unloaded => (HazardLayerState::Loading, HazardToggle::StartLoad),
            HazardLayerState::Loading => (HazardLayerState::Loading, HazardToggle::Pending),
            HazardLayerState::Visible => (HazardLayerState::Hidden, HazardToggle::Hidden),
            HazardLayerState::Hidden => (HazardLayerState::Visible, HazardToggle::Shown),
        };
        tracing::debug!(from = ?self.hazard_layer, to = ?next, "hazard layer toggled");
        self.hazard_layer = next;
        action
    }

    /// Load finished: the layer becomes visible. Ignored unless loading.
    pub fn finish_hazard_load(&mut self) -> bool {
        if self.hazard_layer != HazardLayerState::Loading {
            return false;
        }
        self.hazard_layer = HazardLayerState::Visible;
        true
    }

    /// Load failed: back to `Unloaded`, so the next toggle retries.
    pub fn fail_hazard_load(&mut self) -> bool {
        if self.hazard_layer != HazardLayerState::Loading {
            return false;
        }
        self.hazard_layer = HazardLayerState::Unloaded;
        true
    }

    pub fn hazard_visible(&self) -> bool {
        self.hazard_layer == HazardLayerState::Visible
    }

    pub fn hazard_caption(&self) -> &'static str {
        if self.hazard_visible() {
            "Hide hazards"
        } else {
            "Show hazards"
        }
    }
}
