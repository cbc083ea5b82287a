//! Deterministic grouping of candidates by hazard index.

use std::fmt;

/// Group identifier; equals the palette index.
pub type GroupId = usize;

/// Number of palette entries (and groups).
pub const PALETTE_SIZE: usize = 3;

/// `groupId = index mod PALETTE_SIZE`.
#[inline]
pub fn classify(index: usize) -> GroupId {
    index % PALETTE_SIZE
}

/// Fixed candidate palette, in group order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; PALETTE_SIZE] = [Color::Red, Color::Green, Color::Yellow];

    /// Color of group `g`; `None` outside the palette.
    pub fn from_group(g: GroupId) -> Option<Color> {
        Self::ALL.get(g).copied()
    }

    pub fn group(self) -> GroupId {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Yellow => 2,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Color::Red => "#FF6347",
            Color::Green => "#32CD32",
            Color::Yellow => "#FFD700",
        }
    }

    /// Case-insensitive parse of the hex form.
    pub fn from_hex(s: &str) -> Option<Color> {
        Self::ALL
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(s))
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn palette_round_trips_through_hex_and_group() {
        for c in Color::ALL {
            assert_eq!(Color::from_hex(c.hex()), Some(c));
            assert_eq!(Color::from_group(c.group()), Some(c));
        }
        assert_eq!(Color::from_hex("#ff6347"), Some(Color::Red));
        assert_eq!(Color::from_hex("#000000"), None);
        assert_eq!(Color::from_group(PALETTE_SIZE), None);
    }

    #[test]
    fn first_indices_cycle_palette() {
        let groups: Vec<_> = (0..7).map(classify).collect();
        assert_eq!(groups, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    proptest! {
        #[test]
        fn classify_is_index_mod_palette(i in any::<usize>()) {
            prop_assert_eq!(classify(i), i % PALETTE_SIZE);
            prop_assert!(Color::from_group(classify(i)).is_some());
        }
    }
}
