use serde_derive::{Deserialize, Serialize};

use crate::errors::*;

/// Identifies a terrain, a family of connected tile variants that join up with their neighbours.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TerrainId(pub u32);

/// Identifies a single standalone tile, used for the start and end markers.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TileId(pub u32);

pub const PASSAGE_TERRAIN: TerrainId = TerrainId(0);
pub const WALL_TERRAIN: TerrainId = TerrainId(1);
pub const START_TILE: TileId = TileId(0);
pub const END_TILE: TileId = TileId(1);

/// Which structural layers of a maze are shown and what they are drawn with.
///
/// A style has to show at least passages or walls to be renderable, see `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub has_passages: bool,
    pub has_walls: bool,
    pub has_markers: bool,
    pub passage_terrain: TerrainId,
    pub wall_terrain: TerrainId,
    pub start_tile: TileId,
    pub end_tile: TileId,
}

impl Default for Style {
    fn default() -> Self {
        Style::classic()
    }
}

impl Style {
    fn with_layers(name: &str, has_passages: bool, has_walls: bool, has_markers: bool) -> Style {
        Style {
            name: name.to_owned(),
            has_passages,
            has_walls,
            has_markers,
            passage_terrain: PASSAGE_TERRAIN,
            wall_terrain: WALL_TERRAIN,
            start_tile: START_TILE,
            end_tile: END_TILE,
        }
    }

    /// Passages, walls and the start and end markers.
    pub fn classic() -> Style {
        Style::with_layers("classic", true, true, true)
    }

    /// Only the walls and markers, passages are left as background.
    pub fn walls_only() -> Style {
        Style::with_layers("walls-only", false, true, true)
    }

    /// Only the passages and markers, walls are left as background.
    pub fn passages_only() -> Style {
        Style::with_layers("passages-only", true, false, true)
    }

    /// Shows nothing, never valid.
    pub fn bare() -> Style {
        Style::with_layers("bare", false, false, false)
    }

    pub fn by_name(name: &str) -> Option<Style> {
        match name {
            "classic" => Some(Style::classic()),
            "walls-only" => Some(Style::walls_only()),
            "passages-only" => Some(Style::passages_only()),
            "bare" => Some(Style::bare()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.has_passages || self.has_walls
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ErrorKind::InvalidStyle(self.name.clone()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_styles_without_passages_and_walls_are_invalid() {
        for &(passages, walls, markers) in &[(true, true, true),
                                             (true, false, false),
                                             (false, true, false),
                                             (true, true, false)] {
            let style = Style::with_layers("custom", passages, walls, markers);
            assert!(style.validate().is_ok());
        }

        for &markers in &[true, false] {
            let style = Style::with_layers("custom", false, false, markers);
            match style.validate() {
                Err(Error(ErrorKind::InvalidStyle(name), _)) => assert_eq!(name, "custom"),
                other => panic!("expected an invalid style error, got {:?}", other),
            }
        }
    }

    #[test]
    fn presets_by_name() {
        for name in &["classic", "walls-only", "passages-only", "bare"] {
            let style = Style::by_name(name).expect("known preset");
            assert_eq!(&style.name, name);
        }
        assert!(Style::by_name("plaid").is_none());
        assert!(!Style::bare().is_valid());
        assert!(Style::walls_only().is_valid());
    }
}
