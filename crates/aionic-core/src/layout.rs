//! Scene layout - where each focus target sits and where the camera goes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Catalog;

/// A point in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Viewport class; mobile stacks the panels vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Mobile,
}

/// Symbolic camera destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    /// The avatar panel.
    Avatar,
    /// The simulated terminal.
    OutputConsole,
    /// A command glyph, by command id.
    Command(String),
}

impl FocusTarget {
    /// Parse a reserved tag or treat the value as a command id.
    pub fn parse(value: &str) -> Self {
        match value {
            "avatar" => FocusTarget::Avatar,
            "output-console" | "terminal" => FocusTarget::OutputConsole,
            id => FocusTarget::Command(id.to_string()),
        }
    }

    pub fn command_id(&self) -> Option<&str> {
        match self {
            FocusTarget::Command(id) => Some(id),
            _ => None,
        }
    }

    /// Command glyphs get an impact shake after the camera arrives.
    pub fn is_command(&self) -> bool {
        matches!(self, FocusTarget::Command(_))
    }
}

impl fmt::Display for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusTarget::Avatar => write!(f, "avatar"),
            FocusTarget::OutputConsole => write!(f, "output-console"),
            FocusTarget::Command(id) => write!(f, "command:{}", id),
        }
    }
}

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

const GLYPH_SPACING: f32 = 2.5;
const GLYPH_CAMERA_Z: f32 = 4.0;
const AVATAR_CAMERA_Z: f32 = 5.0;

/// Resolves focus targets to camera poses for one viewport.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    viewport: Viewport,
}

impl Layout {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn avatar_anchor(&self) -> Vec3 {
        match self.viewport {
            Viewport::Desktop => Vec3::new(-5.0, 0.0, 0.0),
            Viewport::Mobile => Vec3::new(0.0, 3.0, 0.0),
        }
    }

    pub fn grid_anchor(&self) -> Vec3 {
        match self.viewport {
            Viewport::Desktop => Vec3::new(2.5, 1.0, 0.0),
            Viewport::Mobile => Vec3::new(0.0, -1.0, 0.0),
        }
    }

    pub fn console_anchor(&self) -> Vec3 {
        match self.viewport {
            Viewport::Desktop => Vec3::new(7.5, 0.0, 0.0),
            Viewport::Mobile => Vec3::new(0.0, -5.5, 0.0),
        }
    }

    fn grid_columns(&self) -> usize {
        match self.viewport {
            Viewport::Desktop => 6,
            Viewport::Mobile => 3,
        }
    }

    fn console_camera_z(&self) -> f32 {
        match self.viewport {
            Viewport::Desktop => 10.0,
            Viewport::Mobile => 8.0,
        }
    }

    /// Position of the glyph at `index` in the command grid.
    pub fn glyph_position(&self, index: usize) -> Vec3 {
        let cols = self.grid_columns();
        let row = index / cols;
        let col = index % cols;

        let local_x = col as f32 * GLYPH_SPACING - ((cols - 1) as f32 * GLYPH_SPACING) / 2.0;
        let local_y = -(row as f32) * GLYPH_SPACING;

        let anchor = self.grid_anchor();
        Vec3::new(anchor.x + local_x, anchor.y + local_y, anchor.z)
    }

    /// Camera pose for a target, or `None` when the target has no position.
    pub fn resolve(&self, target: &FocusTarget, catalog: &Catalog) -> Option<CameraPose> {
        let (look_at, camera_z) = match target {
            FocusTarget::Avatar => (self.avatar_anchor(), AVATAR_CAMERA_Z),
            FocusTarget::OutputConsole => (self.console_anchor(), self.console_camera_z()),
            FocusTarget::Command(id) => {
                let index = catalog.position(id)?;
                (self.glyph_position(index), GLYPH_CAMERA_Z)
            }
        };

        Some(CameraPose {
            position: Vec3::new(look_at.x, look_at.y, camera_z),
            look_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserved_tags() {
        assert_eq!(FocusTarget::parse("avatar"), FocusTarget::Avatar);
        assert_eq!(FocusTarget::parse("terminal"), FocusTarget::OutputConsole);
        assert_eq!(FocusTarget::parse("output-console"), FocusTarget::OutputConsole);
        assert_eq!(FocusTarget::parse("3"), FocusTarget::Command("3".to_string()));
    }

    #[test]
    fn test_desktop_glyph_row_is_centred() {
        let layout = Layout::new(Viewport::Desktop);
        let first = layout.glyph_position(0);
        let last = layout.glyph_position(5);

        assert_eq!(first.x, 2.5 - 6.25);
        assert_eq!(last.x, 2.5 + 6.25);
        assert_eq!(first.y, 1.0);
        assert_eq!(layout.glyph_position(6).y, 1.0 - 2.5);
    }

    #[test]
    fn test_mobile_grid_wraps_after_three() {
        let layout = Layout::new(Viewport::Mobile);
        let fourth = layout.glyph_position(3);
        assert_eq!(fourth.x, -2.5);
        assert_eq!(fourth.y, -1.0 - 2.5);
    }

    #[test]
    fn test_resolve_targets() {
        let catalog = Catalog::builtin();
        let layout = Layout::new(Viewport::Desktop);

        let console = layout.resolve(&FocusTarget::OutputConsole, &catalog).unwrap();
        assert_eq!(console.look_at, Vec3::new(7.5, 0.0, 0.0));
        assert_eq!(console.position.z, 10.0);

        let glyph = layout
            .resolve(&FocusTarget::Command("1".to_string()), &catalog)
            .unwrap();
        assert_eq!(glyph.position.z, 4.0);
        assert_eq!(glyph.look_at, layout.glyph_position(0));

        assert!(layout
            .resolve(&FocusTarget::Command("nope".to_string()), &catalog)
            .is_none());
    }
}
