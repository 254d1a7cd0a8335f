//! Axis-aligned collision boxes
//!
//! Every entity carries a [`CollisionBox`]: its scene position plus an offset
//! rectangle describing the collidable part of the sprite. The overlap test is
//! a free function so any two entities can be compared regardless of type.
//!
//! ```text
//!   pos
//!   +-------------+
//!   |   sprite    |
//!   |  +-------+  |   <- pos + offset
//!   |  |  box  |  |
//!   |  +-------+  |
//!   +-------------+
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Collidable rectangle attached to an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionBox {
    /// Entity position (sprite origin, scene units)
    pub pos: Vec2,
    /// Offset from `pos` to the top-left of the collidable region
    pub offset: Vec2,
    width: f32,
    height: f32,
}

impl CollisionBox {
    /// Create a box at the scene origin. Width and height must be positive.
    pub fn new(offset: Vec2, width: f32, height: f32) -> SimResult<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(SimError::InvalidBox { width, height });
        }
        Ok(Self {
            pos: Vec2::ZERO,
            offset,
            width,
            height,
        })
    }

    /// Same box placed at `pos`
    pub fn at(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Effective top-left corner of the collidable region
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos + self.offset
    }

    /// Effective bottom-right corner of the collidable region
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min() + Vec2::new(self.width, self.height)
    }
}

/// Check whether two boxes overlap.
///
/// Touching edges count as a collision. The vertical gap is measured from
/// whichever entity sits lower (by unoffset position) to the bottom of the
/// other one; the horizontal gap is only computed once the boxes share rows.
pub fn overlaps(a: &CollisionBox, b: &CollisionBox) -> bool {
    let a_min = a.min();
    let b_min = b.min();

    // Ties on the unoffset row fall back to the effective top so the
    // result does not depend on argument order.
    let gap_y = if (a.pos.y, a_min.y) > (b.pos.y, b_min.y) {
        a_min.y - b_min.y - b.height
    } else {
        b_min.y - a_min.y - a.height
    };
    if gap_y > 0.0 {
        return false;
    }

    let gap_x = if a_min.x > b_min.x {
        a_min.x - b_min.x - b.width
    } else {
        b_min.x - a_min.x - a.width
    };
    gap_x <= 0.0
}
