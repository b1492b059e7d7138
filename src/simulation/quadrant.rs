//! Axis-aligned rectangular regions used as quadtree cells.
//!
//! A `Quadrant` is an immutable value. Splitting always happens at the
//! midpoint of each axis, and the four children tile the parent exactly:
//! every child shares the parent's outer bounds and the computed midpoint,
//! so no gap or overlap can appear from rounding.

use crate::error::ConfigError;
use crate::simulation::states::NVec2;

/// Side length of the default square domain `[0, 4] x [0, 4]`.
pub const DEFAULT_DOMAIN_SIDE: f64 = 4.0;

/// One of the four children of a quadrant.
///
/// The discriminant doubles as the child's slot index in a tree node:
/// bit 0 is set for the right half (x >= mid), bit 1 for the top half
/// (y >= mid).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    BotLeft = 0,
    BotRight = 1,
    TopLeft = 2,
    TopRight = 3,
}

impl ChildSlot {
    pub const ALL: [ChildSlot; 4] = [
        ChildSlot::BotLeft,
        ChildSlot::BotRight,
        ChildSlot::TopLeft,
        ChildSlot::TopRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrant {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Default for Quadrant {
    fn default() -> Self {
        Self::from_bounds(0.0, 0.0, DEFAULT_DOMAIN_SIDE, DEFAULT_DOMAIN_SIDE)
    }
}

impl Quadrant {
    /// Validated constructor for user supplied bounds.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self, ConfigError> {
        let finite = [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite());
        if !finite || x_min >= x_max || y_min >= y_max {
            return Err(ConfigError::InvalidDomain {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self::from_bounds(x_min, y_min, x_max, y_max))
    }

    /// Region `[0, x_dim] x [0, y_dim]`.
    pub fn from_dims(x_dim: f64, y_dim: f64) -> Result<Self, ConfigError> {
        Self::new(0.0, 0.0, x_dim, y_dim)
    }

    // Bounds produced by splitting a valid quadrant are valid by construction.
    fn from_bounds(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }
    pub fn y_min(&self) -> f64 {
        self.y_min
    }
    pub fn x_max(&self) -> f64 {
        self.x_max
    }
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn halfway_x(&self) -> f64 {
        self.x_min + (self.x_max - self.x_min) / 2.0
    }

    pub fn halfway_y(&self) -> f64 {
        self.y_min + (self.y_max - self.y_min) / 2.0
    }

    /// Side length used by the acceptance criterion (x extent).
    pub fn side(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn area(&self) -> f64 {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }

    /// Closed-interval containment on both axes.
    pub fn contains(&self, p: &NVec2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    pub fn top_left(&self) -> Quadrant {
        Self::from_bounds(self.x_min, self.halfway_y(), self.halfway_x(), self.y_max)
    }

    pub fn top_right(&self) -> Quadrant {
        Self::from_bounds(self.halfway_x(), self.halfway_y(), self.x_max, self.y_max)
    }

    pub fn bot_left(&self) -> Quadrant {
        Self::from_bounds(self.x_min, self.y_min, self.halfway_x(), self.halfway_y())
    }

    pub fn bot_right(&self) -> Quadrant {
        Self::from_bounds(self.halfway_x(), self.y_min, self.x_max, self.halfway_y())
    }

    pub fn child(&self, slot: ChildSlot) -> Quadrant {
        match slot {
            ChildSlot::BotLeft => self.bot_left(),
            ChildSlot::BotRight => self.bot_right(),
            ChildSlot::TopLeft => self.top_left(),
            ChildSlot::TopRight => self.top_right(),
        }
    }

    /// Route a point to a child: x against the midpoint first, then y.
    /// Points on a midpoint go to the high side.
    pub fn child_for(&self, p: &NVec2) -> ChildSlot {
        let right = p.x >= self.halfway_x();
        let top = p.y >= self.halfway_y();
        match (right, top) {
            (false, false) => ChildSlot::BotLeft,
            (true, false) => ChildSlot::BotRight,
            (false, true) => ChildSlot::TopLeft,
            (true, true) => ChildSlot::TopRight,
        }
    }
}
