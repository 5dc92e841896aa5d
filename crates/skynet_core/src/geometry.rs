//! Planar shapes, footprints and the safe region.
//!
//! Regions are kept in constructive form: a bounding rectangle minus a list
//! of holes. Point containment is exact, and subtracting a shape that is
//! already a hole leaves the region unchanged.

use serde::{Deserialize, Serialize};

use crate::math::{normal_absolute_angle, Vec2};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle `[0, width] × [0, height]`.
    #[must_use]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Shrink every side by `margin`. Collapses to a degenerate rectangle
    /// at the centre if the margin is larger than half a side.
    #[must_use]
    pub fn shrink(self, margin: f64) -> Self {
        let centre = self.centre();
        let min = Vec2::new(
            (self.min.x + margin).min(centre.x),
            (self.min.y + margin).min(centre.y),
        );
        let max = Vec2::new(
            (self.max.x - margin).max(centre.x),
            (self.max.y - margin).max(centre.y),
        );
        Self::new(min, max)
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Centre point.
    #[must_use]
    pub fn centre(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(
            Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }
}

/// A primitive danger shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Filled disc.
    Circle {
        /// Centre of the disc.
        centre: Vec2,
        /// Radius of the disc.
        radius: f64,
    },
    /// Filled rectangle.
    Rect(Rect),
    /// Ring slice between two radii, swept clockwise from `start` by `sweep`.
    AnnularSector {
        /// Apex of the slice.
        centre: Vec2,
        /// Inner radius (may be zero for a full pie slice).
        inner: f64,
        /// Outer radius.
        outer: f64,
        /// Start bearing, radians.
        start: f64,
        /// Clockwise sweep, radians in `[0, 2π]`.
        sweep: f64,
    },
}

impl Shape {
    /// Point containment (boundary inclusive).
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            Shape::Circle { centre, radius } => centre.distance_squared(p) <= radius * radius,
            Shape::Rect(rect) => rect.contains(p),
            Shape::AnnularSector {
                centre,
                inner,
                outer,
                start,
                sweep,
            } => {
                let d = centre.distance(p);
                if d < inner || d > outer {
                    return false;
                }
                if d <= f64::EPSILON {
                    // the apex only belongs to a slice with no hole
                    return inner <= 0.0;
                }
                normal_absolute_angle(centre.bearing_to(p) - start) <= sweep
            }
        }
    }

    /// Axis-aligned bounds. Sectors use the bounds of their outer circle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match *self {
            Shape::Circle { centre, radius } => Rect::new(
                Vec2::new(centre.x - radius, centre.y - radius),
                Vec2::new(centre.x + radius, centre.y + radius),
            ),
            Shape::Rect(rect) => rect,
            Shape::AnnularSector { centre, outer, .. } => Rect::new(
                Vec2::new(centre.x - outer, centre.y - outer),
                Vec2::new(centre.x + outer, centre.y + outer),
            ),
        }
    }
}

/// Union of shapes an obstacle occupies at some tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Footprint {
    shapes: Vec<Shape>,
}

impl Footprint {
    /// Empty footprint.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Footprint made of a single shape.
    #[must_use]
    pub fn single(shape: Shape) -> Self {
        Self {
            shapes: vec![shape],
        }
    }

    /// Add a shape to the union.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Shapes making up this footprint.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// True when no shapes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Bounds of the union, if any shape is present.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(Rect::union)
    }

    /// True when the footprint covers a region of positive width and height.
    #[must_use]
    pub fn is_substantial(&self) -> bool {
        self.bounds()
            .is_some_and(|b| b.width() > 0.0 && b.height() > 0.0)
    }

    /// Point containment against the union.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        self.shapes.iter().any(|s| s.contains(p))
    }
}

/// Arena rectangle minus every subtracted footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeRegion {
    bounds: Rect,
    holes: Vec<Shape>,
}

impl SafeRegion {
    /// Region covering the whole of `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            holes: Vec::new(),
        }
    }

    /// Remove a footprint from the region.
    ///
    /// Shapes already subtracted are skipped, so subtracting the same
    /// footprint twice yields the same region as subtracting it once.
    pub fn subtract(&mut self, footprint: &Footprint) {
        for shape in footprint.shapes() {
            if !self.holes.contains(shape) {
                self.holes.push(*shape);
            }
        }
    }

    /// True when `p` is inside the bounds and outside every hole.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        self.bounds.contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }

    /// Outer rectangle of the region.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Subtracted shapes, in subtraction order.
    #[must_use]
    pub fn holes(&self) -> &[Shape] {
        &self.holes
    }
}
