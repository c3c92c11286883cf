//! Reel-path geometry and scrub gestures
//!
//! The tape runs around both reels as a "stadium": two semicircles of radius
//! `r` whose centres are `straight` apart, joined by straight runs. A point on
//! that path is identified by its fraction of the perimeter, travelling
//! clockwise from the top-left:
//!
//! 1. top straight, left to right
//! 2. right semicircle, top to bottom
//! 3. bottom straight, right to left
//! 4. left semicircle, bottom to top
//!
//! Coordinates are relative to the left reel centre with y pointing down.

use std::f64::consts::PI;

/// A point in reel-local coordinates
pub type Point = (f64, f64);

/// Stadium-shaped tape path around two reels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReelPath {
    radius: f64,
    straight: f64,
}

impl ReelPath {
    /// Create a path from the reel radius and the distance between reel centres
    pub fn new(radius: f64, straight: f64) -> Self {
        Self {
            radius: radius.max(f64::EPSILON),
            straight: straight.max(0.0),
        }
    }

    /// Path whose straight runs are half a reel circumference long, so one
    /// full reel turn covers a quarter of the path
    pub fn with_radius(radius: f64) -> Self {
        Self::new(radius, PI * radius)
    }

    /// Reel radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Distance between the reel centres
    pub fn straight(&self) -> f64 {
        self.straight
    }

    /// Total path length
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.straight + PI * self.radius)
    }

    /// Fraction of the path, in [0, 1), nearest to a pointer position
    pub fn fraction_at(&self, x: f64, y: f64) -> f64 {
        let (r, d) = (self.radius, self.straight);
        let distance = if (0.0..=d).contains(&x) {
            if y <= 0.0 {
                x
            } else {
                d + PI * r + (d - x)
            }
        } else if x > d {
            let t = (x - d).atan2(-y);
            d + t * r
        } else {
            let u = (-x).atan2(y);
            2.0 * d + PI * r + u * r
        };
        (distance / self.perimeter()).rem_euclid(1.0)
    }

    /// Line segment marking `fraction` on the path, extending `length`
    /// outwards from the tape
    pub fn mark_at(&self, fraction: f64, length: f64) -> (Point, Point) {
        let (r, d) = (self.radius, self.straight);
        let s = fraction.rem_euclid(1.0) * self.perimeter();
        let outer = r + length;

        if s < d {
            ((s, -r), (s, -outer))
        } else if s < d + PI * r {
            let t = (s - d) / r;
            (
                (d + r * t.sin(), -r * t.cos()),
                (d + outer * t.sin(), -outer * t.cos()),
            )
        } else if s < 2.0 * d + PI * r {
            let x = d - (s - d - PI * r);
            ((x, r), (x, outer))
        } else {
            let u = (s - 2.0 * d - PI * r) / r;
            (
                (-r * u.sin(), r * u.cos()),
                (-outer * u.sin(), outer * u.cos()),
            )
        }
    }

    /// Check whether a pointer is on the reels (within `margin` of the tape)
    pub fn contains(&self, x: f64, y: f64, margin: f64) -> bool {
        let cx = x.clamp(0.0, self.straight);
        (x - cx).hypot(y) <= self.radius + margin
    }

    /// Reel rotation angle in radians for a tape position fraction
    pub fn reel_angle(&self, fraction: f64) -> f64 {
        (fraction * self.perimeter() / self.radius).rem_euclid(2.0 * PI)
    }
}

/// Tracks a drag along the reel path and reports relative movement
///
/// A drag starts when the pointer is pressed on the reels and lasts until
/// release, even if the pointer leaves the reel area meanwhile.
#[derive(Debug, Clone, Default)]
pub struct ScrubGesture {
    anchor: Option<f64>,
}

impl ScrubGesture {
    /// Create an idle gesture
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Feed one pointer sample in reel-local coordinates
    ///
    /// Returns the fraction moved since the previous sample while dragging,
    /// normalised into [-0.5, 0.5) so crossing the path's start point is a
    /// small step rather than a full lap. Zero movement reports nothing.
    pub fn update(&mut self, path: &ReelPath, x: f64, y: f64, pressed: bool, inside: bool) -> Option<f64> {
        if !pressed {
            self.anchor = None;
            return None;
        }

        let fraction = path.fraction_at(x, y);
        match self.anchor {
            None => {
                if inside {
                    self.anchor = Some(fraction);
                }
                None
            }
            Some(previous) => {
                self.anchor = Some(fraction);
                let delta = (fraction - previous + 0.5).rem_euclid(1.0) - 0.5;
                if delta == 0.0 {
                    None
                } else {
                    Some(delta)
                }
            }
        }
    }
}
