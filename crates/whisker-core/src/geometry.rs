//! Closed-form segment/segment and segment/circle intersection.

use serde::{Deserialize, Serialize};

use crate::Vec2;

/// Directed segment from `p1` to `p2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Segment {
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    pub fn delta(&self) -> Vec2 {
        self.p2 - self.p1
    }

    pub fn point_at(&self, t: f64) -> Vec2 {
        self.p1 + self.delta() * t
    }

    pub fn intersect(&self, other: &Segment) -> Option<Intersection> {
        segment_intersect(self, other)
    }

    pub fn intersect_circle(&self, center: Vec2, radius: f64) -> Option<Intersection> {
        circle_intersect(self, center, radius)
    }
}

/// A hit along a segment.
///
/// `ua` is the parameter along the probing segment and orders candidate hits: smaller is nearer
/// to `p1`. `ub` is only known for segment/segment hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub ua: f64,
    pub ub: Option<f64>,
    pub point: Vec2,
}

fn strictly_inside_unit(t: f64) -> bool {
    t > 0.0 && t < 1.0
}

/// Intersection of `a` and `b`, excluding endpoints.
///
/// Parallel and collinear segments never intersect.
pub fn segment_intersect(a: &Segment, b: &Segment) -> Option<Intersection> {
    let da = a.delta();
    let db = b.delta();
    let denom = db.y * da.x - db.x * da.y;
    if denom == 0.0 {
        return None;
    }

    let off = a.p1 - b.p1;
    let ua = (db.x * off.y - db.y * off.x) / denom;
    let ub = (da.x * off.y - da.y * off.x) / denom;
    if !(strictly_inside_unit(ua) && strictly_inside_unit(ub)) {
        return None;
    }

    Some(Intersection {
        ua,
        ub: Some(ub),
        point: Vec2::new(a.p1.x + ua * da.x, a.p1.y + ua * da.y),
    })
}

/// Approximate intersection of `segment` with the circle at `center`.
///
/// The reported point is the centre pushed along the segment normal by the centre's distance to
/// the line, not the chord entry point. Eye readings depend on this exact point, so it is kept.
pub fn circle_intersect(segment: &Segment, center: Vec2, radius: f64) -> Option<Intersection> {
    let d = segment.delta();
    let perpendicular = Vec2::new(d.y, -d.x);
    let perp_len = perpendicular.length();
    if perp_len == 0.0 {
        return None;
    }

    let cross = d.x * (segment.p1.y - center.y) - (segment.p1.x - center.x) * d.y;
    let distance = cross.abs() / perp_len;
    if distance > radius {
        return None;
    }

    let point = center + perpendicular.scale(1.0 / perp_len).scale(distance);
    let ua = if d.x.abs() > d.y.abs() {
        (point.x - segment.p1.x) / d.x
    } else {
        (point.y - segment.p1.y) / d.y
    };
    if !strictly_inside_unit(ua) {
        return None;
    }

    Some(Intersection {
        ua,
        ub: None,
        point,
    })
}
