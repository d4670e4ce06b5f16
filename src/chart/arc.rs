//! Arcs and Ribbons
//!
//! Annular sector and ribbon shapes in the radial convention shared by the
//! pie and chord charts: angle zero points up and angles grow clockwise, with
//! the origin at the chart centre.

use std::f64::consts::{PI, TAU};

/// Point on a circle of `radius` at a clockwise-from-12 angle
fn radial_point(radius: f64, angle: f64) -> (f64, f64) {
    let a = angle - PI / 2.0;
    (radius * a.cos(), radius * a.sin())
}

fn push_point(out: &mut String, x: f64, y: f64) {
    out.push_str(&format!("{x},{y}"));
}

/// An annular sector between two radii
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcShape {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub corner_radius: f64,
}

impl ArcShape {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Midpoint of the sector, halfway between the radii
    pub fn centroid(&self) -> (f64, f64) {
        let r = (self.inner_radius + self.outer_radius) / 2.0;
        let a = (self.start_angle + self.end_angle) / 2.0;
        radial_point(r, a)
    }

    /// SVG path for the sector. A full-turn sweep renders as a closed ring.
    pub fn to_svg(&self) -> String {
        let (a0, a1) = (self.start_angle, self.end_angle);
        let (ri, ro) = (self.inner_radius, self.outer_radius);
        if self.sweep() >= TAU - 1e-9 {
            return ring_path(ri, ro, a0);
        }

        let large = if self.sweep() > PI { 1 } else { 0 };
        let (x0, y0) = radial_point(ro, a0);
        let (x1, y1) = radial_point(ro, a1);
        let (x2, y2) = radial_point(ri, a1);
        let (x3, y3) = radial_point(ri, a0);

        let mut d = String::from("M");
        push_point(&mut d, x0, y0);
        d.push_str(&format!("A{ro},{ro},0,{large},1,"));
        push_point(&mut d, x1, y1);
        d.push('L');
        push_point(&mut d, x2, y2);
        d.push_str(&format!("A{ri},{ri},0,{large},0,"));
        push_point(&mut d, x3, y3);
        d.push('Z');
        d
    }
}

/// Ring built from two half arcs per radius, since a single SVG arc cannot
/// span a full turn
fn ring_path(ri: f64, ro: f64, a0: f64) -> String {
    let half = a0 + PI;
    let (ox0, oy0) = radial_point(ro, a0);
    let (ox1, oy1) = radial_point(ro, half);
    let (ix0, iy0) = radial_point(ri, a0);
    let (ix1, iy1) = radial_point(ri, half);

    let mut d = String::from("M");
    push_point(&mut d, ox0, oy0);
    d.push_str(&format!("A{ro},{ro},0,1,1,"));
    push_point(&mut d, ox1, oy1);
    d.push_str(&format!("A{ro},{ro},0,1,1,"));
    push_point(&mut d, ox0, oy0);
    if ri > 0.0 {
        d.push('M');
        push_point(&mut d, ix0, iy0);
        d.push_str(&format!("A{ri},{ri},0,1,0,"));
        push_point(&mut d, ix1, iy1);
        d.push_str(&format!("A{ri},{ri},0,1,0,"));
        push_point(&mut d, ix0, iy0);
    }
    d.push('Z');
    d
}

/// The angular span one end of a ribbon covers on its group arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularSpan {
    pub start_angle: f64,
    pub end_angle: f64,
}

/// A ribbon connecting two angular spans across the circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonShape {
    pub radius: f64,
    pub source: AngularSpan,
    pub target: AngularSpan,
}

impl RibbonShape {
    /// SVG path: arc along the source span, curve through the centre to the
    /// target span, arc along it and curve back. A self span skips the
    /// second arc.
    pub fn to_svg(&self) -> String {
        let r = self.radius;
        let (sx0, sy0) = radial_point(r, self.source.start_angle);
        let (sx1, sy1) = radial_point(r, self.source.end_angle);
        let s_large = if self.source.end_angle - self.source.start_angle > PI { 1 } else { 0 };

        let mut d = String::from("M");
        push_point(&mut d, sx0, sy0);
        d.push_str(&format!("A{r},{r},0,{s_large},1,"));
        push_point(&mut d, sx1, sy1);

        if self.source != self.target {
            let (tx0, ty0) = radial_point(r, self.target.start_angle);
            let (tx1, ty1) = radial_point(r, self.target.end_angle);
            let t_large = if self.target.end_angle - self.target.start_angle > PI { 1 } else { 0 };
            d.push_str("Q0,0,");
            push_point(&mut d, tx0, ty0);
            d.push_str(&format!("A{r},{r},0,{t_large},1,"));
            push_point(&mut d, tx1, ty1);
        }

        d.push_str("Q0,0,");
        push_point(&mut d, sx0, sy0);
        d.push('Z');
        d
    }
}
