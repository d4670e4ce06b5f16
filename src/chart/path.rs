//! Path Geometry
//!
//! Builds the vector paths behind the line chart: monotone cubic curves that
//! never overshoot the data, area fills down to a baseline, Douglas-Peucker
//! point reduction and pairwise path interpolation for animated transitions.

/// A point in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// One drawing command of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo { c1: Point, c2: Point, end: Point },
    Close,
}

/// An ordered list of drawing commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathGeometry {
    pub segments: Vec<PathSegment>,
}

impl PathGeometry {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Serialize to an SVG path data string
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::MoveTo(p) => {
                    out.push_str(&format!("M{},{}", p.x, p.y));
                }
                PathSegment::LineTo(p) => {
                    out.push_str(&format!("L{},{}", p.x, p.y));
                }
                PathSegment::CurveTo { c1, c2, end } => {
                    out.push_str(&format!(
                        "C{},{},{},{},{},{}",
                        c1.x, c1.y, c2.x, c2.y, end.x, end.y
                    ));
                }
                PathSegment::Close => out.push('Z'),
            }
        }
        out
    }
}

fn sign(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Three-point tangent slope that preserves monotonicity between samples
fn slope3(x0: f64, y0: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let h0 = x1 - x0;
    let h1 = x2 - x1;
    let d0 = if h0 != 0.0 {
        h0
    } else if h1 < 0.0 {
        -0.0
    } else {
        0.0
    };
    let d1 = if h1 != 0.0 {
        h1
    } else if h0 < 0.0 {
        -0.0
    } else {
        0.0
    };
    let s0 = (y1 - y0) / d0;
    let s1 = (y2 - y1) / d1;
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    let m = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if m.is_nan() {
        0.0
    } else {
        m
    }
}

/// Two-point tangent slope given the slope at the other end
fn slope2(x0: f64, y0: f64, x1: f64, y1: f64, t: f64) -> f64 {
    let h = x1 - x0;
    if h != 0.0 {
        (3.0 * (y1 - y0) / h - t) / 2.0
    } else {
        t
    }
}

/// Cubic segment from `a` to `b` with the given end tangents
fn bezier(a: Point, b: Point, t0: f64, t1: f64) -> PathSegment {
    let dx = (b.x - a.x) / 3.0;
    PathSegment::CurveTo {
        c1: Point::new(a.x + dx, a.y + t0 * dx),
        c2: Point::new(b.x - dx, b.y - t1 * dx),
        end: b,
    }
}

fn dedup(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Cubic curve through the points that stays monotone in y wherever the data
/// is, so interpolation never overshoots a sample
pub fn monotone_x(points: &[Point]) -> PathGeometry {
    let pts = dedup(points);
    let mut geo = PathGeometry::default();
    match pts.len() {
        0 => return geo,
        1 => {
            geo.segments.push(PathSegment::MoveTo(pts[0]));
            return geo;
        }
        2 => {
            geo.segments.push(PathSegment::MoveTo(pts[0]));
            geo.segments.push(PathSegment::LineTo(pts[1]));
            return geo;
        }
        _ => {}
    }

    geo.segments.push(PathSegment::MoveTo(pts[0]));
    let mut t0 = 0.0;
    for i in 1..pts.len() - 1 {
        let (p0, p1, p2) = (pts[i - 1], pts[i], pts[i + 1]);
        let t1 = slope3(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y);
        let entry = if i == 1 {
            slope2(p0.x, p0.y, p1.x, p1.y, t1)
        } else {
            t0
        };
        geo.segments.push(bezier(p0, p1, entry, t1));
        t0 = t1;
    }
    // closing segment mirrors the entry slope
    let (p0, p1) = (pts[pts.len() - 2], pts[pts.len() - 1]);
    let t1 = slope2(p0.x, p0.y, p1.x, p1.y, t0);
    geo.segments.push(bezier(p0, p1, t0, t1));
    geo
}

/// Area under the monotone curve, closed along a horizontal baseline
pub fn area_monotone_x(points: &[Point], baseline: f64) -> PathGeometry {
    if points.is_empty() {
        return PathGeometry::default();
    }
    let mut geo = monotone_x(points);
    let floor: Vec<Point> = points
        .iter()
        .rev()
        .map(|p| Point::new(p.x, baseline))
        .collect();
    let mut tail = monotone_x(&floor).segments.into_iter();
    if let Some(PathSegment::MoveTo(p)) = tail.next() {
        geo.segments.push(PathSegment::LineTo(p));
    }
    geo.segments.extend(tail);
    geo.segments.push(PathSegment::Close);
    geo
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    (dx * (p.y - a.y) - dy * (p.x - a.x)).abs() / len_sq.sqrt()
}

/// Douglas-Peucker reduction: drops points that deviate from the simplified
/// shape by no more than `tolerance` pixels. Endpoints always survive.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut best = lo;
        let mut dist = 0.0f64;
        for (i, p) in points.iter().enumerate().take(hi).skip(lo + 1) {
            let d = perpendicular_distance(*p, points[lo], points[hi]);
            if d > dist {
                dist = d;
                best = i;
            }
        }
        if dist > tolerance {
            keep[best] = true;
            stack.push((lo, best));
            stack.push((best, hi));
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Interpolates between two paths with the same command structure; falls back
/// to snapping when the structures differ
#[derive(Debug, Clone)]
pub struct PathInterpolator {
    from: PathGeometry,
    to: PathGeometry,
    compatible: bool,
}

impl PathInterpolator {
    pub fn new(from: PathGeometry, to: PathGeometry) -> Self {
        let compatible = from.segments.len() == to.segments.len()
            && from
                .segments
                .iter()
                .zip(&to.segments)
                .all(|(a, b)| std::mem::discriminant(a) == std::mem::discriminant(b));
        Self { from, to, compatible }
    }

    pub fn at(&self, t: f64) -> PathGeometry {
        let t = t.clamp(0.0, 1.0);
        if !self.compatible || t >= 1.0 {
            return self.to.clone();
        }
        if t <= 0.0 {
            return self.from.clone();
        }
        let segments = self
            .from
            .segments
            .iter()
            .zip(&self.to.segments)
            .map(|(a, b)| match (a, b) {
                (PathSegment::MoveTo(p), PathSegment::MoveTo(q)) => {
                    PathSegment::MoveTo(p.lerp(*q, t))
                }
                (PathSegment::LineTo(p), PathSegment::LineTo(q)) => {
                    PathSegment::LineTo(p.lerp(*q, t))
                }
                (
                    PathSegment::CurveTo { c1, c2, end },
                    PathSegment::CurveTo { c1: d1, c2: d2, end: e },
                ) => PathSegment::CurveTo {
                    c1: c1.lerp(*d1, t),
                    c2: c2.lerp(*d2, t),
                    end: end.lerp(*e, t),
                },
                _ => PathSegment::Close,
            })
            .collect();
        PathGeometry { segments }
    }
}
