//! Polyline geometry done before handing points to the back end: clipping
//! to the visible box and splitting into dashes.

/// Axis-aligned box in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBox {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl ClipBox {
    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }

    /// Liang-Barsky clip of one segment. Returns the visible part, if any.
    pub fn clip_segment(&self, a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        for (p, q) in [
            (-dx, a.0 - self.x.0),
            (dx, self.x.1 - a.0),
            (-dy, a.1 - self.y.0),
            (dy, self.y.1 - a.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let at = |t: f64| (a.0 + t * dx, a.1 + t * dy);
        Some((at(t0), at(t1)))
    }

    /// Clip a polyline, splitting it wherever it leaves the box.
    pub fn clip_polyline(&self, points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
        if points.len() == 1 {
            if self.contains(points[0]) {
                runs.push(vec![points[0]]);
            }
            return runs;
        }

        let mut current: Vec<(f64, f64)> = Vec::new();
        for w in points.windows(2) {
            match self.clip_segment(w[0], w[1]) {
                Some((p, q)) => {
                    if current.last() != Some(&p) {
                        if !current.is_empty() {
                            runs.push(std::mem::take(&mut current));
                        }
                        current.push(p);
                    }
                    current.push(q);
                }
                None => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Sutherland-Hodgman clip of a polygon ring against the box.
    pub fn clip_polygon(&self, ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
        type Inside = fn(&ClipBox, (f64, f64)) -> bool;
        type Cross = fn(&ClipBox, (f64, f64), (f64, f64)) -> (f64, f64);

        fn at_x(a: (f64, f64), b: (f64, f64), x: f64) -> (f64, f64) {
            let t = (x - a.0) / (b.0 - a.0);
            (x, a.1 + t * (b.1 - a.1))
        }
        fn at_y(a: (f64, f64), b: (f64, f64), y: f64) -> (f64, f64) {
            let t = (y - a.1) / (b.1 - a.1);
            (a.0 + t * (b.0 - a.0), y)
        }

        let edges: [(Inside, Cross); 4] = [
            (|c, p| p.0 >= c.x.0, |c, a, b| at_x(a, b, c.x.0)),
            (|c, p| p.0 <= c.x.1, |c, a, b| at_x(a, b, c.x.1)),
            (|c, p| p.1 >= c.y.0, |c, a, b| at_y(a, b, c.y.0)),
            (|c, p| p.1 <= c.y.1, |c, a, b| at_y(a, b, c.y.1)),
        ];

        let mut output: Vec<(f64, f64)> = ring.to_vec();
        for (inside, cross) in edges {
            let input = std::mem::take(&mut output);
            let Some(&last) = input.last() else {
                break;
            };
            let mut prev = last;
            for &p in &input {
                match (inside(self, p), inside(self, prev)) {
                    (true, true) => output.push(p),
                    (true, false) => {
                        output.push(cross(self, prev, p));
                        output.push(p);
                    }
                    (false, true) => output.push(cross(self, prev, p)),
                    (false, false) => {}
                }
                prev = p;
            }
        }
        output
    }
}

/// Split a polyline into dashes. `pattern` holds alternating on/off lengths
/// in pixels and `scale` converts data units to pixels along each axis.
pub fn dash_polyline(
    points: &[(f64, f64)],
    pattern: &[f64],
    scale: (f64, f64),
) -> Vec<Vec<(f64, f64)>> {
    // slack for lengths accumulated across many short segments
    const EPS: f64 = 1e-9;

    if pattern.is_empty() || pattern.iter().any(|l| *l <= 0.0) || points.len() < 2 {
        return vec![points.to_vec()];
    }

    let px_len = |dash: &[(f64, f64)]| -> f64 {
        dash.windows(2)
            .map(|w| ((w[1].0 - w[0].0) * scale.0).hypot((w[1].1 - w[0].1) * scale.1))
            .sum()
    };
    let mut dashes = Vec::new();
    let mut finish = |dash: Vec<(f64, f64)>| {
        if dash.len() > 1 && px_len(&dash) > EPS {
            dashes.push(dash);
        }
    };

    let mut current: Vec<(f64, f64)> = vec![points[0]];
    let mut slot = 0;
    let mut remaining = pattern[0];

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let seg_px = ((b.0 - a.0) * scale.0).hypot((b.1 - a.1) * scale.1);
        if seg_px == 0.0 {
            continue;
        }
        let mut t = 0.0;
        while (1.0 - t) * seg_px > remaining + EPS {
            t += remaining / seg_px;
            let p = (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
            if slot % 2 == 0 {
                if current.last() != Some(&p) {
                    current.push(p);
                }
                finish(std::mem::take(&mut current));
            } else {
                current = vec![p];
            }
            slot = (slot + 1) % pattern.len();
            remaining = pattern[slot];
        }
        remaining = (remaining - (1.0 - t) * seg_px).max(0.0);
        if slot % 2 == 0 {
            current.push(b);
        } else {
            current.clear();
        }
    }
    if slot % 2 == 0 {
        finish(current);
    }
    dashes
}
