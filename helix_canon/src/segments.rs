//! Collinear segment fusion chain.
//!
//! Successive straight feeds whose intermediate points stay within the
//! naive-cam tolerance of the first-to-last chord are coalesced into one
//! linear move. The chain holds the candidate end points; the engine's
//! flush emits a single move to the last of them.
//!
//! Linkability compares `a, b, c, u, v, w` with exact double equality:
//! fusion is purely an XYZ optimization, and callers wanting tolerant
//! merging on other axes must plan for it upstream.

use helix_common::consts::MAX_CHAINED_SEGMENTS;
use helix_common::pose::Pose;

/// One buffered feed end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPoint {
    pub pos: Pose,
    pub line_number: i32,
}

/// Ordered buffer of pending feed end points.
#[derive(Debug, Default)]
pub struct SegmentChain {
    points: Vec<SegmentPoint>,
}

impl SegmentChain {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(MAX_CHAINED_SEGMENTS),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&SegmentPoint> {
        self.points.last()
    }

    pub fn push(&mut self, point: SegmentPoint) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// XYZ of the most recent pending point, or of the canonical end point
    /// when nothing is buffered.
    pub fn last_xyz(&self, end_point: &Pose) -> (f64, f64, f64) {
        match self.points.last() {
            Some(p) => (p.pos.x, p.pos.y, p.pos.z),
            None => (end_point.x, end_point.y, end_point.z),
        }
    }

    /// Whether `candidate` may join the chain whose fused move would run
    /// from `end_point` to `candidate`.
    ///
    /// Callers guarantee the chain is non-empty. `fusion_enabled` is the
    /// continuous-mode + non-zero-tolerance gate evaluated by the engine.
    pub fn linkable(
        &self,
        end_point: &Pose,
        candidate: &Pose,
        fusion_enabled: bool,
        tolerance: f64,
    ) -> bool {
        let Some(back) = self.points.last() else {
            return false;
        };

        if !fusion_enabled {
            return false;
        }
        if self.points.len() >= MAX_CHAINED_SEGMENTS {
            return false;
        }

        // Exact comparison is intentional here.
        if candidate.a != back.pos.a
            || candidate.b != back.pos.b
            || candidate.c != back.pos.c
            || candidate.u != back.pos.u
            || candidate.v != back.pos.v
            || candidate.w != back.pos.w
        {
            return false;
        }

        if candidate.x == end_point.x && candidate.y == end_point.y && candidate.z == end_point.z {
            return false;
        }

        let m = (
            candidate.x - end_point.x,
            candidate.y - end_point.y,
            candidate.z - end_point.z,
        );
        let mm = dot(m, m);
        for p in &self.points {
            let bp = (
                p.pos.x - end_point.x,
                p.pos.y - end_point.y,
                p.pos.z - end_point.z,
            );
            let t = (dot(m, bp) / mm).clamp(0.0, 1.0);
            let closest = (m.0 * t, m.1 * t, m.2 * t);
            let dev = (
                bp.0 - closest.0,
                bp.1 - closest.1,
                bp.2 - closest.2,
            );
            if dot(dev, dev).sqrt() > tolerance {
                return false;
            }
        }
        true
    }
}

#[inline]
fn dot(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, z: f64) -> SegmentPoint {
        SegmentPoint {
            pos: Pose {
                x,
                y,
                z,
                ..Pose::ZERO
            },
            line_number: 1,
        }
    }

    fn chain_of(points: &[(f64, f64, f64)]) -> SegmentChain {
        let mut chain = SegmentChain::new();
        for &(x, y, z) in points {
            chain.push(pt(x, y, z));
        }
        chain
    }

    #[test]
    fn empty_chain_is_never_linkable() {
        let chain = SegmentChain::new();
        let candidate = Pose {
            x: 1.0,
            ..Pose::ZERO
        };
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 0.1));
    }

    #[test]
    fn collinear_point_within_tolerance_links() {
        let chain = chain_of(&[(10.0, 0.0, 0.0), (20.0, 0.05, 0.0)]);
        let candidate = Pose {
            x: 30.0,
            ..Pose::ZERO
        };
        // deviation of (20, 0.05) from the (0,0)→(30,0) chord is 0.05
        assert!(chain.linkable(&Pose::ZERO, &candidate, true, 0.1));
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 0.01));
    }

    #[test]
    fn fusion_gate_disables_linking() {
        let chain = chain_of(&[(10.0, 0.0, 0.0)]);
        let candidate = Pose {
            x: 20.0,
            ..Pose::ZERO
        };
        assert!(chain.linkable(&Pose::ZERO, &candidate, true, 0.1));
        assert!(!chain.linkable(&Pose::ZERO, &candidate, false, 0.1));
    }

    #[test]
    fn rotary_or_auxiliary_change_blocks_linking() {
        let chain = chain_of(&[(10.0, 0.0, 0.0)]);
        let mut candidate = Pose {
            x: 20.0,
            ..Pose::ZERO
        };
        candidate.a = 1.0;
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 0.1));
        candidate.a = 0.0;
        candidate.w = 0.5;
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 0.1));
    }

    #[test]
    fn candidate_equal_to_end_point_blocks_linking() {
        let chain = chain_of(&[(10.0, 0.0, 0.0)]);
        assert!(!chain.linkable(&Pose::ZERO, &Pose::ZERO, true, 0.1));
    }

    #[test]
    fn projection_clamps_to_segment_ends() {
        // Buffered point lies behind the start; its distance is measured to
        // the chord start, not the infinite line.
        let chain = chain_of(&[(-5.0, 0.0, 0.0)]);
        let candidate = Pose {
            x: 10.0,
            ..Pose::ZERO
        };
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 1.0));
    }

    #[test]
    fn chain_is_bounded() {
        let mut chain = SegmentChain::new();
        for i in 0..MAX_CHAINED_SEGMENTS {
            chain.push(pt(i as f64 + 1.0, 0.0, 0.0));
        }
        let candidate = Pose {
            x: 500.0,
            ..Pose::ZERO
        };
        assert!(!chain.linkable(&Pose::ZERO, &candidate, true, 1.0));
    }

    #[test]
    fn last_xyz_falls_back_to_end_point() {
        let chain = SegmentChain::new();
        let end = Pose {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            ..Pose::ZERO
        };
        assert_eq!(chain.last_xyz(&end), (1.0, 2.0, 3.0));
        let chain = chain_of(&[(9.0, 8.0, 7.0)]);
        assert_eq!(chain.last_xyz(&end), (9.0, 8.0, 7.0));
    }
}
