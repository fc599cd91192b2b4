/// Joint solution for a Cartesian target. When the target is out of reach
/// the angles are still the clamped best attempt, mirroring how the solver
/// library the arm was modelled with behaves; callers must check `reachable`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub reachable: bool,
    pub base_deg: f64,
    pub shoulder_deg: f64,
    pub elbow_deg: f64,
}

/// Maps a Cartesian target (arena cm) to joint angles. Never caches: the
/// arm's physical pose is fed back through the default-pose adjustment on
/// the brain, not through this solver.
pub trait KinematicsOracle {
    fn solve(&self, x: f64, y: f64, z: f64) -> JointAngles;
}

/// Analytic solver for the 3-joint arm: base yaw plus a two-link chain in
/// the vertical plane through the target.
pub struct PlanarArmKinematics;

impl PlanarArmKinematics {
    /// Link geometry in cm, from the DH model of the physical arm.
    const BASE_COLUMN: f64 = 16.0;
    const UPPER_ARM: f64 = 11.0;
    const FOREARM: f64 = 24.5;
}

impl KinematicsOracle for PlanarArmKinematics {
    fn solve(&self, x: f64, y: f64, z: f64) -> JointAngles {
        let base = y.atan2(x);
        let r = x.hypot(y);
        let dz = z - Self::BASE_COLUMN;

        let (l1, l2) = (Self::UPPER_ARM, Self::FOREARM);
        let cos_elbow = (r * r + dz * dz - l1 * l1 - l2 * l2) / (2.0 * l1 * l2);
        let reachable = (-1.0..=1.0).contains(&cos_elbow);

        let elbow = cos_elbow.clamp(-1.0, 1.0).acos();
        let shoulder = dz.atan2(r) - (l2 * elbow.sin()).atan2(l1 + l2 * elbow.cos());

        JointAngles {
            reachable,
            base_deg: base.to_degrees(),
            shoulder_deg: shoulder.to_degrees(),
            elbow_deg: elbow.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn full_extension_straight_out() {
        let reach = PlanarArmKinematics::UPPER_ARM + PlanarArmKinematics::FOREARM;
        let solution = PlanarArmKinematics.solve(reach, 0.0, PlanarArmKinematics::BASE_COLUMN);
        assert!(solution.reachable);
        assert_close(solution.base_deg, 0.0);
        assert_close(solution.shoulder_deg, 0.0);
        assert_close(solution.elbow_deg, 0.0);
    }

    #[test]
    fn base_follows_target_bearing() {
        let solution = PlanarArmKinematics.solve(10.0, 10.0, 10.0);
        assert_close(solution.base_deg, 45.0);
        let solution = PlanarArmKinematics.solve(-10.0, 10.0, 10.0);
        assert_close(solution.base_deg, 135.0);
    }

    #[test]
    fn beyond_reach_is_flagged_but_still_answers() {
        let solution = PlanarArmKinematics.solve(100.0, 0.0, 10.0);
        assert!(!solution.reachable);
        // Clamped solution points the fully extended arm at the target.
        assert_close(solution.elbow_deg, 0.0);
    }

    #[test]
    fn too_close_to_the_column_is_unreachable() {
        // Inside the annulus the two links can sweep.
        let solution = PlanarArmKinematics.solve(1.0, 0.0, PlanarArmKinematics::BASE_COLUMN);
        assert!(!solution.reachable);
    }
}
