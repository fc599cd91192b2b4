//! Fixed tuning values for the arena, destination grid and timing policy.
//!
//! The camera calibration fixes the arena extents; everything else was
//! dialled in against the physical rig and should be treated as one unit
//! with the firmware on the brain.

use std::time::Duration;

/// Arena extents in cm, origin at the arm's vertical rotation axis.
pub const X_LIMIT: (f64, f64) = (-25.5, 25.5);
pub const Y_LIMIT: (f64, f64) = (-13.0, 13.0);

/// Destination lattice: [-GRID_LIMIT, +GRID_LIMIT] on both axes at
/// GRID_STEP spacing, scanned row-major.
pub const GRID_STEP: f64 = 5.0;
pub const GRID_LIMIT: f64 = 25.0;

/// Cells with |y| <= FORBIDDEN_Y are never used as destinations; this keeps
/// the drop zone clear of the base sweep and the pickup lane.
pub const FORBIDDEN_Y: f64 = 10.0;

/// Minimum separation (cm) between a destination and any other object or
/// any destination already chosen this cycle. Also the radius used to judge
/// whether a pickup actually cleared the origin.
pub const MIN_DIST: f64 = 10.0;

/// Height fed to the solver for both pickup and drop-off. Positive tolerance
/// to absorb arm flex and the tool/target geometry.
pub const PICKUP_Z: f64 = 10.0;

/// Joint angles are rounded to this many decimal places before transmission.
pub const ANGLE_DECIMAL_PLACES: usize = 1;

/// Object plausibility bounds, matched to the blocks we expect the camera to
/// see. Anything outside is a reflection, a finger, or the arm itself.
pub const MIN_WIDTH: f64 = 4.0;
pub const MAX_WIDTH: f64 = 8.0;
pub const MIN_HEIGHT: f64 = 5.0;
pub const MAX_HEIGHT: f64 = 8.0;
pub const MIN_AREA: f64 = 20.0;
pub const MAX_AREA: f64 = 100.0;

/// How long to wait for the brain to ack a command, and how many receive
/// attempts to make before declaring the link dead.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(5);
pub const ACK_ATTEMPTS: u32 = 1;

/// Mechanical settling time after every acknowledged command.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Post-move rescan: poll the feed at this interval, give up (fatal) after
/// this many polls without a fresh snapshot.
pub const RESCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const RESCAN_MAX_POLLS: u32 = 30;

/// How many times to re-attempt a pickup whose verification still sees an
/// object near the origin before skipping it.
pub const MAX_PICKUP_ATTEMPTS: u32 = 3;

/// Decision-loop pacing.
pub const EMPTY_FEED_BACKOFF: Duration = Duration::from_secs(1);
pub const CYCLE_DELAY: Duration = Duration::from_secs(2);

/// Background poller cadence for the shared snapshot.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Parking poses (base, shoulder, elbow degrees) that keep the arm out of
/// the camera's view while the scene is re-scanned. Which one is used
/// depends on which side of the workspace the pickup approached from.
pub const DEADZONE_NEAR: (f64, f64, f64) = (0.0, 90.0, 0.0);
pub const DEADZONE_FAR: (f64, f64, f64) = (180.0, 90.0, 0.0);
