//! Integration tests for odometry/vision fusion scenarios.

use std::f32::consts::FRAC_PI_2;

use smriti_pose::{HistoryConfig, HistoryError, Pose, PoseHistory};

/// Forward-driving pose with zeroed joints.
fn odom(x_mm: f32, frame_id: u32) -> Pose {
    Pose::new(x_mm, 0.0, 0.0, 0.0, frame_id)
}

/// Feed a straight constant-speed run: one sample every `step_ms`,
/// `speed_mm` of forward motion per sample.
fn drive_straight(
    history: &mut PoseHistory,
    t0_ms: u32,
    samples: u32,
    step_ms: u32,
    speed_mm: f32,
    frame_id: u32,
) {
    for i in 0..samples {
        history
            .add_raw_odometry_pose(t0_ms + i * step_ms, odom(i as f32 * speed_mm, frame_id))
            .unwrap();
    }
}

#[test]
fn test_correction_replays_following_odometry() {
    let mut history = PoseHistory::default();
    drive_straight(&mut history, 0, 11, 100, 10.0, 1);

    // The localizer resolves the marker seen at t=500: the robot was
    // actually 60mm out, not 50mm.
    history
        .add_vision_correction_pose(500, odom(60.0, 2))
        .unwrap();

    // 50mm of raw motion between t=500 and t=1000, replayed from 60mm.
    let fused = history.compute_pose_at(1000, false).unwrap();
    assert!((fused.x_mm - 110.0).abs() < 1e-3, "x = {}", fused.x_mm);
    assert_eq!(fused.frame_id, 2);

    // Earlier queries see proportionally less replayed motion.
    let fused_mid = history.compute_pose_at(700, false).unwrap();
    assert!((fused_mid.x_mm - 80.0).abs() < 1e-3, "x = {}", fused_mid.x_mm);
}

#[test]
fn test_correction_with_heading_rotates_replayed_motion() {
    let mut history = PoseHistory::default();
    drive_straight(&mut history, 0, 11, 100, 10.0, 1);

    // Correction says the robot was at (60, 0) facing +Y.
    history
        .add_vision_correction_pose(500, Pose::new(60.0, 0.0, 0.0, FRAC_PI_2, 2))
        .unwrap();

    // The 50mm of forward motion after the correction is replayed in the
    // corrected heading, so it moves the robot along +Y.
    let fused = history.compute_pose_at(1000, false).unwrap();
    assert!((fused.x_mm - 60.0).abs() < 1e-2, "x = {}", fused.x_mm);
    assert!((fused.y_mm - 50.0).abs() < 1e-2, "y = {}", fused.y_mm);
    assert!((fused.heading_rad - FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn test_walk_spans_multiple_frame_transitions() {
    let mut history = PoseHistory::default();

    // Frame 1: x grows 10mm per 100ms through t=500.
    drive_straight(&mut history, 0, 6, 100, 10.0, 1);
    // Rebase: frame 2 restarts its coordinates at zero.
    drive_straight(&mut history, 600, 3, 100, 10.0, 2);

    // A correction for the marker seen at t=250 arrives late, starting
    // epoch 3 far from the odometry's idea of the world.
    history
        .add_vision_correction_pose(250, odom(1000.0, 3))
        .unwrap();

    // Motion folded per epoch: frame 1 contributes t=300..500 (20mm),
    // frame 2 contributes t=600..800 (20mm); the rebase jump between the
    // runs is not motion and must not be folded.
    let fused = history.compute_pose_at(800, false).unwrap();
    assert!((fused.x_mm - 1040.0).abs() < 1e-2, "x = {}", fused.x_mm);
    assert_eq!(fused.frame_id, 3);
}

#[test]
fn test_fusion_matches_raw_until_first_correction() {
    let mut history = PoseHistory::default();
    drive_straight(&mut history, 0, 21, 50, 5.0, 1);

    for t in (0..=1000).step_by(125) {
        let computed = history.compute_pose_at(t, true).unwrap();
        let raw = history.get_raw_pose_at(t, true).unwrap();
        assert_eq!(computed, raw, "t={}", t);
    }

    // The first correction changes fused answers after it...
    history
        .add_vision_correction_pose(400, odom(999.0, 2))
        .unwrap();
    let fused = history.compute_pose_at(800, false).unwrap();
    assert_ne!(fused, history.get_raw_pose_at(800, false).unwrap());

    // ...but not before it (no anchor at or before those times).
    let before = history.compute_pose_at(200, false).unwrap();
    assert_eq!(before, history.get_raw_pose_at(200, false).unwrap());
}

#[test]
fn test_handles_survive_until_their_entry_is_culled() {
    let mut history = PoseHistory::new(HistoryConfig { window_ms: 2000 });
    let mut handles = Vec::new();

    for i in 0..40u32 {
        let t = i * 250;
        history.add_raw_odometry_pose(t, odom(i as f32, 1)).unwrap();
        if i % 4 == 0 {
            let (_, key) = history.compute_and_insert_pose_at(t, false).unwrap();
            handles.push((t, key));
        }
    }

    let newest = history.newest_timestamp().unwrap();
    let oldest = history.oldest_timestamp().unwrap();
    assert!(newest - oldest <= 2000);

    // Every live handle round-trips; every dead handle is for a culled
    // timestamp. No orphans either way.
    let mut live = 0;
    for (t, key) in &handles {
        match history.get_computed_pose_by_key(*key) {
            Some((ts, _)) => {
                assert_eq!(ts, *t);
                assert!(history.is_valid_key(*key));
                live += 1;
            }
            None => assert!(!history.is_valid_key(*key)),
        }
    }
    assert_eq!(live, history.computed_pose_count());
}

#[test]
fn test_late_corrections_only_need_to_beat_the_window() {
    let mut history = PoseHistory::new(HistoryConfig { window_ms: 3000 });
    drive_straight(&mut history, 0, 11, 100, 10.0, 1);

    // In range: accepted even though many raw samples are newer.
    assert!(history.add_vision_correction_pose(50, odom(7.0, 2)).is_ok());

    // Behind the window: rejected.
    history.add_raw_odometry_pose(10_000, odom(0.0, 2)).unwrap();
    assert!(matches!(
        history.add_vision_correction_pose(5000, odom(1.0, 3)),
        Err(HistoryError::TooOld { .. })
    ));
}

#[test]
fn test_independent_engines_do_not_share_state() {
    let mut a = PoseHistory::default();
    let mut b = PoseHistory::default();

    a.add_raw_odometry_pose(0, odom(0.0, 1)).unwrap();
    a.add_raw_odometry_pose(100, odom(1.0, 1)).unwrap();
    b.add_raw_odometry_pose(0, odom(0.0, 1)).unwrap();
    b.add_raw_odometry_pose(100, odom(2.0, 1)).unwrap();

    let (_, key_a) = a.compute_and_insert_pose_at(100, false).unwrap();
    let (_, key_b) = b.compute_and_insert_pose_at(100, false).unwrap();

    // Key sequences are per-instance: a key from one engine means nothing
    // different in the other.
    assert_eq!(key_a, key_b);
    assert_eq!(a.get_computed_pose_by_key(key_a).unwrap().1.x_mm, 1.0);
    assert_eq!(b.get_computed_pose_by_key(key_b).unwrap().1.x_mm, 2.0);
}
