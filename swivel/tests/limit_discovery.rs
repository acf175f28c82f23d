//! Vision-verified moves and mechanical limit discovery.

mod common;

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use common::{noise_frame, shifted_down, shifted_right, MockBackend, ScriptedFrames};
use ndarray::Array2;
use swivel::{MotionSequencer, MotionVerifier};

const DEVICE: &str = "/dev/video9";

fn verified_sequencer(frames: Vec<Array2<f64>>) -> (Arc<MockBackend>, MotionSequencer) {
    let backend = Arc::new(MockBackend::new());
    let sequencer = MotionSequencer::new(backend.clone(), DEVICE);
    sequencer.attach_verifier(MotionVerifier::new(Box::new(ScriptedFrames::new(frames))));
    (backend, sequencer)
}

fn hold(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds)
}

#[test]
fn test_shifted_frames_count_as_motion() {
    let frame = noise_frame(1);
    // Camera pans left: scene content shifts right.
    let (_backend, sequencer) = verified_sequencer(vec![frame.clone(), shifted_right(&frame, 8)]);

    let moved = sequencer.pan(-1, hold(0.01)).unwrap();

    assert!(moved);
    let position = sequencer.position();
    assert_relative_eq!(position.pan, -0.01, epsilon = 1e-9);
    assert_eq!(position.pan_min, None);
}

#[test]
fn test_identical_frames_record_a_limit() {
    let frame = noise_frame(2);
    let (_backend, sequencer) = verified_sequencer(vec![frame.clone(), frame.clone()]);

    let moved = sequencer.pan(1, hold(0.3)).unwrap();

    assert!(!moved, "identical frames mean the camera did not move");
    let position = sequencer.position();
    assert_relative_eq!(position.pan, 0.0);
    assert_eq!(position.pan_max, Some(0.0));
    assert!(!position.can_pan_right());
    assert!(position.can_pan_left());
}

#[test]
fn test_vertical_shift_verifies_tilt_not_pan() {
    let frame = noise_frame(3);
    let shifted = shifted_down(&frame, 6);
    let (_backend, sequencer) =
        verified_sequencer(vec![frame.clone(), shifted.clone(), shifted.clone(), shifted]);

    let moved = sequencer.tilt(1, hold(0.01)).unwrap();
    assert!(moved);

    // Second command sees identical frames: tilt limit discovered.
    let moved = sequencer.tilt(1, hold(0.01)).unwrap();
    assert!(!moved);

    let position = sequencer.position();
    assert_relative_eq!(position.tilt, 0.01, epsilon = 1e-9);
    assert_relative_eq!(position.tilt_max.unwrap(), 0.01, epsilon = 1e-9);
    assert!(!position.can_tilt_up());
    assert!(position.can_tilt_down());
}

#[test]
fn test_combined_move_classifies_axes_independently() {
    let frame = noise_frame(4);
    // Horizontal shift only: pan verified, tilt blocked.
    let (_backend, sequencer) = verified_sequencer(vec![frame.clone(), shifted_right(&frame, 8)]);

    let (pan_moved, tilt_moved) = sequencer.combined_move(-1, 1, hold(0.02)).unwrap();

    assert!(pan_moved);
    assert!(!tilt_moved);

    let position = sequencer.position();
    assert_relative_eq!(position.pan, -0.02, epsilon = 1e-9);
    assert_relative_eq!(position.tilt, 0.0);
    assert_relative_eq!(position.tilt_max.unwrap(), 0.0);
}

#[test]
fn test_missing_before_frame_degrades_to_optimism() {
    let (_backend, sequencer) = verified_sequencer(Vec::new());

    let moved = sequencer.pan(1, hold(0.02)).unwrap();

    assert!(moved, "a missing frame must never read as a limit");
    let position = sequencer.position();
    assert_relative_eq!(position.pan, 0.02, epsilon = 1e-9);
    assert_eq!(position.pan_max, None);
}

#[test]
fn test_missing_after_frame_degrades_to_optimism() {
    let frame = noise_frame(5);
    let (_backend, sequencer) = verified_sequencer(vec![frame]);

    let moved = sequencer.pan(1, hold(0.02)).unwrap();

    assert!(moved);
    assert_eq!(sequencer.position().pan_max, None);
}

#[test]
fn test_mismatched_frame_sizes_degrade_to_optimism() {
    let frame = noise_frame(6);
    let odd = Array2::<f64>::zeros((32, 32));
    let (_backend, sequencer) = verified_sequencer(vec![frame, odd]);

    let moved = sequencer.pan(1, hold(0.01)).unwrap();

    assert!(moved, "a failed measurement must never read as a limit");
    assert_eq!(sequencer.position().pan_max, None);
}

#[test]
fn test_scenario_three_pans_then_blocked() {
    let mut frames = Vec::new();
    for seed in 10..13 {
        let frame = noise_frame(seed);
        // Camera pans right: scene content shifts left, i.e. a negative
        // horizontal shift, which still classifies as horizontal motion.
        frames.push(frame.clone());
        frames.push(shifted_right(&frame, 48 - 8));
    }
    let blocked = noise_frame(13);
    frames.push(blocked.clone());
    frames.push(blocked);

    let (_backend, sequencer) = verified_sequencer(frames);

    for _ in 0..3 {
        assert!(sequencer.pan(1, hold(0.3)).unwrap());
    }
    assert!(!sequencer.pan(1, hold(0.3)).unwrap());

    let position = sequencer.position();
    assert_relative_eq!(position.pan, 0.9, epsilon = 1e-9);
    assert_relative_eq!(position.pan_max.unwrap(), 0.9, epsilon = 1e-9);
    assert!(!position.can_pan_right());
    assert!(position.can_pan_left());
}

#[test]
fn test_discovered_limit_is_not_overwritten() {
    let first = noise_frame(20);
    let second = noise_frame(21);
    let (_backend, sequencer) = verified_sequencer(vec![
        // Blocked at the origin.
        first.clone(),
        first,
        // Back off left, then blocked again further in.
        second.clone(),
        second.clone(),
    ]);

    assert!(!sequencer.pan(1, hold(0.3)).unwrap());
    assert_eq!(sequencer.position().pan_max, Some(0.0));

    // A later blocked observation must not move the recorded limit.
    assert!(!sequencer.pan(1, hold(0.2)).unwrap());
    assert_eq!(sequencer.position().pan_max, Some(0.0));
}

#[test]
fn test_measured_shift_matches_synthetic_translation() {
    let frame = noise_frame(50);
    let shifted = shifted_right(&frame, 8);
    let verifier = MotionVerifier::new(Box::new(ScriptedFrames::empty()));

    let measurement = verifier.measure(&frame, &shifted).unwrap();

    assert!(
        (measurement.dx - 8.0).abs() < 2.0,
        "dx = {}",
        measurement.dx
    );
    assert!(measurement.moved_horizontally());
    assert!(!measurement.moved_vertically());
    // Content moved right means the camera panned left.
    assert!(measurement.did_pan_left());
}

#[test]
fn test_detached_verifier_stops_limit_discovery() {
    let frame = noise_frame(30);
    let (_backend, sequencer) = verified_sequencer(vec![frame.clone(), frame]);

    assert!(!sequencer.pan(1, hold(0.01)).unwrap());

    sequencer.detach_verifier();
    assert!(!sequencer.has_verifier());

    // Without the verifier the same command is optimistically trusted.
    assert!(sequencer.pan(-1, hold(0.01)).unwrap());
    assert_eq!(sequencer.position().pan_min, None);
}
