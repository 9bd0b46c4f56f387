use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use markeranchor::{
    AnchoredContent, MarkerDescriptor, MarkerTracker, Pose, RegistryConfig, StabilizerConfig,
    TrackedSample, TrackingEvent, TrackingQuality, TrackingSession, UnitQuaternion, Vector3,
};

const N_MARKERS: usize = 64;
const DT: f64 = 1.0 / 60.0;

fn make_frames(n_frames: usize) -> Vec<TrackingEvent> {
    let mut rng = StdRng::seed_from_u64(12345);
    let mut frames = Vec::with_capacity(n_frames);
    for f in 0..n_frames {
        let mut event = TrackingEvent::default();
        for m in 0..N_MARKERS {
            let quality = match rng.gen_range(0..10) {
                0 => TrackingQuality::None,
                1 | 2 => TrackingQuality::Limited,
                _ => TrackingQuality::Tracking,
            };
            let pose = Pose::new(
                Vector3::new(
                    m as f64 * 0.5 + rng.gen_range(-0.01..0.01),
                    rng.gen_range(-0.01..0.01),
                    1.5 + rng.gen_range(-0.01..0.01),
                ),
                UnitQuaternion::from_euler_angles(0.0, rng.gen_range(-0.05..0.05), 0.0),
            );
            let sample = TrackedSample::new(format!("marker_{m}"), pose, quality);
            if f == 0 {
                event.added.push(sample);
            } else {
                event.updated.push(sample);
            }
        }
        frames.push(event);
    }
    frames
}

fn bench_session_frame(c: &mut Criterion) {
    let descriptors: Vec<_> = (0..N_MARKERS)
        .map(|m| MarkerDescriptor::new(format!("marker_{m}")))
        .collect();
    let frames = make_frames(120);
    c.bench_function("session_120_frames_64_markers", |b| {
        b.iter(|| {
            let mut session = TrackingSession::start(RegistryConfig::default(), &descriptors, |d| {
                AnchoredContent::new(d.name.clone())
            });
            for event in &frames {
                black_box(session.frame(black_box(event), DT));
            }
            session.frame_count()
        })
    });
}

fn bench_tracker_update(c: &mut Criterion) {
    let target = Pose::new(
        Vector3::new(0.3, -0.1, 1.2),
        UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
    );
    c.bench_function("tracker_update_tracking", |b| {
        let mut tracker = MarkerTracker::new(StabilizerConfig::default());
        b.iter(|| {
            let out = tracker.update_transform(black_box(&target), TrackingQuality::Tracking, DT);
            tracker.tick(DT);
            black_box(out)
        })
    });
}

criterion_group!(frame_loop, bench_session_frame, bench_tracker_update);
criterion_main!(frame_loop);
