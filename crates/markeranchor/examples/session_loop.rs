use markeranchor::{
    AnchoredContent, MarkerDescriptor, Pose, RegistryConfig, TrackedSample, TrackingEvent,
    TrackingQuality, TrackingSession, Vector3,
};

fn main() {
    let markers = [MarkerDescriptor::new("Poster")];
    let mut session = TrackingSession::start(RegistryConfig::default(), &markers, |d| {
        AnchoredContent::new(d.name.clone()).with_info_panels(["Title", "Notes"])
    });

    let dt = 1.0 / 30.0;
    let pose = Pose::from_position(Vector3::new(0.2, 0.0, 1.5));
    for frame in 0..60 {
        let quality = match frame {
            10..=20 => TrackingQuality::None,
            21..=25 => TrackingQuality::Limited,
            _ => TrackingQuality::Tracking,
        };
        let sample = TrackedSample::new("Poster", pose, quality);
        let event = if frame == 0 {
            TrackingEvent::added(sample)
        } else {
            TrackingEvent::updated(sample)
        };
        session.frame(&event, dt);

        if let Some(content) = session.registry().and_then(|r| r.entity("Poster")) {
            println!(
                "frame {:2} {:>8}: active={} x={:.4}",
                frame,
                quality,
                content.is_active(),
                content.pose().position.x
            );
        }
    }
}
