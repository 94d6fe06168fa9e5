use super::*;
use crate::foundation::core::Canvas;

fn frame() -> FrameRGBA {
    FrameRGBA::blank(Canvas::new(2, 2).unwrap())
}

#[test]
fn in_memory_sink_records_config_and_frames() {
    let mut sink = InMemorySink::new();
    let cfg = SinkConfig {
        width: 2,
        height: 2,
        fps: 24,
    };
    sink.begin(cfg.clone()).unwrap();
    sink.push_frame(FrameIndex(0), &frame()).unwrap();
    sink.push_frame(FrameIndex(1), &frame()).unwrap();
    sink.end().unwrap();

    assert_eq!(sink.config(), Some(cfg));
    assert_eq!(sink.frames().len(), 2);
    assert!(sink.is_finished());
}

#[test]
fn in_memory_sink_rejects_out_of_order_and_unstarted_pushes() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame()).is_err());

    sink.begin(SinkConfig {
        width: 2,
        height: 2,
        fps: 24,
    })
    .unwrap();
    sink.push_frame(FrameIndex(3), &frame()).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame()).is_err());
    assert!(sink.push_frame(FrameIndex(1), &frame()).is_err());
}
