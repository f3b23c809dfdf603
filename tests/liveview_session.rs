//! End-to-end tests through the public API: settings file, simulated device,
//! session lifecycle and the channel receiver.

use futures::StreamExt;
use liveview::devices::SimulatedDevice;
use liveview::nal::{NalUnitType, start_code_at};
use liveview::{
    ChannelReceiver, LiveView, LiveViewConfig, LiveViewError, LiveViewSettings, SessionState,
    SimulationConfig, StreamReceiver,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// SPS, PPS and IDR followed by `slices` non-IDR slices, plus a trailing
/// access unit delimiter so every slice has a closing boundary.
fn recorded_stream(slices: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for header in [0x67, 0x68, 0x65] {
        stream.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, header, 0x42, 0x80, 0x1E]);
    }
    for n in 0..slices {
        stream.extend_from_slice(&[0x00, 0x00, 0x01, 0x41, 0x9A, (n % 200) as u8 + 1]);
    }
    stream.extend_from_slice(&[0x00, 0x00, 0x01, 0x09, 0xF0]);
    stream
}

#[tokio::test]
async fn settings_file_drives_a_full_session() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir()?;
    let stream_path = dir.path().join("edge_stream.h264");
    std::fs::write(&stream_path, recorded_stream(12))?;

    let settings_path = dir.path().join("liveview.yaml");
    let mut file = std::fs::File::create(&settings_path)?;
    writeln!(file, "camera: payload")?;
    writeln!(file, "quality: 720p_high")?;
    writeln!(file, "source: zoom")?;
    writeln!(file, "engine:")?;
    writeln!(file, "  channel_capacity: 32")?;
    writeln!(file, "  frame_interval_ms: 2")?;
    writeln!(file, "simulation:")?;
    writeln!(file, "  stream_path: {}", stream_path.display())?;
    drop(file);

    let settings = LiveViewSettings::load(&settings_path)?;
    let session = LiveView::simulated(&settings)?;
    let receiver = Arc::new(ChannelReceiver::new(32));
    let frames = receiver.frames().expect("fresh receiver");

    session.init(settings.camera, settings.quality, Some(receiver.clone())).await?;
    if let Some(source) = settings.source {
        session.set_source(source).await?;
    }
    session.start_stream().await?;

    let frames: Vec<_> =
        tokio::time::timeout(Duration::from_secs(5), frames.take(15).collect()).await?;

    let kinds: Vec<NalUnitType> = frames
        .iter()
        .map(|frame| {
            let width = start_code_at(frame, 0).expect("frame starts with a start code");
            NalUnitType::from(frame[width])
        })
        .collect();
    assert_eq!(&kinds[..3], &[NalUnitType::Sps, NalUnitType::Pps, NalUnitType::SliceIdr]);
    assert!(kinds[3..].iter().all(|kind| *kind == NalUnitType::SliceNonIdr));
    assert_eq!(frames[3].as_ref(), &[0x00, 0x00, 0x01, 0x41, 0x9A, 0x01]);

    session.stop_stream().await?;
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.stats().frames_delivered, 15);
    assert_eq!(receiver.dropped(), 0);

    session.destroy().await;
    assert_eq!(session.state(), SessionState::Destroyed);
    Ok(())
}

#[tokio::test]
async fn two_sessions_cannot_share_a_camera() -> anyhow::Result<()> {
    let device = Arc::new(SimulatedDevice::from_bytes(recorded_stream(4), SimulationConfig::default()));
    let receiver: Arc<dyn StreamReceiver> = Arc::new(ChannelReceiver::new(8));

    let pilot = LiveView::new(device.clone(), LiveViewConfig::default())?;
    let observer = LiveView::new(device.clone(), LiveViewConfig::default())?;

    pilot.init(1_i32, 2_i32, Some(receiver.clone())).await?;
    let err = observer.init(1_i32, 2_i32, Some(receiver.clone())).await.unwrap_err();
    assert!(matches!(err, LiveViewError::ResourceUnavailable { .. }));
    assert!(err.is_retryable());

    // The forward-view camera is a separate resource
    observer.init(0_i32, 1_i32, Some(receiver)).await?;

    pilot.destroy().await;
    observer.destroy().await;
    assert_eq!(device.releases(), 2);
    Ok(())
}
