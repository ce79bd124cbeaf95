use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use facelens_core::camera::domain::camera_source::{CameraSource, VideoConstraints};
use facelens_core::camera::infrastructure::nokhwa_camera::NokhwaCamera;
use facelens_core::shared::frame::Frame;

pub enum CameraEvent {
    /// The device is open and streaming at the given resolution.
    Opened(u32, u32),
    /// Opening failed; the worker has exited.
    Failed(String),
    /// Capture broke mid-stream; the worker has exited.
    Lost(String),
}

type LatestFrame = Arc<Mutex<Option<Arc<Frame>>>>;

/// Owns one capture device on a dedicated thread and keeps the most recent
/// frame in a shared slot.
///
/// Dropping the worker signals the thread and returns at once; the thread
/// closes the device after its current capture returns.
pub struct CameraWorker {
    latest: LatestFrame,
    events: Receiver<CameraEvent>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CameraWorker {
    pub fn spawn(constraints: VideoConstraints) -> Self {
        Self::spawn_with(constraints, || Box::new(NokhwaCamera::new()))
    }

    /// `make_source` runs on the worker thread, since capture handles may
    /// be bound to the thread that opened them.
    pub fn spawn_with<F>(constraints: VideoConstraints, make_source: F) -> Self
    where
        F: FnOnce() -> Box<dyn CameraSource> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<CameraEvent>();
        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));

        let latest_clone = latest.clone();
        let stop_clone = stop.clone();
        let handle = thread::spawn(move || {
            let mut source = make_source();
            run_capture(source.as_mut(), &constraints, &tx, &latest_clone, &stop_clone);
            source.close();
        });

        Self {
            latest,
            events: rx,
            stop,
            handle: Some(handle),
        }
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        match self.latest.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn try_event(&self) -> Option<CameraEvent> {
        self.events.try_recv().ok()
    }

    /// Never blocks: a capture call may hang on a stalled device.
    fn cancel(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Detach; the thread releases the device when it exits.
        self.handle.take();
    }

    #[cfg(test)]
    fn join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

impl Drop for CameraWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_capture(
    source: &mut dyn CameraSource,
    constraints: &VideoConstraints,
    tx: &Sender<CameraEvent>,
    latest: &LatestFrame,
    stop: &AtomicBool,
) {
    if let Err(e) = source.open(constraints) {
        log::warn!("Camera {} failed to open: {e}", constraints.device_index);
        let _ = tx.send(CameraEvent::Failed(e.to_string()));
        return;
    }

    let mut announced = false;
    while !stop.load(Ordering::Relaxed) {
        let frame = match source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Camera stream lost: {e}");
                let _ = tx.send(CameraEvent::Lost(e.to_string()));
                return;
            }
        };
        if frame.is_empty() {
            continue;
        }
        if !announced {
            let (w, h) = frame.dimensions();
            log::info!("Camera {} streaming at {w}x{h}", constraints.device_index);
            let _ = tx.send(CameraEvent::Opened(w, h));
            announced = true;
        }
        match latest.lock() {
            Ok(mut slot) => *slot = Some(Arc::new(frame)),
            Err(poisoned) => *poisoned.into_inner() = Some(Arc::new(frame)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelens_core::camera::domain::camera_source::CameraError;
    use std::time::{Duration, Instant};

    struct FakeSource {
        fail_open: bool,
        fail_after: Option<u64>,
        frame_delay: Duration,
        captured: u64,
        closed: Arc<AtomicBool>,
    }

    impl CameraSource for FakeSource {
        fn open(&mut self, constraints: &VideoConstraints) -> Result<(), CameraError> {
            if self.fail_open {
                Err(CameraError::NoDevice(constraints.device_index))
            } else {
                Ok(())
            }
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            self.captured += 1;
            if self.fail_after.is_some_and(|n| self.captured > n) {
                return Err(CameraError::Capture("unplugged".into()));
            }
            thread::sleep(self.frame_delay);
            Ok(Frame::new(vec![0; 4 * 2 * 3], 4, 2, self.captured))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::Relaxed);
        }

        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::Relaxed)
        }
    }

    fn spawn(fail_open: bool, fail_after: Option<u64>) -> (CameraWorker, Arc<AtomicBool>) {
        spawn_slow(fail_open, fail_after, Duration::from_millis(2))
    }

    fn spawn_slow(
        fail_open: bool,
        fail_after: Option<u64>,
        frame_delay: Duration,
    ) -> (CameraWorker, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let closed_clone = closed.clone();
        let worker = CameraWorker::spawn_with(VideoConstraints::default(), move || {
            Box::new(FakeSource {
                fail_open,
                fail_after,
                frame_delay,
                captured: 0,
                closed: closed_clone,
            })
        });
        (worker, closed)
    }

    fn wait_event(worker: &CameraWorker) -> CameraEvent {
        worker
            .events
            .recv_timeout(Duration::from_secs(5))
            .expect("no camera event")
    }

    fn wait_closed(closed: &AtomicBool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !closed.load(Ordering::Relaxed) {
            assert!(Instant::now() < deadline, "device was never released");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_streams_frames_until_stopped() {
        let (mut worker, closed) = spawn(false, None);

        assert!(matches!(wait_event(&worker), CameraEvent::Opened(4, 2)));
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.latest_frame().map_or(true, |f| f.sequence() < 3) {
            assert!(Instant::now() < deadline, "no frames arrived");
            thread::sleep(Duration::from_millis(5));
        }

        worker.join();
        assert!(closed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_open_failure_is_reported() {
        let (worker, closed) = spawn(true, None);
        match wait_event(&worker) {
            CameraEvent::Failed(msg) => assert!(msg.contains("index 0")),
            _ => panic!("expected failure"),
        }
        assert!(worker.latest_frame().is_none());
        drop(worker);
        wait_closed(&closed);
    }

    #[test]
    fn test_capture_error_ends_stream() {
        let (worker, closed) = spawn(false, Some(2));
        assert!(matches!(wait_event(&worker), CameraEvent::Opened(..)));
        assert!(matches!(wait_event(&worker), CameraEvent::Lost(_)));
        drop(worker);
        wait_closed(&closed);
    }

    #[test]
    fn test_drop_does_not_wait_for_a_stalled_capture() {
        let (worker, closed) = spawn_slow(false, None, Duration::from_millis(1500));
        // Let the thread enter its first, slow capture call.
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        drop(worker);
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "drop blocked for {:?}",
            started.elapsed()
        );
        assert!(!closed.load(Ordering::Relaxed));

        wait_closed(&closed);
    }
}
