//! Simulated LED strip for running without hardware

use parking_lot::Mutex;
use pixel_commander_shared::RGB8;
use smart_leds::SmartLedsWrite;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct Pushed {
    frame: Vec<RGB8>,
    pushes: u64,
}

/// Read-only view of what a simulated strip has displayed
#[derive(Debug, Clone, Default)]
pub struct FrameProbe {
    inner: Arc<Mutex<Pushed>>,
}

impl FrameProbe {
    /// The most recently pushed frame (empty before the first push)
    pub fn last_frame(&self) -> Vec<RGB8> {
        self.inner.lock().frame.clone()
    }

    /// Number of frames pushed so far
    pub fn pushes(&self) -> u64 {
        self.inner.lock().pushes
    }
}

/// A `smart_leds` driver that records frames instead of driving a pin
#[derive(Debug)]
pub struct SimulatedStrip {
    data_pin: u8,
    probe: FrameProbe,
}

impl SimulatedStrip {
    pub fn new(data_pin: u8) -> Self {
        Self {
            data_pin,
            probe: FrameProbe::default(),
        }
    }

    pub fn probe(&self) -> FrameProbe {
        self.probe.clone()
    }
}

impl SmartLedsWrite for SimulatedStrip {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let frame: Vec<RGB8> = iterator.into_iter().map(Into::into).collect();
        let lit = frame.iter().filter(|p| **p != RGB8::default()).count();

        let mut pushed = self.probe.inner.lock();
        pushed.pushes += 1;
        debug!(
            "[STRIP] pin {} frame #{}: {} pixels, {} lit",
            self.data_pin,
            pushed.pushes,
            frame.len(),
            lit
        );
        pushed.frame = frame;
        Ok(())
    }
}
