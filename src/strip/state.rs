//! In-memory LED state
//!
//! Mutations only touch the buffer. The strip itself is refreshed solely by
//! `show`, which pushes the buffer scaled by the current brightness.

use parking_lot::Mutex;
use pixel_commander_shared::{limits, RGB8};
use smart_leds::{brightness, SmartLedsWrite};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// LED state shared between the executor and the HTTP endpoints
pub type SharedStrip = Arc<Mutex<LedState>>;

/// Errors raised while pushing a frame
#[derive(Error, Debug)]
pub enum StripError {
    #[error("LED driver write failed: {0}")]
    Driver(String),
}

/// Something that can display a frame of pixels
pub trait FrameSink: Send {
    /// Push `pixels`, scaled by `level`, to the output
    fn push(&mut self, pixels: &[RGB8], level: u8) -> Result<(), StripError>;
}

impl<W> FrameSink for W
where
    W: SmartLedsWrite<Color = RGB8> + Send,
    W::Error: fmt::Debug,
{
    fn push(&mut self, pixels: &[RGB8], level: u8) -> Result<(), StripError> {
        self.write(brightness(pixels.iter().copied(), level))
            .map_err(|e| StripError::Driver(format!("{:?}", e)))
    }
}

/// Pixel buffer, brightness, and the driver they are shown on
pub struct LedState {
    pixels: Vec<RGB8>,
    brightness: u8,
    driver: Box<dyn FrameSink>,
}

impl LedState {
    /// Create a blank strip of `pixel_count` pixels at full brightness
    pub fn new(pixel_count: u16, driver: impl FrameSink + 'static) -> Self {
        Self {
            pixels: vec![RGB8::default(); pixel_count as usize],
            brightness: limits::DEFAULT_BRIGHTNESS,
            driver: Box::new(driver),
        }
    }

    /// Create a strip wrapped for sharing
    pub fn shared(pixel_count: u16, driver: impl FrameSink + 'static) -> SharedStrip {
        Arc::new(Mutex::new(Self::new(pixel_count, driver)))
    }

    pub fn pixel_count(&self) -> u16 {
        self.pixels.len() as u16
    }

    pub fn pixel(&self, index: u16) -> Option<RGB8> {
        self.pixels.get(index as usize).copied()
    }

    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Write one pixel; indices past the end are ignored
    pub fn set_pixel(&mut self, index: u16, color: RGB8) -> bool {
        match self.pixels.get_mut(index as usize) {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, color: RGB8) {
        self.pixels.fill(color);
    }

    pub fn clear(&mut self) {
        self.fill(RGB8::default());
    }

    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    /// Push the buffer to the driver
    pub fn show(&mut self) -> Result<(), StripError> {
        self.driver.push(&self.pixels, self.brightness)
    }
}

impl fmt::Debug for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedState")
            .field("pixel_count", &self.pixels.len())
            .field("brightness", &self.brightness)
            .finish()
    }
}
