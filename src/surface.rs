//! Offscreen drawing with a deferred readback.
//!
//! Draw commands submitted to an `OffscreenSurface` are not visible in its pixel buffer straight
//! away. Like a real rendering pipeline the surface needs `MIN_FRAMES_BEFORE_READBACK` frame
//! boundaries to pass before the drawn content can be read. Callers model those frame boundaries by
//! awaiting `next_frame()`, which yields to the executor once, rather than sleeping.

use image::{Rgba, RgbaImage};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::geometry::Rect2;
use crate::units::FrameTicks;

pub const MIN_FRAMES_BEFORE_READBACK: FrameTicks = FrameTicks(2);

/// Future that stays pending until the next frame boundary, i.e. the next time it is polled.
#[derive(Debug, Default)]
pub struct NextFrame {
    yielded: bool,
}

impl Future for NextFrame {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

pub fn next_frame() -> NextFrame {
    NextFrame::default()
}

#[derive(PartialEq, Copy, Clone, Debug)]
enum DrawCommand {
    FillRect { rect: Rect2, colour: Rgba<u8> },
}

/// A pixel surface owned by one export. Dropping it releases the pixels.
#[derive(Debug)]
pub struct OffscreenSurface {
    width: u32,
    height: u32,
    background: Rgba<u8>,
    pending: Vec<DrawCommand>,
    frames_since_submit: FrameTicks,
    drawn: Option<RgbaImage>,
}

impl OffscreenSurface {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> OffscreenSurface {
        debug!("allocating {}x{} offscreen surface", width, height);
        OffscreenSurface {
            width,
            height,
            background,
            pending: Vec::new(),
            frames_since_submit: FrameTicks(0),
            drawn: None,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Queue a filled rectangle in pixel space. Parts outside the surface are clipped.
    pub fn fill_rect(&mut self, rect: Rect2, colour: Rgba<u8>) {
        self.pending.push(DrawCommand::FillRect { rect, colour });
        self.frames_since_submit = FrameTicks(0);
    }

    /// Number of queued draw commands not yet drawn.
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Mark a frame boundary. Queued commands get drawn once enough boundaries have passed.
    pub fn tick(&mut self) {
        self.frames_since_submit = FrameTicks(self.frames_since_submit.0 + 1);
        if self.frames_since_submit >= MIN_FRAMES_BEFORE_READBACK {
            self.flush();
        }
    }

    /// Wait out the frame boundaries needed before everything submitted so far is readable.
    pub async fn present(&mut self) {
        for _ in 0..MIN_FRAMES_BEFORE_READBACK.0 {
            next_frame().await;
            self.tick();
        }
    }

    #[inline]
    pub fn is_drawn(&self) -> bool {
        self.pending.is_empty() && self.drawn.is_some()
    }

    /// Take the drawn pixels. None until the surface has been presented.
    pub fn read_back(&mut self) -> Option<RgbaImage> {
        if self.is_drawn() {
            self.drawn.take()
        } else {
            None
        }
    }

    fn flush(&mut self) {
        let (width, height, background) = (self.width, self.height, self.background);
        let pixels = self.drawn.get_or_insert_with(|| RgbaImage::from_pixel(width, height, background));

        for command in self.pending.drain(..) {
            match command {
                DrawCommand::FillRect { rect, colour } => fill_pixels(pixels, rect, colour),
            }
        }
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!("offscreen surface released with {} undrawn commands", self.pending.len());
        }
        debug!("released {}x{} offscreen surface", self.width, self.height);
    }
}

fn pixel_span(start: f32, end: f32, limit: u32) -> (u32, u32) {
    let clamp = |v: f32| v.round().max(0.0).min(limit as f32) as u32;
    (clamp(start), clamp(end))
}

fn fill_pixels(pixels: &mut RgbaImage, rect: Rect2, colour: Rgba<u8>) {
    let end = rect.end();
    let (x0, x1) = pixel_span(rect.position.x, end.x, pixels.width());
    let (y0, y1) = pixel_span(rect.position.y, end.y, pixels.height());

    for y in y0..y1 {
        for x in x0..x1 {
            pixels.put_pixel(x, y, colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;
    use futures::executor::block_on;
    use futures::future::FutureExt;

    const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 0xff]);

    #[test]
    fn next_frame_yields_exactly_once() {
        let mut frame = next_frame();
        assert!((&mut frame).now_or_never().is_none());
        assert_eq!((&mut frame).now_or_never(), Some(()));
    }

    #[test]
    fn pixels_need_two_frames() {
        let mut surface = OffscreenSurface::new(4, 4, WHITE);
        surface.fill_rect(Rect2::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)), BLACK);
        assert!(surface.read_back().is_none());

        surface.tick();
        assert!(surface.read_back().is_none());
        assert_eq!(surface.pending_commands(), 1);

        surface.tick();
        let pixels = surface.read_back().expect("drawn after two frames");
        assert_eq!(pixels.dimensions(), (4, 4));
        assert_eq!(*pixels.get_pixel(0, 0), WHITE);
        assert_eq!(*pixels.get_pixel(1, 1), BLACK);
        assert_eq!(*pixels.get_pixel(2, 2), BLACK);
        assert_eq!(*pixels.get_pixel(3, 3), WHITE);
    }

    #[test]
    fn new_commands_restart_the_wait() {
        let mut surface = OffscreenSurface::new(2, 2, WHITE);
        surface.fill_rect(Rect2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)), BLACK);
        surface.tick();
        surface.fill_rect(Rect2::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)), BLACK);
        surface.tick();
        assert!(!surface.is_drawn());
        surface.tick();
        assert!(surface.is_drawn());
    }

    #[test]
    fn present_draws_everything() {
        let mut surface = OffscreenSurface::new(3, 3, WHITE);
        surface.fill_rect(Rect2::new(Vec2::new(-5.0, -5.0), Vec2::new(100.0, 100.0)), BLACK);
        block_on(surface.present());
        let pixels = surface.read_back().unwrap();
        assert!(pixels.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn presenting_an_empty_surface_gives_background() {
        let mut surface = OffscreenSurface::new(2, 1, WHITE);
        block_on(surface.present());
        let pixels = surface.read_back().unwrap();
        assert!(pixels.pixels().all(|p| *p == WHITE));
        assert!(surface.read_back().is_none());
    }
}
