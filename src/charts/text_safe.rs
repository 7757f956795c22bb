//! Font-tolerant drawing backend.
//!
//! Hosts without a usable font make `plotters` fail (or panic inside the
//! font loader) on the first label. This wrapper drops text it cannot draw
//! and estimates text extents from the font size, so the image itself is
//! still produced.

use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Width of one glyph relative to the font size, used when fonts are missing
const FALLBACK_GLYPH_WIDTH: f64 = 0.6;

pub struct TextSafeBackend<DB> {
    inner: DB,
    text_failed: bool,
}

impl<DB> TextSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            text_failed: false,
        }
    }

    fn note_text_failure(&mut self, detail: &str) {
        if !self.text_failed {
            warn!("Text rendering unavailable ({}); labels will be omitted", detail);
            self.text_failed = true;
        }
    }
}

/// Text extent from the font size alone.
fn estimate_from_size<TStyle: BackendTextStyle>(text: &str, style: &TStyle) -> (u32, u32) {
    let size = style.size().max(1.0);
    let width = text.chars().count() as f64 * size * FALLBACK_GLYPH_WIDTH;
    (width.ceil() as u32, size.ceil() as u32)
}

impl<DB: DrawingBackend> DrawingBackend for TextSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if self.text_failed || text.trim().is_empty() {
            return Ok(());
        }
        let inner = &mut self.inner;
        match panic::catch_unwind(AssertUnwindSafe(|| inner.draw_text(text, style, pos))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(DrawingErrorKind::FontError(err))) => {
                self.note_text_failure(&err.to_string());
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                self.note_text_failure("font backend panicked");
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        if self.text_failed {
            return Ok(estimate_from_size(text, style));
        }
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Ok(size)) => Ok(size),
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                Ok(estimate_from_size(text, style))
            }
            Ok(Err(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::style::{IntoFont, TextStyle};
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct NoFont;

    impl fmt::Display for NoFont {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "no font available")
        }
    }

    impl Error for NoFont {}

    #[derive(Default)]
    enum TextFailure {
        #[default]
        FontError,
        Panic,
        Other,
    }

    /// Backend whose text calls always fail in the configured way.
    #[derive(Default)]
    struct FontlessBackend {
        failure: TextFailure,
        text_calls: usize,
        pixels: usize,
    }

    impl DrawingBackend for FontlessBackend {
        type ErrorType = NoFont;

        fn get_size(&self) -> (u32, u32) {
            (100, 100)
        }

        fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<NoFont>> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), DrawingErrorKind<NoFont>> {
            Ok(())
        }

        fn draw_pixel(
            &mut self,
            _point: BackendCoord,
            _color: BackendColor,
        ) -> Result<(), DrawingErrorKind<NoFont>> {
            self.pixels += 1;
            Ok(())
        }

        fn draw_text<TStyle: BackendTextStyle>(
            &mut self,
            _text: &str,
            _style: &TStyle,
            _pos: BackendCoord,
        ) -> Result<(), DrawingErrorKind<NoFont>> {
            self.text_calls += 1;
            match self.failure {
                TextFailure::FontError => Err(DrawingErrorKind::FontError(Box::new(NoFont))),
                TextFailure::Panic => panic!("font loader crashed"),
                TextFailure::Other => Err(DrawingErrorKind::DrawingError(NoFont)),
            }
        }

        fn estimate_text_size<TStyle: BackendTextStyle>(
            &self,
            _text: &str,
            _style: &TStyle,
        ) -> Result<(u32, u32), DrawingErrorKind<NoFont>> {
            Err(DrawingErrorKind::FontError(Box::new(NoFont)))
        }
    }

    fn style() -> TextStyle<'static> {
        TextStyle::from(("sans-serif", 20).into_font())
    }

    #[test]
    fn font_errors_are_swallowed_once() {
        let mut backend = TextSafeBackend::new(FontlessBackend::default());

        assert!(backend.draw_text("title", &style(), (10, 10)).is_ok());
        assert!(backend.text_failed);
        assert!(backend.draw_text("axis", &style(), (10, 30)).is_ok());
        assert!(backend.draw_text("legend", &style(), (10, 50)).is_ok());

        assert_eq!(backend.inner.text_calls, 1);
    }

    #[test]
    fn panicking_font_loader_is_contained() {
        let mut backend = TextSafeBackend::new(FontlessBackend {
            failure: TextFailure::Panic,
            ..Default::default()
        });

        assert!(backend.draw_text("title", &style(), (0, 0)).is_ok());
        assert!(backend.text_failed);
        assert!(backend.draw_text("again", &style(), (0, 0)).is_ok());
        assert_eq!(backend.inner.text_calls, 1);
    }

    #[test]
    fn other_drawing_errors_propagate() {
        let mut backend = TextSafeBackend::new(FontlessBackend {
            failure: TextFailure::Other,
            ..Default::default()
        });

        assert!(matches!(
            backend.draw_text("title", &style(), (0, 0)),
            Err(DrawingErrorKind::DrawingError(NoFont))
        ));
        assert!(!backend.text_failed);
    }

    #[test]
    fn blank_text_never_reaches_the_backend() {
        let mut backend = TextSafeBackend::new(FontlessBackend::default());

        assert!(backend.draw_text("  ", &style(), (0, 0)).is_ok());
        assert_eq!(backend.inner.text_calls, 0);
        assert!(!backend.text_failed);
    }

    #[test]
    fn text_size_falls_back_to_font_size_estimate() {
        let backend = TextSafeBackend::new(FontlessBackend::default());

        assert_eq!(backend.estimate_text_size("abcd", &style()).unwrap(), (48, 20));
        assert_eq!(backend.estimate_text_size("", &style()).unwrap(), (0, 20));
    }

    #[test]
    fn shapes_are_forwarded() {
        let mut backend = TextSafeBackend::new(FontlessBackend::default());

        backend
            .draw_pixel((1, 1), BackendColor { alpha: 1.0, rgb: (0, 0, 0) })
            .unwrap();

        assert_eq!(backend.inner.pixels, 1);
    }
}
