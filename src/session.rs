//! Interactive viewing state: one loaded study plus its rendered buffer
//!
//! Every window operation on an empty session is a no-op returning `None`.

use crate::dicom::{DicomMetadata, LoadedStudy};
use crate::image::{CanonicalImage, DisplayBuffer, WindowLevel, display_buffer};

#[derive(Debug, Default)]
pub struct ViewerSession {
    study: Option<LoadedStudy>,
    cached: Option<DisplayBuffer>,
}

impl ViewerSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current study; the previous one and its buffer are dropped
    pub fn load(&mut self, image: CanonicalImage, metadata: DicomMetadata) {
        log::debug!(
            "session: loaded {} image, window center={} width={}",
            image.dimensions(),
            image.window().center,
            image.window().width
        );
        self.study = Some(LoadedStudy { image, metadata });
        self.cached = None;
    }

    pub fn clear(&mut self) {
        self.study = None;
        self.cached = None;
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.study.is_some()
    }

    #[must_use]
    pub fn image(&self) -> Option<&CanonicalImage> {
        self.study.as_ref().map(|study| &study.image)
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&DicomMetadata> {
        self.study.as_ref().map(|study| &study.metadata)
    }

    #[must_use]
    pub fn window(&self) -> Option<WindowLevel> {
        self.image().map(CanonicalImage::window)
    }

    /// Set the current window; width is clamped to at least 1
    pub fn set_window(&mut self, center: i32, width: i32) -> Option<WindowLevel> {
        let image = self.image_mut()?;
        image.set_window(center, width);
        let window = image.window();
        self.cached = None;
        Some(window)
    }

    /// Restore the window chosen at load time
    pub fn reset_window(&mut self) -> Option<WindowLevel> {
        let image = self.image_mut()?;
        image.reset_window();
        let window = image.window();
        self.cached = None;
        Some(window)
    }

    /// Histogram estimate; `None` (window unchanged) without canonical samples
    pub fn auto_window(&mut self) -> Option<WindowLevel> {
        let window = self.image_mut()?.auto_window()?;
        self.cached = None;
        Some(window)
    }

    /// Display buffer for the current window, rebuilt only after a change
    pub fn display_buffer(&mut self) -> Option<&DisplayBuffer> {
        if self.cached.is_none() {
            let image = self.image()?;
            let window = image.window();
            self.cached = Some(display_buffer::build(image, window.center, window.width));
        }
        self.cached.as_ref()
    }

    /// RGB888 surface for the current window, grayscale replicated per channel
    #[must_use]
    pub fn rgb_display_buffer(&self) -> Option<DisplayBuffer> {
        let image = self.image()?;
        let window = image.window();
        Some(display_buffer::build_rgb(image, window.center, window.width))
    }

    fn image_mut(&mut self) -> Option<&mut CanonicalImage> {
        self.study.as_mut().map(|study| &mut study.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom::{ImageCharacteristics, PhotometricInterpretation, WindowInfo};
    use crate::image::{PixelData, PixelFormat};
    use crate::types::{BitDepth, Dimensions, EquipmentInfo, PatientInfo, SeriesInfo, StudyInfo, TransferSyntax};

    fn metadata() -> DicomMetadata {
        DicomMetadata {
            patient: PatientInfo::default(),
            study: StudyInfo::default(),
            series: SeriesInfo::default(),
            equipment: EquipmentInfo::default(),
            image: ImageCharacteristics::default(),
            window: WindowInfo::default(),
            sop_class: None,
            sop_instance_uid: None,
            transfer_syntax: TransferSyntax::new(String::new(), "Unknown".to_string()),
        }
    }

    fn gray_image() -> CanonicalImage {
        CanonicalImage::new(
            PixelData::Grayscale(vec![0, 32767, 65535, 16000]),
            Dimensions::new(2, 2),
            PhotometricInterpretation::Monochrome2,
            BitDepth::new(16, 16),
            1,
            false,
            WindowLevel::FULL_RANGE,
        )
        .unwrap()
    }

    fn rgb_image() -> CanonicalImage {
        CanonicalImage::new(
            PixelData::Rgb(vec![1, 2, 3, 4, 5, 6]),
            Dimensions::new(2, 1),
            PhotometricInterpretation::Rgb,
            BitDepth::new(8, 8),
            3,
            false,
            WindowLevel::RGB_DEFAULT,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_session_is_noop() {
        let mut session = ViewerSession::new();
        assert!(!session.is_loaded());
        assert_eq!(session.set_window(10, 10), None);
        assert_eq!(session.reset_window(), None);
        assert_eq!(session.auto_window(), None);
        assert_eq!(session.window(), None);
        assert!(session.display_buffer().is_none());
        assert!(session.rgb_display_buffer().is_none());
    }

    #[test]
    fn test_display_buffer_tracks_window() {
        let mut session = ViewerSession::new();
        session.load(gray_image(), metadata());

        assert_eq!(session.display_buffer().map(DisplayBuffer::data), Some(&[0, 128, 255, 62][..]));

        // window [950, 1050]
        session.set_window(1000, 100);
        assert_eq!(session.display_buffer().map(DisplayBuffer::data), Some(&[0, 255, 255, 255][..]));

        session.reset_window();
        assert_eq!(session.window(), Some(WindowLevel::FULL_RANGE));
        assert_eq!(session.display_buffer().map(DisplayBuffer::data), Some(&[0, 128, 255, 62][..]));
    }

    #[test]
    fn test_set_window_clamps_width() {
        let mut session = ViewerSession::new();
        session.load(gray_image(), metadata());
        assert_eq!(session.set_window(500, 0), Some(WindowLevel { center: 500, width: 1 }));
        assert_eq!(session.set_window(500, -40), Some(WindowLevel { center: 500, width: 1 }));
    }

    #[test]
    fn test_auto_then_reset() {
        let mut session = ViewerSession::new();
        session.load(gray_image(), metadata());

        let auto = session.auto_window().unwrap();
        assert_eq!(session.window(), Some(auto));
        assert_eq!(session.reset_window(), Some(WindowLevel::FULL_RANGE));
    }

    #[test]
    fn test_rgb_session_ignores_auto_window() {
        let mut session = ViewerSession::new();
        session.load(rgb_image(), metadata());

        assert_eq!(session.auto_window(), None);
        assert_eq!(session.window(), Some(WindowLevel::RGB_DEFAULT));

        let buffer = session.display_buffer().unwrap();
        assert_eq!(buffer.format(), PixelFormat::Rgb888);
        assert_eq!(buffer.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_load_replaces_study() {
        let mut session = ViewerSession::new();
        session.load(gray_image(), metadata());
        session.set_window(100, 100);
        let _ = session.display_buffer();

        session.load(rgb_image(), metadata());
        assert_eq!(session.window(), Some(WindowLevel::RGB_DEFAULT));
        assert_eq!(session.display_buffer().map(DisplayBuffer::len), Some(6));

        session.clear();
        assert!(session.image().is_none());
    }

    #[test]
    fn test_rgb_surface_from_grayscale() {
        let mut session = ViewerSession::new();
        session.load(gray_image(), metadata());
        let buffer = session.rgb_display_buffer().unwrap();
        assert_eq!(buffer.format(), PixelFormat::Rgb888);
        assert_eq!(&buffer.data()[..6], &[0, 0, 0, 128, 128, 128]);
    }
}
