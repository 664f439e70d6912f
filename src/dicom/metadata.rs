//! DICOM metadata structure

use crate::types::{
    EquipmentInfo, PatientInfo, PixelAspectRatio, SOPClass, SeriesInfo, StudyInfo, TransferSyntax,
};

/// Descriptive tags of the image, all optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCharacteristics {
    pub rows: Option<u32>,
    pub columns: Option<u32>,
    pub bits_allocated: Option<u16>,
    pub bits_stored: Option<u16>,
    pub high_bit: Option<u16>,
    pub samples_per_pixel: Option<u16>,
    pub photometric_interpretation: Option<String>,
    pub pixel_spacing: Option<String>,
    pub pixel_aspect_ratio: Option<PixelAspectRatio>,
    pub number_of_frames: u32,
    pub instance_number: Option<String>,
    pub image_type: Option<String>,
}

/// Window stored in the file, in rescaled units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowInfo {
    pub center: Option<f64>,
    pub width: Option<f64>,
    pub explanation: Option<String>,
}

/// DICOM metadata extracted from the file for display
#[derive(Debug, Clone, PartialEq)]
pub struct DicomMetadata {
    pub patient: PatientInfo,
    pub study: StudyInfo,
    pub series: SeriesInfo,
    pub equipment: EquipmentInfo,
    pub image: ImageCharacteristics,
    pub window: WindowInfo,
    pub sop_class: Option<SOPClass>,
    pub sop_instance_uid: Option<String>,
    pub transfer_syntax: TransferSyntax,
}

impl DicomMetadata {
    #[inline]
    #[must_use]
    pub fn modality(&self) -> Option<&str> {
        self.series.modality.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn pixel_aspect_ratio(&self) -> Option<PixelAspectRatio> {
        self.image.pixel_aspect_ratio
    }

    /// Returns true if this DICOM file uses big-endian byte order
    #[inline]
    #[must_use]
    pub fn is_big_endian(&self) -> bool {
        self.transfer_syntax.is_big_endian()
    }

    /// Labelled lines grouped by section, absent values skipped
    #[must_use]
    pub fn sections(&self) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
        let mut sections = Vec::new();

        let patient = fields([
            ("Patient Name", self.patient.name.clone()),
            ("Patient ID", self.patient.id.clone()),
            ("Birth Date", self.patient.birth_date.clone()),
            ("Sex", self.patient.sex.clone()),
            ("Age", self.patient.age.clone()),
        ]);
        push_section(&mut sections, "Patient", patient);

        let study = fields([
            ("Accession Number", self.study.accession_number.clone()),
            ("Study Date", self.study.date.clone()),
            ("Study Time", self.study.time.clone()),
            ("Study Description", self.study.description.clone()),
            ("Study Instance UID", self.study.instance_uid.clone()),
        ]);
        push_section(&mut sections, "Study", study);

        let series = fields([
            ("Modality", self.series.modality.clone()),
            ("Series Number", self.series.number.clone()),
            ("Series Date", self.series.date.clone()),
            ("Series Time", self.series.time.clone()),
            ("Series Description", self.series.description.clone()),
            ("Series Instance UID", self.series.instance_uid.clone()),
            ("Slice Thickness", self.series.slice_thickness.map(|t| format!("{t} mm"))),
        ]);
        push_section(&mut sections, "Series", series);

        let equipment = fields([
            ("Manufacturer", self.equipment.manufacturer.clone()),
            ("Model", self.equipment.model_name.clone()),
            ("Station", self.equipment.station_name.clone()),
            ("Institution", self.equipment.institution_name.clone()),
        ]);
        push_section(&mut sections, "Equipment", equipment);

        let dimensions = self
            .image
            .columns
            .zip(self.image.rows)
            .map(|(cols, rows)| format!("{cols}x{rows}"));
        let image = fields([
            ("Dimensions", dimensions),
            ("Photometric", self.image.photometric_interpretation.clone()),
            ("Bits Allocated", self.image.bits_allocated.map(|b| b.to_string())),
            ("Bits Stored", self.image.bits_stored.map(|b| b.to_string())),
            ("High Bit", self.image.high_bit.map(|b| b.to_string())),
            ("Samples/Pixel", self.image.samples_per_pixel.map(|s| s.to_string())),
            ("Pixel Spacing", self.image.pixel_spacing.clone()),
            ("Aspect Ratio", self.image.pixel_aspect_ratio.map(|r| r.to_string())),
            ("Frames", Some(self.image.number_of_frames.to_string())),
            ("Instance Number", self.image.instance_number.clone()),
            ("Image Type", self.image.image_type.clone()),
        ]);
        push_section(&mut sections, "Image", image);

        let window = fields([
            ("Window Center", self.window.center.map(|c| c.to_string())),
            ("Window Width", self.window.width.map(|w| w.to_string())),
            ("Explanation", self.window.explanation.clone()),
        ]);
        push_section(&mut sections, "Window", window);

        let technical = fields([
            ("SOP Class", self.sop_class.as_ref().map(ToString::to_string)),
            ("SOP Instance UID", self.sop_instance_uid.clone()),
            ("Transfer Syntax", Some(self.transfer_syntax.to_string())),
        ]);
        push_section(&mut sections, "Technical", technical);

        sections
    }
}

fn fields<const N: usize>(entries: [(&'static str, Option<String>); N]) -> Vec<(&'static str, String)> {
    entries
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
}

fn push_section(
    sections: &mut Vec<(&'static str, Vec<(&'static str, String)>)>,
    title: &'static str,
    entries: Vec<(&'static str, String)>,
) {
    if !entries.is_empty() {
        sections.push((title, entries));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> DicomMetadata {
        DicomMetadata {
            patient: PatientInfo {
                name: Some("Doe^Jane".to_string()),
                ..PatientInfo::default()
            },
            study: StudyInfo::default(),
            series: SeriesInfo {
                modality: Some("CT".to_string()),
                ..SeriesInfo::default()
            },
            equipment: EquipmentInfo::default(),
            image: ImageCharacteristics {
                rows: Some(512),
                columns: Some(256),
                number_of_frames: 1,
                ..ImageCharacteristics::default()
            },
            window: WindowInfo {
                center: Some(40.0),
                width: Some(400.0),
                explanation: Some("SOFT TISSUE".to_string()),
            },
            sop_class: None,
            sop_instance_uid: None,
            transfer_syntax: TransferSyntax::new("1.2.840.10008.1.2.1".to_string(), "Explicit VR Little Endian".to_string()),
        }
    }

    #[test]
    fn test_sections_skip_empty_groups() {
        let sections = metadata().sections();
        let titles: Vec<_> = sections.iter().map(|(title, _)| *title).collect();
        assert_eq!(titles, vec!["Patient", "Series", "Image", "Window", "Technical"]);
    }

    #[test]
    fn test_section_contents() {
        let sections = metadata().sections();
        let image = &sections.iter().find(|(title, _)| *title == "Image").unwrap().1;
        assert!(image.contains(&("Dimensions", "256x512".to_string())));

        let window = &sections.iter().find(|(title, _)| *title == "Window").unwrap().1;
        assert_eq!(window[2], ("Explanation", "SOFT TISSUE".to_string()));
    }

    #[test]
    fn test_accessors() {
        let metadata = metadata();
        assert_eq!(metadata.modality(), Some("CT"));
        assert!(!metadata.is_big_endian());
    }
}
