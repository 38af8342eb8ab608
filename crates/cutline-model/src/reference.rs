//! Media references tie clips to the media that backs them.

use cutline_time::{RationalTime, TimeRange};

use crate::error::{TimelineError, TimelineResult};
use crate::metadata::Metadata;

/// Key under which a clip's default media reference is stored.
pub const DEFAULT_MEDIA_KEY: &str = "DEFAULT_MEDIA";

/// What to do when an image sequence is asked for a frame it does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFramePolicy {
    /// Treat the request as an error.
    #[default]
    Error,
    /// Hold the nearest available frame.
    Hold,
    /// Substitute black.
    Black,
}

impl MissingFramePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingFramePolicy::Error => "error",
            MissingFramePolicy::Hold => "hold",
            MissingFramePolicy::Black => "black",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<MissingFramePolicy> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(MissingFramePolicy::Error),
            "hold" => Some(MissingFramePolicy::Hold),
            "black" => Some(MissingFramePolicy::Black),
            _ => None,
        }
    }
}

/// A reference to media stored as a numbered frame sequence on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSequenceReference {
    pub target_url_base: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub start_frame: i64,
    pub frame_step: i64,
    pub rate: f64,
    pub frame_zero_padding: u32,
    pub missing_frame_policy: MissingFramePolicy,
    pub available_range: Option<TimeRange>,
    pub metadata: Metadata,
}

impl ImageSequenceReference {
    /// Number of image files the sequence spans, honoring `frame_step`.
    ///
    /// A 100 frame range at the sequence rate with a step of 2 is 50 images.
    pub fn number_of_images_in_sequence(&self) -> TimelineResult<i64> {
        let range = self
            .available_range
            .ok_or(TimelineError::NoAvailableRange {
                name: self.name_prefix.clone(),
            })?;
        let frames = range.duration.rescaled_to(self.rate).map_err(TimelineError::Time)?;
        let step = self.frame_step.max(1);
        Ok((frames.value / step as f64).ceil() as i64)
    }

    /// The on-disk frame number for the nth image in the sequence.
    pub fn frame_for_image_number(&self, image_number: i64) -> i64 {
        self.start_frame + image_number * self.frame_step.max(1)
    }

    /// The on-disk frame number of the last image in the sequence.
    pub fn end_frame(&self) -> TimelineResult<i64> {
        let count = self.number_of_images_in_sequence()?;
        Ok(self.frame_for_image_number((count - 1).max(0)))
    }

    /// The on-disk frame number covering `time`, which must fall inside the
    /// available range.
    pub fn frame_for_time(&self, time: RationalTime) -> TimelineResult<i64> {
        let range = self
            .available_range
            .ok_or(TimelineError::NoAvailableRange {
                name: self.name_prefix.clone(),
            })?;
        if !range.contains(time) {
            return Err(TimelineError::OutOfAvailableRange {
                reason: format!(
                    "time {} is outside the sequence's available range",
                    time
                ),
            });
        }
        let offset = time
            .checked_sub(range.start_time)
            .map_err(TimelineError::Time)?
            .rescaled_to(self.rate)
            .map_err(TimelineError::Time)?;
        Ok(self.start_frame + offset.value.floor() as i64)
    }

    /// The full URL of the nth image in the sequence.
    pub fn target_url_for_image_number(&self, image_number: i64) -> TimelineResult<String> {
        let count = self.number_of_images_in_sequence()?;
        if image_number < 0 || image_number >= count {
            return Err(TimelineError::IndexOutOfBounds {
                index: image_number.max(0) as usize,
                len: count.max(0) as usize,
            });
        }
        let frame = self.frame_for_image_number(image_number);
        let sep = if self.target_url_base.ends_with('/') {
            ""
        } else {
            "/"
        };
        Ok(format!(
            "{}{}{}{:0width$}{}",
            self.target_url_base,
            sep,
            self.name_prefix,
            frame,
            self.name_suffix,
            width = self.frame_zero_padding as usize,
        ))
    }
}

/// What a generator reference synthesizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorKind {
    SolidColor,
    SmpteBars,
    Black,
    Custom(String),
}

impl GeneratorKind {
    pub fn as_str(&self) -> &str {
        match self {
            GeneratorKind::SolidColor => "SolidColor",
            GeneratorKind::SmpteBars => "SMPTEBars",
            GeneratorKind::Black => "Black",
            GeneratorKind::Custom(s) => s,
        }
    }

    pub fn from_name(s: &str) -> GeneratorKind {
        match s {
            "SolidColor" => GeneratorKind::SolidColor,
            "SMPTEBars" => GeneratorKind::SmpteBars,
            "Black" => GeneratorKind::Black,
            other => GeneratorKind::Custom(other.to_owned()),
        }
    }
}

/// Where a clip's media lives.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaReference {
    /// Media addressed by URL.
    External {
        target_url: String,
        available_range: Option<TimeRange>,
        metadata: Metadata,
    },
    /// A placeholder for media that is known to exist but is not present.
    Missing,
    /// Synthesized media such as bars or a solid color.
    Generator {
        generator_kind: GeneratorKind,
        available_range: Option<TimeRange>,
        metadata: Metadata,
    },
    /// A numbered image sequence.
    ImageSequence(ImageSequenceReference),
}

impl MediaReference {
    pub fn external(target_url: impl Into<String>, available_range: Option<TimeRange>) -> Self {
        MediaReference::External {
            target_url: target_url.into(),
            available_range,
            metadata: Metadata::new(),
        }
    }

    pub fn generator(kind: GeneratorKind, available_range: Option<TimeRange>) -> Self {
        MediaReference::Generator {
            generator_kind: kind,
            available_range,
            metadata: Metadata::new(),
        }
    }

    /// The range of media this reference can supply, if known.
    pub fn available_range(&self) -> Option<TimeRange> {
        match self {
            MediaReference::External {
                available_range, ..
            } => *available_range,
            MediaReference::Missing => None,
            MediaReference::Generator {
                available_range, ..
            } => *available_range,
            MediaReference::ImageSequence(seq) => seq.available_range,
        }
    }

    /// True when the reference points at retrievable media.
    pub fn is_missing(&self) -> bool {
        matches!(self, MediaReference::Missing)
    }
}
