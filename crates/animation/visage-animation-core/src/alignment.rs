//! Audio alignment documents: which shape is active over which time window.
//!
//! JSON layout:
//! `{ "emotion"?: str, "audio": path, "phonemes": [{ "shape": str, "start": s, "end": s }] }`

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlignmentError {
    #[error("alignment json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alignment has no phoneme segments")]
    Empty,

    #[error("segment {index} has invalid window [{start}, {end})")]
    InvalidSegment { index: usize, start: f64, end: f64 },
}

/// Mood label attached to a line of speech.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Excited,
    Energetic,
    Gloomy,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Excited,
        Emotion::Energetic,
        Emotion::Gloomy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Excited => "excited",
            Emotion::Energetic => "energetic",
            Emotion::Gloomy => "gloomy",
        }
    }

    /// Case-insensitive; unknown labels fall back to neutral.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_else(|| {
                log::warn!("unknown emotion '{label}', using neutral");
                Emotion::Neutral
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSegment {
    pub shape: String,
    pub start: f64,
    pub end: f64,
}

impl AlignmentSegment {
    pub fn new(shape: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            shape: shape.into(),
            start,
            end,
        }
    }

    /// Half-open containment: `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    #[inline]
    pub fn is_pause(&self, pause_shape: &str) -> bool {
        self.shape.is_empty() || self.shape == pause_shape
    }
}

#[derive(Debug, Deserialize)]
struct AlignmentDocument {
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    audio: Option<String>,
    phonemes: Vec<AlignmentSegment>,
}

/// Validated, non-empty list of timed segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub emotion: Emotion,
    /// Audio clip the host should play alongside; not opened here.
    pub audio: Option<String>,
    segments: Vec<AlignmentSegment>,
}

impl Alignment {
    pub fn new(segments: Vec<AlignmentSegment>) -> Result<Self, AlignmentError> {
        if segments.is_empty() {
            return Err(AlignmentError::Empty);
        }
        for (index, s) in segments.iter().enumerate() {
            if !s.start.is_finite() || !s.end.is_finite() || s.end < s.start {
                return Err(AlignmentError::InvalidSegment {
                    index,
                    start: s.start,
                    end: s.end,
                });
            }
        }
        if segments.windows(2).any(|w| w[1].start < w[0].start) {
            log::warn!("alignment segments are not sorted by start time");
        }
        Ok(Self {
            emotion: Emotion::Neutral,
            audio: None,
            segments,
        })
    }

    pub fn from_json(s: &str) -> Result<Self, AlignmentError> {
        let doc: AlignmentDocument = serde_json::from_str(s)?;
        let mut alignment = Self::new(doc.phonemes)?;
        alignment.emotion = doc
            .emotion
            .as_deref()
            .map(Emotion::from_label)
            .unwrap_or_default();
        alignment.audio = doc.audio;
        log::info!(
            "loaded alignment (#segments = {}, duration = {:.2}s)",
            alignment.len(),
            alignment.duration()
        );
        Ok(alignment)
    }

    #[inline]
    pub fn segments(&self) -> &[AlignmentSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment.
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// First segment, in document order, containing `t`.
    pub fn segment_at(&self, t: f64) -> Option<(usize, &AlignmentSegment)> {
        self.segments.iter().enumerate().find(|(_, s)| s.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document() {
        let a = Alignment::from_json(
            r#"{ "emotion": "Happy", "audio": "a.wav",
                 "phonemes": [ { "shape": "AA", "start": 0.0, "end": 0.4 },
                               { "shape": "NEUTRAL", "start": 0.4, "end": 0.9 } ] }"#,
        )
        .unwrap();
        assert_eq!(a.emotion, Emotion::Happy);
        assert_eq!(a.audio.as_deref(), Some("a.wav"));
        assert_eq!(a.len(), 2);
        assert_eq!(a.duration(), 0.9);
    }

    #[test]
    fn unknown_or_missing_emotion_is_neutral() {
        assert_eq!(Emotion::from_label("furious"), Emotion::Neutral);
        let a = Alignment::from_json(
            r#"{ "audio": "a.wav", "phonemes": [ { "shape": "AA", "start": 0, "end": 1 } ] }"#,
        )
        .unwrap();
        assert_eq!(a.emotion, Emotion::Neutral);
    }

    #[test]
    fn windows_are_half_open() {
        let a = Alignment::new(vec![
            AlignmentSegment::new("AA", 0.0, 0.5),
            AlignmentSegment::new("EE", 0.5, 1.0),
        ])
        .unwrap();
        assert_eq!(a.segment_at(0.5).map(|(i, _)| i), Some(1));
        assert_eq!(a.segment_at(1.0), None);
        assert_eq!(a.segment_at(-0.1), None);
    }

    #[test]
    fn empty_and_reversed_rejected() {
        assert!(matches!(Alignment::new(vec![]), Err(AlignmentError::Empty)));
        assert!(matches!(
            Alignment::new(vec![AlignmentSegment::new("AA", 1.0, 0.5)]),
            Err(AlignmentError::InvalidSegment { index: 0, .. })
        ));
        assert!(matches!(
            Alignment::from_json(r#"{ "phonemes": "nope" }"#),
            Err(AlignmentError::Json(_))
        ));
    }

    #[test]
    fn pause_detection() {
        assert!(AlignmentSegment::new("", 0.0, 1.0).is_pause("NEUTRAL"));
        assert!(AlignmentSegment::new("NEUTRAL", 0.0, 1.0).is_pause("NEUTRAL"));
        assert!(!AlignmentSegment::new("neutral", 0.0, 1.0).is_pause("NEUTRAL"));
    }
}
