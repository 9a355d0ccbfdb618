//! Mood axes as reported by the image analyzer, and their slider form.
//!
//! Upstream describes each of the six axes asymmetrically: which pole won
//! (`selected`) and how strongly (`intensity`, 0..=100).  The player edits a
//! symmetric value instead, where 0 is fully pole A and 100 is fully pole B.
//!
//! ```text
//!   selected == pole B  →  slider = intensity
//!   otherwise           →  slider = 100 - intensity
//! ```

use serde::{Deserialize, Serialize};

/// One of the six fixed mood categories, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodAxisKind {
    Energy,
    Tempo,
    Temperature,
    Brightness,
    Atmosphere,
    Density,
}

/// A pole label as the analyzer emits it, plus an English alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pole {
    pub label: &'static str,
    pub alias: &'static str,
}

impl Pole {
    const fn new(label: &'static str, alias: &'static str) -> Self {
        Self { label, alias }
    }

    /// True when `selected` names this pole (exact label or English alias).
    pub fn matches(&self, selected: &str) -> bool {
        let s = selected.trim();
        s == self.label || s.eq_ignore_ascii_case(self.alias)
    }
}

impl MoodAxisKind {
    pub const ALL: [MoodAxisKind; 6] = [
        MoodAxisKind::Energy,
        MoodAxisKind::Tempo,
        MoodAxisKind::Temperature,
        MoodAxisKind::Brightness,
        MoodAxisKind::Atmosphere,
        MoodAxisKind::Density,
    ];

    /// Wire key, e.g. `"energy"`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Tempo => "tempo",
            Self::Temperature => "temperature",
            Self::Brightness => "brightness",
            Self::Atmosphere => "atmosphere",
            Self::Density => "density",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Tempo => "Tempo",
            Self::Temperature => "Temperature",
            Self::Brightness => "Brightness",
            Self::Atmosphere => "Atmosphere",
            Self::Density => "Density",
        }
    }

    /// The slider's 0 end.
    pub fn pole_a(self) -> Pole {
        match self {
            Self::Energy => Pole::new("힙함", "hip"),
            Self::Tempo => Pole::new("신나는", "excited"),
            Self::Temperature => Pole::new("따뜻한", "warm"),
            Self::Brightness => Pole::new("밝은", "bright"),
            Self::Atmosphere => Pole::new("몽환적인", "dreamy"),
            Self::Density => Pole::new("미니멀한", "minimal"),
        }
    }

    /// The slider's 100 end.
    pub fn pole_b(self) -> Pole {
        match self {
            Self::Energy => Pole::new("잔잔함", "calm"),
            Self::Tempo => Pole::new("차분한", "relaxed"),
            Self::Temperature => Pole::new("차가운", "cold"),
            Self::Brightness => Pole::new("어두운", "dark"),
            Self::Atmosphere => Pole::new("선명한", "clear"),
            Self::Density => Pole::new("풍성한", "rich"),
        }
    }
}

/// Raw analyzer output for one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodAxis {
    pub selected: String,
    pub intensity: u8,
}

impl MoodAxis {
    pub fn new(selected: impl Into<String>, intensity: u8) -> Self {
        Self {
            selected: selected.into(),
            intensity: intensity.min(100),
        }
    }
}

/// All six axes; always complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub energy: MoodAxis,
    pub tempo: MoodAxis,
    pub temperature: MoodAxis,
    pub brightness: MoodAxis,
    pub atmosphere: MoodAxis,
    pub density: MoodAxis,
}

impl Mood {
    pub fn axis(&self, kind: MoodAxisKind) -> &MoodAxis {
        match kind {
            MoodAxisKind::Energy => &self.energy,
            MoodAxisKind::Tempo => &self.tempo,
            MoodAxisKind::Temperature => &self.temperature,
            MoodAxisKind::Brightness => &self.brightness,
            MoodAxisKind::Atmosphere => &self.atmosphere,
            MoodAxisKind::Density => &self.density,
        }
    }
}

/// Symmetric slider values, one per axis, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoodSliders {
    pub energy: u8,
    pub tempo: u8,
    pub temperature: u8,
    pub brightness: u8,
    pub atmosphere: u8,
    pub density: u8,
}

impl MoodSliders {
    pub fn get(&self, kind: MoodAxisKind) -> u8 {
        match kind {
            MoodAxisKind::Energy => self.energy,
            MoodAxisKind::Tempo => self.tempo,
            MoodAxisKind::Temperature => self.temperature,
            MoodAxisKind::Brightness => self.brightness,
            MoodAxisKind::Atmosphere => self.atmosphere,
            MoodAxisKind::Density => self.density,
        }
    }

    /// Set one axis, clamped to 100.
    pub fn set(&mut self, kind: MoodAxisKind, value: u8) {
        let value = value.min(100);
        match kind {
            MoodAxisKind::Energy => self.energy = value,
            MoodAxisKind::Tempo => self.tempo = value,
            MoodAxisKind::Temperature => self.temperature = value,
            MoodAxisKind::Brightness => self.brightness = value,
            MoodAxisKind::Atmosphere => self.atmosphere = value,
            MoodAxisKind::Density => self.density = value,
        }
    }

    /// Back to the analyzer's shape: the nearer pole wins, ties go to pole B.
    pub fn to_mood(&self) -> Mood {
        let axis = |kind: MoodAxisKind| {
            let v = self.get(kind);
            if v >= 50 {
                MoodAxis::new(kind.pole_b().label, v)
            } else {
                MoodAxis::new(kind.pole_a().label, 100 - v)
            }
        };
        Mood {
            energy: axis(MoodAxisKind::Energy),
            tempo: axis(MoodAxisKind::Tempo),
            temperature: axis(MoodAxisKind::Temperature),
            brightness: axis(MoodAxisKind::Brightness),
            atmosphere: axis(MoodAxisKind::Atmosphere),
            density: axis(MoodAxisKind::Density),
        }
    }
}

/// A tag shown under the playlist: the winning label for one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub reason: String,
    pub value: u8,
}

/// One keyword per axis, in canonical axis order.
pub fn keywords_from_mood(mood: &Mood) -> Vec<Keyword> {
    MoodAxisKind::ALL
        .iter()
        .map(|&kind| {
            let axis = mood.axis(kind);
            Keyword {
                keyword: axis.selected.clone(),
                reason: kind.display_name().to_string(),
                value: axis.intensity,
            }
        })
        .collect()
}

/// Slider value for a single axis.  An unrecognised label is treated as
/// pole A.
pub fn slider_value(kind: MoodAxisKind, axis: &MoodAxis) -> u8 {
    let intensity = axis.intensity.min(100);
    if kind.pole_b().matches(&axis.selected) {
        intensity
    } else {
        100 - intensity
    }
}

pub fn sliders_from_mood(mood: &Mood) -> MoodSliders {
    let mut sliders = MoodSliders::default();
    for kind in MoodAxisKind::ALL {
        sliders.set(kind, slider_value(kind, mood.axis(kind)));
    }
    sliders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(label_for: impl Fn(MoodAxisKind) -> &'static str, intensity: u8) -> Mood {
        let axis = |k| MoodAxis::new(label_for(k), intensity);
        Mood {
            energy: axis(MoodAxisKind::Energy),
            tempo: axis(MoodAxisKind::Tempo),
            temperature: axis(MoodAxisKind::Temperature),
            brightness: axis(MoodAxisKind::Brightness),
            atmosphere: axis(MoodAxisKind::Atmosphere),
            density: axis(MoodAxisKind::Density),
        }
    }

    #[test]
    fn test_slider_follows_selected_pole_for_every_intensity() {
        for intensity in 0..=100u8 {
            let b = sliders_from_mood(&uniform(|k| k.pole_b().label, intensity));
            let a = sliders_from_mood(&uniform(|k| k.pole_a().label, intensity));
            for kind in MoodAxisKind::ALL {
                assert_eq!(b.get(kind), intensity, "{:?} pole B", kind);
                assert_eq!(a.get(kind), 100 - intensity, "{:?} pole A", kind);
            }
        }
    }

    #[test]
    fn test_tempo_pole_b_is_calm_label() {
        let mut mood = uniform(|k| k.pole_a().label, 40);
        mood.tempo = MoodAxis::new("차분한", 70);
        assert_eq!(sliders_from_mood(&mood).tempo, 70);
    }

    #[test]
    fn test_english_alias_matches_pole() {
        let mut mood = uniform(|k| k.pole_a().label, 0);
        mood.temperature = MoodAxis::new("Cold", 80);
        assert_eq!(sliders_from_mood(&mood).temperature, 80);
    }

    #[test]
    fn test_unknown_label_falls_back_to_pole_a() {
        let mut mood = uniform(|k| k.pole_b().label, 50);
        mood.density = MoodAxis::new("???", 30);
        assert_eq!(sliders_from_mood(&mood).density, 70);
    }

    #[test]
    fn test_keywords_are_stable_and_ordered() {
        let mood = uniform(|k| k.pole_b().label, 65);
        let first = keywords_from_mood(&mood);
        let second = keywords_from_mood(&mood);
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
        let reasons: Vec<&str> = first.iter().map(|k| k.reason.as_str()).collect();
        assert_eq!(
            reasons,
            ["Energy", "Tempo", "Temperature", "Brightness", "Atmosphere", "Density"]
        );
        assert_eq!(first[1].keyword, "차분한");
        assert!(first.iter().all(|k| k.value == 65));
    }

    #[test]
    fn test_to_mood_restores_selection_when_strong() {
        let mood = uniform(|k| k.pole_b().label, 80);
        let back = sliders_from_mood(&mood).to_mood();
        assert_eq!(back, mood);

        let mood = uniform(|k| k.pole_a().label, 90);
        let back = sliders_from_mood(&mood).to_mood();
        assert_eq!(back, mood);
    }

    #[test]
    fn test_set_clamps() {
        let mut s = MoodSliders::default();
        s.set(MoodAxisKind::Energy, 250);
        assert_eq!(s.energy, 100);
    }
}
