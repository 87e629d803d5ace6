//! Built-in vocabularies
//!
//! The condition code sets used by the accident-report exports: lighting,
//! road surface conditions, weather and vehicle damage. Codes match the
//! column-derived values written by the preprocessing step.

use std::collections::BTreeMap;

use crashtally_core::{Result, TallyError, Vocabulary};

/// Lighting conditions (`lighting_conditions` field)
pub fn lighting() -> Result<Vocabulary> {
    Vocabulary::builder("lighting")
        .field("lighting_conditions")
        .category("lighting_a_1", "Daylight")
        .category("lighting_b_1", "Dusk-Dawn")
        .category("lighting_c_1", "Dark-Street Lights")
        .category("lighting_d_1", "Dark-No Street Lights")
        .category("lighting_e_1", "Dark-Street Lights Not Functioning")
        .build()
}

/// Roadway conditions (`road_conditions` field)
pub fn road() -> Result<Vocabulary> {
    Vocabulary::builder("road")
        .field("road_conditions")
        .category("road_conditions_a_1", "Holes, Deep Rut")
        .category("road_conditions_b_1", "Loose Material on Roadway")
        .category("road_conditions_c_1", "Obstruction on Roadway")
        .category("road_conditions_d_1", "Construction-Repair Zone")
        .category("road_conditions_e_1", "Reduced Roadway Width")
        .category("road_conditions_f_1", "Flooded")
        .category("road_conditions_g_1", "Other")
        .category("road_conditions_h_1", "No Unusual Conditions")
        .build()
}

/// Weather conditions (`weather_conditions` field)
///
/// Values matching no code are counted as `weather_f_1` (Other).
pub fn weather() -> Result<Vocabulary> {
    Vocabulary::builder("weather")
        .field("weather_conditions")
        .colored_category("weather_a_1", "Clear", "#4FC3F7")
        .colored_category("weather_b_1", "Cloudy", "#90A4AE")
        .colored_category("weather_c_1", "Raining", "#1976D2")
        .colored_category("weather_d_1", "Snowing", "#B3E5FC")
        .colored_category("weather_e_1", "Fog/Visibility", "#CFD8DC")
        .colored_category("weather_f_1", "Other", "#78909C")
        .colored_category("weather_g_1", "Wind", "#26A69A")
        .fallback("weather_f_1")
        .build()
}

/// Vehicle damage severity (`vehicle_damage` field)
pub fn vehicle_damage() -> Result<Vocabulary> {
    Vocabulary::builder("vehicle_damage")
        .field("vehicle_damage")
        .colored_category("UNK", "Unknown", "#808080")
        .colored_category("NONE", "None", "#4682B4")
        .colored_category("MINOR", "Minor", "#32CD32")
        .colored_category("MOD", "Moderate", "#FFA500")
        .colored_category("MAJOR", "Major", "#DC143C")
        .build()
}

/// Named lookup over built-in and configured vocabularies
#[derive(Debug, Clone, Default)]
pub struct VocabularyRegistry {
    vocabularies: BTreeMap<String, Vocabulary>,
}

impl VocabularyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in vocabularies
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for vocabulary in [lighting()?, road()?, weather()?, vehicle_damage()?] {
            registry.register(vocabulary);
        }
        Ok(registry)
    }

    /// Add a vocabulary, replacing any with the same name
    pub fn register(&mut self, vocabulary: Vocabulary) -> Option<Vocabulary> {
        self.vocabularies
            .insert(vocabulary.name().to_string(), vocabulary)
    }

    /// Add several vocabularies, replacing same-named entries
    pub fn with_overrides(mut self, vocabularies: impl IntoIterator<Item = Vocabulary>) -> Self {
        for vocabulary in vocabularies {
            if self.register(vocabulary).is_some() {
                tracing::debug!("Configured vocabulary replaced a built-in");
            }
        }
        self
    }

    /// Look up a vocabulary by name
    pub fn get(&self, name: &str) -> Result<&Vocabulary> {
        self.vocabularies
            .get(name)
            .ok_or_else(|| TallyError::UnknownVocabulary(name.to_string()))
    }

    /// Vocabularies sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Vocabulary> {
        self.vocabularies.values()
    }

    /// Vocabulary names sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vocabularies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabularies.is_empty()
    }
}
