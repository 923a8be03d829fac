//! Symptom catalog and binary symptom vectors.
//!
//! The catalog defines the classifier's input feature space: every known
//! symptom name owns exactly one slot of the vector. Names are matched
//! exactly and case-sensitively. A handful of keys carry irregular spelling
//! (embedded spaces, a `.1` suffix); they are kept verbatim because the
//! trained model's feature layout depends on them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PredictionError;

/// Number of symptom slots the built-in catalog defines.
pub const SYMPTOM_COUNT: usize = 132;

/// Built-in symptom names in slot order.
pub const SYMPTOM_NAMES: [&str; SYMPTOM_COUNT] = [
    "itching",
    "skin_rash",
    "nodal_skin_eruptions",
    "continuous_sneezing",
    "shivering",
    "chills",
    "joint_pain",
    "stomach_pain",
    "acidity",
    "ulcers_on_tongue",
    "muscle_wasting",
    "vomiting",
    "burning_micturition",
    "spotting_ urination",
    "fatigue",
    "weight_gain",
    "anxiety",
    "cold_hands_and_feets",
    "mood_swings",
    "weight_loss",
    "restlessness",
    "lethargy",
    "patches_in_throat",
    "irregular_sugar_level",
    "cough",
    "high_fever",
    "sunken_eyes",
    "breathlessness",
    "sweating",
    "dehydration",
    "indigestion",
    "headache",
    "yellowish_skin",
    "dark_urine",
    "nausea",
    "loss_of_appetite",
    "pain_behind_the_eyes",
    "back_pain",
    "constipation",
    "abdominal_pain",
    "diarrhoea",
    "mild_fever",
    "yellow_urine",
    "yellowing_of_eyes",
    "acute_liver_failure",
    "fluid_overload",
    "swelling_of_stomach",
    "swelled_lymph_nodes",
    "malaise",
    "blurred_and_distorted_vision",
    "phlegm",
    "throat_irritation",
    "redness_of_eyes",
    "sinus_pressure",
    "runny_nose",
    "congestion",
    "chest_pain",
    "weakness_in_limbs",
    "fast_heart_rate",
    "pain_during_bowel_movements",
    "pain_in_anal_region",
    "bloody_stool",
    "irritation_in_anus",
    "neck_pain",
    "dizziness",
    "cramps",
    "bruising",
    "obesity",
    "swollen_legs",
    "swollen_blood_vessels",
    "puffy_face_and_eyes",
    "enlarged_thyroid",
    "brittle_nails",
    "swollen_extremeties",
    "excessive_hunger",
    "extra_marital_contacts",
    "drying_and_tingling_lips",
    "slurred_speech",
    "knee_pain",
    "hip_joint_pain",
    "muscle_weakness",
    "stiff_neck",
    "swelling_joints",
    "movement_stiffness",
    "spinning_movements",
    "loss_of_balance",
    "unsteadiness",
    "weakness_of_one_body_side",
    "loss_of_smell",
    "bladder_discomfort",
    "foul_smell_of urine",
    "continuous_feel_of_urine",
    "passage_of_gases",
    "internal_itching",
    "toxic_look_(typhos)",
    "depression",
    "irritability",
    "muscle_pain",
    "altered_sensorium",
    "red_spots_over_body",
    "belly_pain",
    "abnormal_menstruation",
    "dischromic _patches",
    "watering_from_eyes",
    "increased_appetite",
    "polyuria",
    "family_history",
    "mucoid_sputum",
    "rusty_sputum",
    "lack_of_concentration",
    "visual_disturbances",
    "receiving_blood_transfusion",
    "receiving_unsterile_injections",
    "coma",
    "stomach_bleeding",
    "distention_of_abdomen",
    "history_of_alcohol_consumption",
    "fluid_overload.1",
    "blood_in_sputum",
    "prominent_veins_on_calf",
    "palpitations",
    "painful_walking",
    "pus_filled_pimples",
    "blackheads",
    "scurring",
    "skin_peeling",
    "silver_like_dusting",
    "small_dents_in_nails",
    "inflammatory_nails",
    "blister",
    "red_sore_around_nose",
    "yellow_crust_ooze",
];

/// Immutable mapping from symptom name to vector slot.
#[derive(Debug, Clone)]
pub struct SymptomCatalog {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

impl SymptomCatalog {
    /// Build a catalog from names in slot order.
    ///
    /// # Errors
    /// Returns an error if the same name appears twice.
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut slots = HashMap::with_capacity(names.len());
        for (slot, name) in names.iter().enumerate() {
            if slots.insert(name.clone(), slot).is_some() {
                return Err(format!("Duplicate symptom name in catalog: {name:?}"));
            }
        }
        Ok(Self { names, slots })
    }

    /// The catalog the bundled model was trained against.
    #[must_use]
    pub fn builtin() -> Self {
        let names: Vec<String> = SYMPTOM_NAMES.iter().map(|s| (*s).to_string()).collect();
        let slots = names
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.clone(), slot))
            .collect();
        Self { names, slots }
    }

    /// Number of slots (the vector length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot for an exact symptom name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Names in slot order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Turn a comma-separated symptom string into a presence vector.
    ///
    /// Pieces are trimmed and empty pieces dropped. Tokens that are not in
    /// the catalog are skipped with a warning.
    ///
    /// # Errors
    /// - `PredictionError::EmptyInput` if no tokens remain after trimming.
    /// - `PredictionError::NoValidSymptoms` if no token matched.
    pub fn vectorize(&self, raw_input: &str) -> Result<Vectorized, PredictionError> {
        let tokens: Vec<&str> = raw_input
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return Err(PredictionError::EmptyInput);
        }

        let mut vector = SymptomVector::zeros(self.len());
        let mut matched = Vec::new();
        let mut ignored = Vec::new();

        for token in tokens {
            match self.slot(token) {
                Some(slot) => {
                    if !vector.is_set(slot) {
                        matched.push(token.to_string());
                    }
                    vector.set(slot);
                }
                None => {
                    tracing::warn!("Symptom {:?} not found in symptom catalog", token);
                    ignored.push(token.to_string());
                }
            }
        }

        if vector.active_count() == 0 {
            return Err(PredictionError::NoValidSymptoms);
        }

        Ok(Vectorized {
            vector,
            matched,
            ignored,
        })
    }
}

/// Fixed-length 0/1 symptom-presence vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomVector {
    values: Vec<u8>,
}

impl SymptomVector {
    /// All-zero vector of the given length.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    /// Mark a slot as present. Out-of-range slots are ignored.
    pub fn set(&mut self, slot: usize) {
        if let Some(v) = self.values.get_mut(slot) {
            *v = 1;
        }
    }

    #[must_use]
    pub fn is_set(&self, slot: usize) -> bool {
        self.values.get(slot).is_some_and(|v| *v == 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of slots set to 1.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|v| **v == 1).count()
    }

    /// Indices of the set slots, ascending.
    #[must_use]
    pub fn active_slots(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| (*v == 1).then_some(i))
            .collect()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Convert to the numeric form classifiers consume.
    #[must_use]
    pub fn to_features(&self) -> Vec<f64> {
        self.values.iter().map(|v| f64::from(*v)).collect()
    }
}

/// Output of [`SymptomCatalog::vectorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vectorized {
    pub vector: SymptomVector,
    /// Catalog names that set a slot, in input order, without repeats.
    pub matched: Vec<String>,
    /// Tokens that matched nothing, in input order.
    pub ignored: Vec<String>,
}
