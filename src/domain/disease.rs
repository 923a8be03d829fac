//! Disease catalog: the classifier's output label space.

use std::collections::BTreeMap;

/// Built-in label → disease name table.
///
/// Names are reproduced exactly as the reference data spells them, including
/// trailing spaces and typos, because they are the join key into the
/// reference tables.
pub const DISEASES: [(u32, &str); 41] = [
    (0, "(vertigo) Paroymsal  Positional Vertigo"),
    (1, "AIDS"),
    (2, "Acne"),
    (3, "Alcoholic hepatitis"),
    (4, "Allergy"),
    (5, "Arthritis"),
    (6, "Bronchial Asthma"),
    (7, "Cervical spondylosis"),
    (8, "Chicken pox"),
    (9, "Chronic cholestasis"),
    (10, "Common Cold"),
    (11, "Dengue"),
    (12, "Diabetes "),
    (13, "Dimorphic hemmorhoids(piles)"),
    (14, "Drug Reaction"),
    (15, "Fungal infection"),
    (16, "GERD"),
    (17, "Gastroenteritis"),
    (18, "Heart attack"),
    (19, "Hepatitis B"),
    (20, "Hepatitis C"),
    (21, "Hepatitis D"),
    (22, "Hepatitis E"),
    (23, "Hypertension "),
    (24, "Hyperthyroidism"),
    (25, "Hypoglycemia"),
    (26, "Hypothyroidism"),
    (27, "Impetigo"),
    (28, "Jaundice"),
    (29, "Malaria"),
    (30, "Migraine"),
    (31, "Osteoarthristis"),
    (32, "Paralysis (brain hemorrhage)"),
    (33, "Peptic ulcer diseae"),
    (34, "Pneumonia"),
    (35, "Psoriasis"),
    (36, "Tuberculosis"),
    (37, "Typhoid"),
    (38, "Urinary tract infection"),
    (39, "Varicose veins"),
    (40, "hepatitis A"),
];

/// Immutable mapping from class label to disease display name.
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    by_label: BTreeMap<u32, String>,
}

impl DiseaseCatalog {
    /// Build a catalog from `(label, name)` pairs.
    ///
    /// # Errors
    /// Returns an error on a repeated label or a repeated name.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut by_label = BTreeMap::new();
        for (label, name) in entries {
            let name = name.into();
            if by_label.values().any(|n| n == &name) {
                return Err(format!("Duplicate disease name in catalog: {name:?}"));
            }
            if by_label.insert(label, name).is_some() {
                return Err(format!("Duplicate disease label in catalog: {label}"));
            }
        }
        Ok(Self { by_label })
    }

    /// The catalog the bundled model was trained against.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            by_label: DISEASES
                .iter()
                .map(|(label, name)| (*label, (*name).to_string()))
                .collect(),
        }
    }

    #[must_use]
    pub fn name(&self, label: u32) -> Option<&str> {
        self.by_label.get(&label).map(String::as_str)
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_label.values().any(|n| n == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_label.keys().copied()
    }

    /// Display names in label order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_label.values().map(String::as_str)
    }

    /// Find a catalog name that differs from `name` only by case or
    /// surrounding whitespace. Used to explain join-key mismatches.
    #[must_use]
    pub fn near_match(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.names().find(|n| n.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = DiseaseCatalog::builtin();
        assert_eq!(catalog.len(), 41);
        assert_eq!(catalog.name(15), Some("Fungal infection"));
        assert_eq!(catalog.name(12), Some("Diabetes "));
        assert_eq!(catalog.name(41), None);
        assert!(catalog.contains_name("Hypertension "));
        assert!(!catalog.contains_name("Hypertension"));
    }

    #[test]
    fn test_near_match_explains_whitespace_mismatch() {
        let catalog = DiseaseCatalog::builtin();
        assert_eq!(catalog.near_match("Diabetes"), Some("Diabetes "));
        assert_eq!(catalog.near_match("fungal infection"), Some("Fungal infection"));
        assert_eq!(catalog.near_match("Scurvy"), None);
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        assert!(DiseaseCatalog::from_entries([(1, "A"), (1, "B")]).is_err());
        assert!(DiseaseCatalog::from_entries([(1, "A"), (2, "A")]).is_err());
        let catalog = DiseaseCatalog::from_entries([(7, "A")]).expect("Should build");
        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec![7]);
    }
}
