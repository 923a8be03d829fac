//! Domain layer: Core business types and logic.
//!
//! Catalogs, vectors, reference rows and account types. Nothing in here
//! touches the filesystem, the network or the database.

mod disease;
pub mod password;
mod prediction;
mod quality;
mod reference;
mod symptom;
mod user;

pub use disease::{DiseaseCatalog, DISEASES};
pub use prediction::{PredictionError, PredictionResult, NO_DESCRIPTION};
pub use quality::{disease_name_defects, symptom_name_defects, NameDefect};
pub use reference::{
    CoverageReport, DescriptionRow, DietRow, DiseaseRow, MedicationRow, PrecautionRow,
    ReferenceTables, SymptomRow, TableKind, UnknownDisease, WorkoutRow, MAX_PRECAUTIONS,
};
pub use symptom::{SymptomCatalog, SymptomVector, Vectorized, SYMPTOM_COUNT, SYMPTOM_NAMES};
pub use user::{
    normalize_email, LoginForm, NewUser, Session, SessionToken, SignupForm, User,
    MAX_EMAIL_LEN, MAX_USERNAME_LEN,
};
