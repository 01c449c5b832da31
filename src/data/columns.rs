//! Column names of the three source datasets and of the derived views.
//! These must stay in sync with the headers published by ECDC and the
//! country-code gist.

// Vaccination tracker
pub const REPORTING_COUNTRY: &str = "ReportingCountry";
pub const TARGET_GROUP: &str = "TargetGroup";
pub const VACCINE: &str = "Vaccine";
pub const FIRST_DOSE: &str = "FirstDose";
pub const SECOND_DOSE: &str = "SecondDose";
pub const DOSE_ADDITIONAL_1: &str = "DoseAdditional1";
pub const UNKNOWN_DOSE: &str = "UnknownDose";
pub const DOSES_RECEIVED: &str = "NumberDosesReceived";
pub const DOSES_EXPORTED: &str = "NumberDosesExported";
pub const POPULATION: &str = "Population";
pub const REGION: &str = "Region";
pub const DENOMINATOR: &str = "Denominator";
pub const FIRST_DOSE_REFUSED: &str = "FirstDoseRefused";

/// The four dose stages, in display order.
pub const DOSE_STAGES: [&str; 4] = [FIRST_DOSE, SECOND_DOSE, DOSE_ADDITIONAL_1, UNKNOWN_DOSE];

// Country reference
pub const COUNTRY_NAME: &str = "English short name lower case";
pub const ALPHA_2_CODE: &str = "Alpha-2 code";
pub const ALPHA_3_CODE: &str = "Alpha-3 code";
pub const NUMERIC_CODE: &str = "Numeric code";
pub const ISO_3166_2: &str = "ISO 3166-2";

// Variant surveillance
pub const NUMBER_SEQUENCED_KNOWN_VARIANT: &str = "number_sequenced_known_variant";
pub const PERCENT_VARIANT: &str = "percent_variant";

// Derived
pub const COUNTRY: &str = "Country";
pub const TOTAL_DOSE: &str = "Total_Dose";
pub const VACC_PER_POP: &str = "vacc_per_pop";
pub const RECEIVED_PER_POP: &str = "received_per_pop";
pub const DOSE: &str = "Dose";
pub const COUNT: &str = "count";
