use std::collections::HashMap;

/// Maps raw code-system identifiers (canonical URI, OID, or common short
/// name) to the canonical FHIR URI for that terminology.
///
/// The table is built once at construction and never mutated; the normalizer
/// is injected wherever normalization is needed and is safe to share across
/// threads. Unrecognized identifiers pass through unchanged.
#[derive(Debug, Clone)]
pub struct CodeSystemNormalizer {
    aliases: HashMap<&'static str, &'static str>,
}

const SNOMED: &str = "http://snomed.info/sct";
const LOINC: &str = "http://loinc.org";
const RXNORM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";
const ICD10: &str = "http://hl7.org/fhir/sid/icd-10";
const ICD10CM: &str = "http://hl7.org/fhir/sid/icd-10-cm";
const CPT: &str = "http://www.ama-assn.org/go/cpt";

impl CodeSystemNormalizer {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();

        // SNOMED CT
        aliases.insert(SNOMED, SNOMED);
        aliases.insert("2.16.840.1.113883.6.96", SNOMED);
        aliases.insert("SNOMEDCT", SNOMED);

        // LOINC
        aliases.insert(LOINC, LOINC);
        aliases.insert("2.16.840.1.113883.6.1", LOINC);
        aliases.insert("LOINC", LOINC);

        // RxNorm
        aliases.insert(RXNORM, RXNORM);
        aliases.insert("2.16.840.1.113883.6.88", RXNORM);
        aliases.insert("RxNorm", RXNORM);

        // ICD-10
        aliases.insert(ICD10, ICD10);
        aliases.insert("2.16.840.1.113883.6.3", ICD10);
        aliases.insert("ICD10", ICD10);
        aliases.insert("ICD-10", ICD10);

        // ICD-10-CM
        aliases.insert(ICD10CM, ICD10CM);
        aliases.insert("2.16.840.1.113883.6.90", ICD10CM);
        aliases.insert("ICD10CM", ICD10CM);
        aliases.insert("ICD-10-CM", ICD10CM);

        // CPT
        aliases.insert(CPT, CPT);
        aliases.insert("2.16.840.1.113883.6.12", CPT);
        aliases.insert("CPT", CPT);

        Self { aliases }
    }

    /// Canonical URI for `identifier`, or `identifier` itself when unknown.
    pub fn normalize<'a>(&self, identifier: &'a str) -> &'a str {
        match self.aliases.get(identifier) {
            Some(canonical) => canonical,
            None => identifier,
        }
    }
}

impl Default for CodeSystemNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
