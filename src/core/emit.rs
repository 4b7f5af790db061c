use std::fmt;

use crate::core::fhir::FhirValueSet;
use crate::core::normalize::CodeSystemNormalizer;
use crate::core::parser::parse_value_set;
use crate::domain::model::CanonicalValueSet;
use crate::utils::error::{Result, VsacError};

/// Requested output encoding. Anything else fails with `UnsupportedFormat`
/// before any network or parse work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    RawXml,
    FhirJson,
    FhirXml,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format {
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::RawXml),
            // Both spellings accepted; the dash variants come from the
            // original fetch surface.
            "fhir+json" | "fhir-json" => Ok(Self::FhirJson),
            "fhir+xml" | "fhir-xml" => Ok(Self::FhirXml),
            other => Err(VsacError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::RawXml => "xml",
            Self::FhirJson => "json",
            Self::FhirXml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::RawXml => "xml",
            Self::FhirJson => "fhir+json",
            Self::FhirXml => "fhir+xml",
        };
        f.write_str(name)
    }
}

/// Renders a fetched value set into the requested encoding.
///
/// The raw XML variant passes the response through untouched; every other
/// variant parses into the canonical model first and normalizes code system
/// identifiers on the way out.
pub struct Emitter {
    normalizer: CodeSystemNormalizer,
    fhir_base: String,
}

impl Emitter {
    pub fn new(fhir_base: impl Into<String>) -> Self {
        Self {
            normalizer: CodeSystemNormalizer::new(),
            fhir_base: fhir_base.into(),
        }
    }

    pub fn render(
        &self,
        format: OutputFormat,
        value_set_id: &str,
        raw_xml: &str,
    ) -> Result<String> {
        match format {
            OutputFormat::RawXml => Ok(raw_xml.to_string()),
            OutputFormat::Csv => {
                let value_set = parse_value_set(raw_xml, value_set_id)?;
                self.to_csv(&value_set)
            }
            OutputFormat::FhirJson => {
                let value_set = parse_value_set(raw_xml, value_set_id)?;
                FhirValueSet::from_canonical(&value_set, &self.normalizer, &self.fhir_base)
                    .to_json()
            }
            OutputFormat::FhirXml => {
                let value_set = parse_value_set(raw_xml, value_set_id)?;
                FhirValueSet::from_canonical(&value_set, &self.normalizer, &self.fhir_base)
                    .to_xml()
            }
        }
    }

    fn to_csv(&self, value_set: &CanonicalValueSet) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["System", "Version", "Code", "Display"])?;

        for group in &value_set.groups {
            let system = self.normalizer.normalize(&group.system);
            for concept in &group.concepts {
                writer.write_record([
                    system,
                    group.version.as_str(),
                    concept.code.as_str(),
                    concept.display.as_str(),
                ])?;
            }
        }

        let bytes = writer.into_inner().map_err(|e| VsacError::EncodingError {
            message: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| VsacError::EncodingError {
            message: e.to_string(),
        })
    }
}
