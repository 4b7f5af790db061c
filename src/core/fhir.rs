use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::core::normalize::CodeSystemNormalizer;
use crate::domain::model::CanonicalValueSet;
use crate::utils::error::{Result, VsacError};

pub const FHIR_XML_NS: &str = "http://hl7.org/fhir";
const IDENTIFIER_SYSTEM: &str = "urn:ietf:rfc:3986";

/// FHIR R4 ValueSet resource built from the canonical model: active status,
/// canonical URL, RFC 3986 identifier, and one compose inclusion per code
/// system group with the normalized system URI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirValueSet {
    resource_type: &'static str,
    id: String,
    url: String,
    identifier: Vec<FhirIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    status: &'static str,
    compose: FhirCompose,
}

#[derive(Debug, Clone, Serialize)]
pub struct FhirIdentifier {
    system: String,
    value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FhirCompose {
    include: Vec<FhirInclude>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FhirInclude {
    system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    concept: Vec<FhirConcept>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FhirConcept {
    code: String,
    display: String,
}

impl FhirValueSet {
    pub fn from_canonical(
        value_set: &CanonicalValueSet,
        normalizer: &CodeSystemNormalizer,
        canonical_base: &str,
    ) -> Self {
        let include = value_set
            .groups
            .iter()
            .map(|group| FhirInclude {
                system: normalizer.normalize(&group.system).to_string(),
                version: (!group.version.is_empty()).then(|| group.version.clone()),
                concept: group
                    .concepts
                    .iter()
                    .map(|concept| FhirConcept {
                        code: concept.code.clone(),
                        display: concept.display.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            resource_type: "ValueSet",
            id: value_set.id.clone(),
            url: format!("{}/{}", canonical_base.trim_end_matches('/'), value_set.id),
            identifier: vec![FhirIdentifier {
                system: IDENTIFIER_SYSTEM.to_string(),
                value: value_set.id.clone(),
            }],
            title: value_set.title.clone(),
            status: "active",
            compose: FhirCompose { include },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// FHIR XML encoding: elements in resource order, values carried in
    /// `value` attributes, default namespace `http://hl7.org/fhir`.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(encode_err)?;

        let mut root = BytesStart::new("ValueSet");
        root.push_attribute(("xmlns", FHIR_XML_NS));
        writer.write_event(Event::Start(root)).map_err(encode_err)?;

        write_value_element(&mut writer, "id", &self.id)?;
        write_value_element(&mut writer, "url", &self.url)?;
        for identifier in &self.identifier {
            writer
                .write_event(Event::Start(BytesStart::new("identifier")))
                .map_err(encode_err)?;
            write_value_element(&mut writer, "system", &identifier.system)?;
            write_value_element(&mut writer, "value", &identifier.value)?;
            writer
                .write_event(Event::End(BytesEnd::new("identifier")))
                .map_err(encode_err)?;
        }
        if let Some(title) = &self.title {
            write_value_element(&mut writer, "title", title)?;
        }
        write_value_element(&mut writer, "status", self.status)?;

        writer
            .write_event(Event::Start(BytesStart::new("compose")))
            .map_err(encode_err)?;
        for include in &self.compose.include {
            writer
                .write_event(Event::Start(BytesStart::new("include")))
                .map_err(encode_err)?;
            write_value_element(&mut writer, "system", &include.system)?;
            if let Some(version) = &include.version {
                write_value_element(&mut writer, "version", version)?;
            }
            for concept in &include.concept {
                writer
                    .write_event(Event::Start(BytesStart::new("concept")))
                    .map_err(encode_err)?;
                write_value_element(&mut writer, "code", &concept.code)?;
                write_value_element(&mut writer, "display", &concept.display)?;
                writer
                    .write_event(Event::End(BytesEnd::new("concept")))
                    .map_err(encode_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("include")))
                .map_err(encode_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("compose")))
            .map_err(encode_err)?;

        writer
            .write_event(Event::End(BytesEnd::new("ValueSet")))
            .map_err(encode_err)?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(encode_err)
    }
}

fn write_value_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<()> {
    let mut element = BytesStart::new(name);
    element.push_attribute(("value", value));
    writer.write_event(Event::Empty(element)).map_err(encode_err)
}

fn encode_err<E: std::fmt::Display>(error: E) -> VsacError {
    VsacError::EncodingError {
        message: error.to_string(),
    }
}
