use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::model::{CanonicalValueSet, CodeSystemGroup, Concept};
use crate::utils::error::{Result, VsacError};

/// Parses the SVS retrieval XML into the canonical grouped model.
///
/// Element matching ignores namespace prefixes, so `ns0:ValueSet` and a bare
/// `ValueSet` parse alike. Concepts are grouped by their raw
/// (codeSystem, codeSystemVersion) attribute pair: the first occurrence of a
/// pair creates the group at that position, later occurrences append to it,
/// preserving encounter order for both groups and concepts.
///
/// The title is taken from the value-set element's `displayName` attribute
/// only when the document contains exactly one such element; with zero or
/// several the title stays absent rather than guessing.
pub fn parse_value_set(raw_xml: &str, value_set_id: &str) -> Result<CanonicalValueSet> {
    let mut reader = Reader::from_str(raw_xml);

    let mut groups: Vec<CodeSystemGroup> = Vec::new();
    let mut group_index: HashMap<(String, String), usize> = HashMap::new();
    let mut value_set_elements = 0usize;
    let mut first_title: Option<String> = None;
    let mut saw_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                saw_element = true;
                match element.local_name().as_ref() {
                    b"ValueSet" => {
                        value_set_elements += 1;
                        if value_set_elements == 1 {
                            let display_name = attribute(&element, "displayName")?;
                            if !display_name.is_empty() {
                                first_title = Some(display_name);
                            }
                        }
                    }
                    b"Concept" => {
                        let system = attribute(&element, "codeSystem")?;
                        let version = attribute(&element, "codeSystemVersion")?;
                        let code = attribute(&element, "code")?;
                        let display = attribute(&element, "displayName")?;

                        let key = (system.clone(), version.clone());
                        let index = match group_index.get(&key) {
                            Some(&index) => index,
                            None => {
                                groups.push(CodeSystemGroup {
                                    system,
                                    version,
                                    concepts: Vec::new(),
                                });
                                group_index.insert(key, groups.len() - 1);
                                groups.len() - 1
                            }
                        };
                        groups[index].concepts.push(Concept { code, display });
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(VsacError::MalformedXml {
                    reason: e.to_string(),
                })
            }
        }
    }

    // A document with no elements at all is not XML.
    if !saw_element {
        return Err(VsacError::MalformedXml {
            reason: "no XML elements found".to_string(),
        });
    }

    let title = if value_set_elements == 1 {
        first_title
    } else {
        None
    };

    tracing::debug!(
        "parsed value set {value_set_id}: {} groups, {} concepts",
        groups.len(),
        groups.iter().map(|g| g.concepts.len()).sum::<usize>()
    );

    Ok(CanonicalValueSet {
        id: value_set_id.to_string(),
        title,
        groups,
    })
}

fn attribute(element: &BytesStart, name: &str) -> Result<String> {
    match element.try_get_attribute(name) {
        Ok(Some(attr)) => match attr.unescape_value() {
            Ok(value) => Ok(value.into_owned()),
            Err(e) => Err(VsacError::MalformedXml {
                reason: e.to_string(),
            }),
        },
        // Absent attributes read as empty, matching the source XML's loose schema.
        Ok(None) => Ok(String::new()),
        Err(e) => Err(VsacError::MalformedXml {
            reason: e.to_string(),
        }),
    }
}
