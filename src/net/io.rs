//! I/O 支持：JSON、RON 网描述以及 PNML 导入（`feature = "pnml"`）。
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{Net, NetBuilder};
use crate::net::structure::ArcDirection;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron syntax error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("pnml error: {0}")]
    Pnml(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescription {
    pub id: String,
    #[serde(default)]
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDescription {
    pub source: String,
    pub target: String,
}

/// Identifier-level net document, the serde counterpart of [`NetBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescription {
    #[serde(default)]
    pub name: String,
    pub places: Vec<PlaceDescription>,
    #[serde(default)]
    pub transitions: Vec<String>,
    #[serde(default)]
    pub arcs: Vec<ArcDescription>,
}

impl NetDescription {
    /// Replays the document through a [`NetBuilder`], so invalid arcs get
    /// the usual diagnostics.
    pub fn to_net(&self) -> Net {
        let mut builder = NetBuilder::new(self.name.clone());
        for place in &self.places {
            builder.add_place(place.id.clone(), place.marked);
        }
        for transition in &self.transitions {
            builder.add_transition(transition.clone());
        }
        for arc in &self.arcs {
            builder.add_arc(&arc.source, &arc.target);
        }
        builder.build()
    }

    pub fn from_net(net: &Net) -> Self {
        let places = net
            .places
            .iter_enumerated()
            .map(|(id, place)| PlaceDescription {
                id: place.name.clone(),
                marked: net.initial_marking().is_marked(id),
            })
            .collect();
        let transitions = net.transitions.iter().map(|t| t.name.clone()).collect();
        let arcs = net
            .arcs()
            .map(|arc| {
                let place = net.places[arc.place].name.clone();
                let transition = net.transitions[arc.transition].name.clone();
                match arc.direction {
                    ArcDirection::PlaceToTransition => ArcDescription {
                        source: place,
                        target: transition,
                    },
                    ArcDirection::TransitionToPlace => ArcDescription {
                        source: transition,
                        target: place,
                    },
                }
            })
            .collect();
        Self {
            name: net.name.clone(),
            places,
            transitions,
            arcs,
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_json_string(value)?)?;
    Ok(())
}

pub fn write_ron<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    fs::write(path, to_ron_string(value)?)?;
    Ok(())
}

/// Loads a net, choosing the reader from the file extension: `.pnml` and
/// `.xml` are PNML, `.ron` is RON, anything else is JSON.
pub fn load_net<P: AsRef<Path>>(path: P) -> Result<Net, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let fallback_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut description = match extension.as_str() {
        "pnml" | "xml" => pnml::parse_description(&content)?,
        "ron" => from_ron_str::<NetDescription>(&content)?,
        _ => from_json_str::<NetDescription>(&content)?,
    };
    if description.name.is_empty() {
        description.name = fallback_name;
    }
    log::debug!(
        "loaded {:?}: {} places, {} transitions, {} arcs",
        path,
        description.places.len(),
        description.transitions.len(),
        description.arcs.len()
    );
    Ok(description.to_net())
}

#[cfg(feature = "pnml")]
pub mod pnml {
    use roxmltree::{Document, Node};

    use super::{ArcDescription, IoError, NetDescription, PlaceDescription};
    use crate::net::core::Net;

    fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
        node.children()
            .find(|candidate| candidate.is_element() && candidate.tag_name().name() == name)
    }

    fn is_initially_marked(place: Node<'_, '_>) -> bool {
        child(place, "initialMarking")
            .and_then(|marking| child(marking, "text"))
            .and_then(|text| text.text())
            .is_some_and(|text| text.trim() == "1")
    }

    /// Places, transitions and arcs are collected from anywhere in the
    /// document; tags match on their local name so both namespaced and
    /// plain PNML are accepted.
    pub fn parse_description(content: &str) -> Result<NetDescription, IoError> {
        let document = Document::parse(content).map_err(|err| IoError::Pnml(err.to_string()))?;
        let elements = |name: &'static str| {
            document
                .descendants()
                .filter(move |node| node.is_element() && node.tag_name().name() == name)
        };

        let name = elements("net")
            .next()
            .and_then(|net| net.attribute("id"))
            .unwrap_or_default()
            .to_string();

        let places = elements("place")
            .filter_map(|place| {
                place.attribute("id").map(|id| PlaceDescription {
                    id: id.to_string(),
                    marked: is_initially_marked(place),
                })
            })
            .collect();

        let transitions = elements("transition")
            .filter_map(|transition| transition.attribute("id").map(str::to_string))
            .collect();

        let arcs = elements("arc")
            .filter_map(|arc| match (arc.attribute("source"), arc.attribute("target")) {
                (Some(source), Some(target)) => Some(ArcDescription {
                    source: source.to_string(),
                    target: target.to_string(),
                }),
                _ => None,
            })
            .collect();

        Ok(NetDescription {
            name,
            places,
            transitions,
            arcs,
        })
    }

    pub fn import_pnml(content: &str) -> Result<Net, IoError> {
        Ok(parse_description(content)?.to_net())
    }
}

#[cfg(not(feature = "pnml"))]
pub mod pnml {
    use super::{IoError, NetDescription};

    pub fn parse_description(_content: &str) -> Result<NetDescription, IoError> {
        Err(IoError::Pnml(
            "PNML support is disabled; rebuild with the `pnml` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORK_JSON: &str = r#"{
        "name": "fork",
        "places": [{"id": "p0", "marked": true}, {"id": "p1"}, {"id": "p2"}],
        "transitions": ["t0"],
        "arcs": [
            {"source": "p0", "target": "t0"},
            {"source": "t0", "target": "p1"},
            {"source": "t0", "target": "p2"}
        ]
    }"#;

    #[test]
    fn json_description_builds_net() {
        let description: NetDescription = from_json_str(FORK_JSON).unwrap();
        let net = description.to_net();
        assert_eq!(net.name, "fork");
        assert_eq!(net.places_len(), 3);
        assert_eq!(net.initial_marking().to_bits(), vec![1, 0, 0]);
        assert_eq!(NetDescription::from_net(&net).arcs.len(), 3);
    }

    #[test]
    fn ron_text_matches_json_document() {
        let description: NetDescription = from_json_str(FORK_JSON).unwrap();
        let ron_text = to_ron_string(&description).unwrap();
        let parsed: NetDescription = from_ron_str(&ron_text).unwrap();
        assert_eq!(parsed.to_net(), description.to_net());
    }

    #[cfg(feature = "pnml")]
    #[test]
    fn pnml_reads_namespaced_document() {
        let content = r#"<?xml version="1.0"?>
<pnml xmlns="http://www.pnml.org/version-2009/grammar/pnml">
  <net id="demo" type="http://www.pnml.org/version-2009/grammar/ptnet">
    <page id="page0">
      <place id="a"><initialMarking><text> 1 </text></initialMarking></place>
      <place id="b"/>
      <transition id="t"/>
      <arc id="a1" source="a" target="t"/>
      <arc id="a2" source="t" target="b"/>
      <arc id="a3" source="b" target="missing"/>
    </page>
  </net>
</pnml>"#;
        let net = pnml::import_pnml(content).unwrap();
        assert_eq!(net.name, "demo");
        assert_eq!(net.initial_marking().to_bits(), vec![1, 0]);
        assert_eq!(net.arcs().count(), 2);
        assert_eq!(net.diagnostics().len(), 1);
    }

    #[cfg(feature = "pnml")]
    #[test]
    fn malformed_pnml_is_an_error() {
        assert!(matches!(
            pnml::import_pnml("<pnml><net>"),
            Err(IoError::Pnml(_))
        ));
    }
}
