//! Maven build descriptor parser

use super::ArtifactParser;
use crate::error::{Result as SnapResult, SnapshotError};
use roxmltree::{Document, Node};
use serde::Serialize;
use std::path::{Path, PathBuf};

const POM_FILE_NAME: &str = "pom.xml";
const DEFAULT_PACKAGING: &str = "jar";

/// Project coordinates, with group and version inherited from the parent
/// when the project omits them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomCoordinates {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentInfo {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    #[serde(rename = "type")]
    pub dependency_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginConfiguration {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub configuration: Vec<PluginConfiguration>,
}

/// Summary of one `pom.xml`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomStructure {
    #[serde(flatten)]
    pub coordinates: PomCoordinates,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: Option<ParentInfo>,
    pub properties: Vec<Property>,
    pub dependencies: Vec<Dependency>,
    pub plugins: Vec<Plugin>,
    pub modules: Vec<String>,
}

/// Direct child elements of `node` with local name `name`
fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'a str) -> Option<Node<'a, 'input>> {
    children_named(node, name).next()
}

/// Trimmed text of a direct child, `None` when missing or blank
fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .map(text_content)
        .filter(|text| !text.is_empty())
}

/// Text of an element and all its descendants, whitespace-separated
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Items found at `container/item`, e.g. `dependencies/dependency`
fn nested<'a, 'input>(
    node: Node<'a, 'input>,
    container: &'a str,
    item: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    children_named(node, container).flat_map(move |list| children_named(list, item))
}

/// Child elements of every `container` under `node`, as name and text pairs
fn named_values<'a, 'input>(
    node: Node<'a, 'input>,
    container: &'a str,
) -> impl Iterator<Item = (String, String)> {
    children_named(node, container)
        .flat_map(|list| list.children().filter(Node::is_element))
        .map(|item| (item.tag_name().name().to_string(), text_content(item)))
}

/// Parser for Maven `pom.xml` descriptors
pub struct PomParser;

impl PomParser {
    fn structure(project: Node) -> PomStructure {
        let parent = child(project, "parent").map(|parent| ParentInfo {
            group_id: child_text(parent, "groupId"),
            artifact_id: child_text(parent, "artifactId"),
            version: child_text(parent, "version"),
            relative_path: child_text(parent, "relativePath"),
        });

        let coordinates = PomCoordinates {
            group_id: child_text(project, "groupId")
                .or_else(|| parent.as_ref().and_then(|p| p.group_id.clone())),
            artifact_id: child_text(project, "artifactId"),
            version: child_text(project, "version")
                .or_else(|| parent.as_ref().and_then(|p| p.version.clone())),
            packaging: child_text(project, "packaging")
                .unwrap_or_else(|| DEFAULT_PACKAGING.to_string()),
        };

        let properties = named_values(project, "properties")
            .map(|(name, value)| Property { name, value })
            .collect();

        let dependencies = nested(project, "dependencies", "dependency")
            .map(|dependency| Dependency {
                group_id: child_text(dependency, "groupId"),
                artifact_id: child_text(dependency, "artifactId"),
                version: child_text(dependency, "version"),
                scope: child_text(dependency, "scope"),
                dependency_type: child_text(dependency, "type"),
            })
            .collect();

        let plugins = children_named(project, "build")
            .flat_map(|build| nested(build, "plugins", "plugin"))
            .map(|plugin| Plugin {
                group_id: child_text(plugin, "groupId"),
                artifact_id: child_text(plugin, "artifactId"),
                version: child_text(plugin, "version"),
                configuration: named_values(plugin, "configuration")
                    .map(|(name, value)| PluginConfiguration { name, value })
                    .collect(),
            })
            .collect();

        let modules = nested(project, "modules", "module")
            .map(text_content)
            .filter(|module| !module.is_empty())
            .collect();

        PomStructure {
            coordinates,
            name: child_text(project, "name"),
            description: child_text(project, "description"),
            parent,
            properties,
            dependencies,
            plugins,
            modules,
        }
    }
}

impl ArtifactParser for PomParser {
    type Output = PomStructure;

    const KIND: &'static str = "pom";

    fn matches(path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == POM_FILE_NAME)
    }

    fn parse(file_name: &str, content: &str) -> SnapResult<PomStructure> {
        let invalid = |reason: String| SnapshotError::InvalidArtifact {
            path: PathBuf::from(file_name),
            reason,
        };

        let document = Document::parse(content).map_err(|e| invalid(e.to_string()))?;
        let root = document.root_element();
        if root.tag_name().name() != "project" {
            return Err(invalid(format!(
                "root element is <{}>, expected <project>",
                root.tag_name().name()
            )));
        }
        Ok(Self::structure(root))
    }
}
