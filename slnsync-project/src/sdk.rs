//! SDK-style generation: a fresh, namespace-free project that keeps only the
//! host's properties, assembly references and project references.

use std::path::Path;

use slnsync_core::paths::relative_to;
use slnsync_core::Settings;

use crate::document::ProjectDocument;
use crate::error::ProjectError;
use crate::transform::{
    absolutize_hint_paths, path_string, property, rewrite_project_reference, solution_path,
    sub_project_directories, ReferenceResolver,
};
use crate::xml::{Document, Element};

/// Framework moniker written in place of `TargetFrameworkVersion`.
pub const TARGET_FRAMEWORK: &str = "netstandard2.1";

const DROPPED_PROPERTIES: [&str; 3] = ["OutputPath", "ProductVersion", "SchemaVersion"];

pub(crate) fn transform(
    model: ProjectDocument,
    output_directory: &Path,
    solution_directory: &Path,
    settings: &Settings,
    resolver: &mut ReferenceResolver,
) -> Result<Document, ProjectError> {
    let name = model.name().to_owned();
    let project_directory = model.directory().to_path_buf();
    let assembly_definition = model.assembly_definition_path()?.to_path_buf();
    let source = model.into_document().root.without_namespace();

    let mut root = Element::new("Project");

    root.push(
        Element::new("PropertyGroup")
            .with_child(property(
                "OutputPath",
                solution_path(solution_directory, &["Temp", "Bin", "$(Configuration)"], &name),
            ))
            .with_child(property(
                "BaseIntermediateOutputPath",
                solution_path(solution_directory, &["Temp", "Obj"], &name),
            ))
            .with_child(property("IsUnityProject", "true")),
    );

    root.push(build_properties(settings, output_directory));

    for group in source.children_named("PropertyGroup") {
        root.push(copy_property_group(group));
    }

    root.push(sdk_import("Sdk.props"));

    // The marker stays in the project so the next run can find it again.
    root.push(
        Element::new("ItemGroup").with_child(Element::new("None").with_attribute(
            "Include",
            path_string(&relative_to(output_directory, &assembly_definition)),
        )),
    );

    for group in source.children_named("ItemGroup") {
        let items: Vec<Element> = group
            .children_named("Analyzer")
            .chain(group.children_named("Reference"))
            .cloned()
            .collect();
        if items.is_empty() {
            continue;
        }
        let mut copy = Element::new("ItemGroup");
        for mut item in items {
            absolutize_hint_paths(&mut item, &project_directory);
            copy.push(item);
        }
        root.push(copy);
    }

    let mut references = Element::new("ItemGroup");
    for reference in source.descendants("ProjectReference") {
        if reference.attribute("Include").is_none() {
            continue;
        }
        let mut reference = reference.clone();
        rewrite_project_reference(&mut reference, &project_directory, output_directory, resolver);
        references.push(reference);
    }
    root.push(references);

    root.push(sdk_import("Sdk.targets"));

    tracing::debug!(project = %name, "built sdk-style project");
    Ok(Document::new(root))
}

/// Second property group: item exclusion, framework switches and the
/// user-configured extra properties.
fn build_properties(settings: &Settings, output_directory: &Path) -> Element {
    let excludes: Vec<String> = settings
        .sdk_excluded_file_patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .chain(
            sub_project_directories(output_directory)
                .into_iter()
                .map(|dir| format!("{}/**", dir.display())),
        )
        .collect();

    let mut group = Element::new("PropertyGroup")
        .with_child(property(
            "DefaultItemExcludes",
            format!("$(DefaultItemExcludes);{}", excludes.join(";")),
        ))
        .with_child(property("ImplicitUsings", "disable"))
        // The host references every framework assembly explicitly.
        .with_child(property("DisableImplicitFrameworkReferences", "true"))
        .with_child(property("NoConfig", "true"))
        .with_child(property("NoStdLib", "true"))
        .with_child(property("NoStandardLibraries", "true"));

    for extra in &settings.sdk_additional_properties {
        let name = extra.name.trim();
        if name.is_empty() {
            continue;
        }
        group.push(property(name, extra.value.trim()));
    }
    group
}

fn copy_property_group(group: &Element) -> Element {
    let mut copy = group.clone();
    for dropped in DROPPED_PROPERTIES {
        copy.remove_children(dropped);
    }
    if let Some(index) = copy.position_of("TargetFrameworkVersion") {
        copy.children.remove(index);
        copy.insert(index, property("TargetFramework", TARGET_FRAMEWORK));
    }
    copy
}

fn sdk_import(project: &str) -> Element {
    Element::new("Import")
        .with_attribute("Project", project)
        .with_attribute("Sdk", "Microsoft.NET.Sdk")
}
