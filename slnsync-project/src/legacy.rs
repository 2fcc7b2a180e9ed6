//! Legacy-style generation: the host's project, with its paths rewritten for
//! a file that lives next to the assembly definition.

use std::path::Path;

use slnsync_core::paths::{relative_to, resolve};

use crate::document::ProjectDocument;
use crate::error::ProjectError;
use crate::transform::{
    absolutize_hint_paths, path_string, property, rewrite_project_reference, solution_path,
    sub_project_directories, ReferenceResolver,
};
use crate::xml::{Document, Element};

pub(crate) fn transform(
    model: ProjectDocument,
    output_directory: &Path,
    solution_directory: &Path,
    resolver: &mut ReferenceResolver,
) -> Result<Document, ProjectError> {
    let name = model.name().to_owned();
    let project_directory = model.directory().to_path_buf();
    let mut document = model.into_document();
    let root = &mut document.root;

    let output_path = solution_path(solution_directory, &["Temp", "Bin", "$(Configuration)"], &name);
    root.for_each_descendant_mut("OutputPath", &mut |e: &mut Element| {
        e.set_text(output_path.clone());
    });

    absolutize_hint_paths(root, &project_directory);

    // Sources are picked up by wildcard from the new location; nested
    // sub-projects compile on their own.
    root.remove_descendants(&mut |e: &Element| e.is("Compile"));
    let mut sources =
        Element::new("ItemGroup").with_child(Element::new("Compile").with_attribute("Include", "**/*.cs"));
    for dir in sub_project_directories(output_directory) {
        sources.push(
            Element::new("Compile").with_attribute("Remove", format!("{}/**/*.cs", dir.display())),
        );
    }
    match root.position_of("ItemGroup") {
        Some(index) => root.insert(index, sources),
        None => root.push(sources),
    }

    root.for_each_descendant_mut("None", &mut |item: &mut Element| {
        let Some(include) = item.attribute("Include") else {
            return;
        };
        let absolute = resolve(&project_directory, include);
        item.set_attribute("Include", path_string(&relative_to(output_directory, &absolute)));
        item.remove_children("Link");
    });

    root.for_each_descendant_mut("ProjectReference", &mut |reference: &mut Element| {
        rewrite_project_reference(reference, &project_directory, output_directory, resolver);
    });

    root.insert(
        0,
        Element::new("PropertyGroup")
            .with_child(property(
                "BaseIntermediateOutputPath",
                solution_path(solution_directory, &["obj", "Legacy"], &name),
            ))
            .with_child(property("EnableNETAnalyzers", "true"))
            .with_child(property("AnalysisLevel", "latest"))
            .with_child(property("AnalysisMode", "AllEnabledByDefault")),
    );

    tracing::debug!(project = %name, "rewrote legacy project");
    Ok(document)
}
