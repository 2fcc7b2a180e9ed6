//! Both generation strategies against a small host-generated project layout.
//!
//! Each test builds its own `TempDir` fixture; no shared state.

use std::fs;
use std::path::Path;

use rstest::rstest;
use slnsync_core::{PropertySetting, Settings};
use slnsync_project::{generate_project, ProjectDocument, ProjectStyle, ReferenceResolver};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

const GAME_PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="4.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <LangVersion>9.0</LangVersion>
    <ProductVersion>10.0.20506</ProductVersion>
    <SchemaVersion>2.0</SchemaVersion>
    <TargetFrameworkVersion>v4.7.1</TargetFrameworkVersion>
    <RootNamespace></RootNamespace>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ">
    <OutputPath>Temp\bin\Debug\</OutputPath>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Assets\Game\Player.cs" />
    <Compile Include="Assets\Game\Enemy.cs" />
    <None Include="Assets\Game\Game.asmdef" />
    <None Include="Assets\Game\readme.txt">
      <Link>readme.txt</Link>
    </None>
  </ItemGroup>
  <ItemGroup>
    <Analyzer Include="/Applications/Unity/Unity.SourceGenerators.dll" />
    <Analyzer Include="/Analyzers/Custom.Analyzers.dll" />
    <Reference Include="UnityEngine">
      <HintPath>Library\ScriptAssemblies\UnityEngine.dll</HintPath>
    </Reference>
  </ItemGroup>
  <ItemGroup>
    <ProjectReference Include="Core.csproj">
      <Project>{BBB}</Project>
      <Name>Core</Name>
    </ProjectReference>
    <ProjectReference Include="Unity.Package.csproj">
      <Project>{CCC}</Project>
      <Name>Unity.Package</Name>
    </ProjectReference>
  </ItemGroup>
</Project>
"#;

const CORE_PROJECT: &str = r#"<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <None Include="Assets\Core\Core.asmdef" />
  </ItemGroup>
</Project>
"#;

const PACKAGE_PROJECT: &str = r#"<Project xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup>
    <None Include="Library\PackageCache\com.unity.x@1.0.0\Runtime\Unity.Package.asmdef" />
  </ItemGroup>
</Project>
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(root, "Game.csproj", GAME_PROJECT);
    write(root, "Core.csproj", CORE_PROJECT);
    write(root, "Unity.Package.csproj", PACKAGE_PROJECT);
    write(root, "Assets/Game/Game.asmdef", r#"{ "name": "Game" }"#);
    write(root, "Assets/Game/Player.cs", "class Player {}\n");
    write(root, "Assets/Game/Editor/Game.Editor.asmdef", r#"{ "name": "Game.Editor" }"#);
    write(root, "Assets/Core/Core.asmdef", r#"{ "name": "Core" }"#);
    dir
}

fn generate(root: &Path, style: ProjectStyle, settings: &Settings) -> (std::path::PathBuf, String) {
    let model = ProjectDocument::load(&root.join("Game.csproj")).expect("load");
    let mut resolver = ReferenceResolver::new();
    let generated = generate_project(style, model, settings, &mut resolver).expect("generate");
    (generated.output_path, generated.content)
}

// ---------------------------------------------------------------------------
// Shared behaviour
// ---------------------------------------------------------------------------

#[rstest]
#[case(ProjectStyle::Legacy)]
#[case(ProjectStyle::Sdk)]
fn output_lands_next_to_assembly_definition(#[case] style: ProjectStyle) {
    let dir = fixture();
    let (output, _) = generate(dir.path(), style, &Settings::default());
    assert_eq!(output, dir.path().join("Assets").join("Game").join("Game.csproj"));
}

#[rstest]
#[case(ProjectStyle::Legacy)]
#[case(ProjectStyle::Sdk)]
fn excluded_analyzers_are_dropped(#[case] style: ProjectStyle) {
    let dir = fixture();
    let (_, content) = generate(dir.path(), style, &Settings::default());
    assert!(!content.contains("Unity.SourceGenerators.dll"));
    assert!(content.contains("Custom.Analyzers.dll"));
}

#[rstest]
#[case(ProjectStyle::Legacy)]
#[case(ProjectStyle::Sdk)]
fn hint_paths_become_absolute(#[case] style: ProjectStyle) {
    let dir = fixture();
    let (_, content) = generate(dir.path(), style, &Settings::default());
    let expected = dir
        .path()
        .join("Library")
        .join("ScriptAssemblies")
        .join("UnityEngine.dll");
    assert!(
        content.contains(&format!("<HintPath>{}</HintPath>", expected.display())),
        "{content}"
    );
}

#[rstest]
#[case(ProjectStyle::Legacy)]
#[case(ProjectStyle::Sdk)]
#[cfg(unix)]
fn project_references_point_at_generated_or_package_projects(#[case] style: ProjectStyle) {
    let dir = fixture();
    let (_, content) = generate(dir.path(), style, &Settings::default());
    assert!(content.contains("<ProjectReference Include=\"../Core/Core.csproj\">"), "{content}");
    assert!(
        content.contains("<ProjectReference Include=\"../../Unity.Package.csproj\">"),
        "{content}"
    );
}

#[test]
fn generation_is_deterministic() {
    let dir = fixture();
    let first = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    let second = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    assert_eq!(first, second);
}

#[test]
fn missing_marker_fails_the_project() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Broken.csproj", "<Project><ItemGroup /></Project>");
    let model = ProjectDocument::load(&dir.path().join("Broken.csproj")).unwrap();
    let err = generate_project(
        ProjectStyle::Sdk,
        model,
        &Settings::default(),
        &mut ReferenceResolver::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("exactly one .asmdef"), "{err}");
}

// ---------------------------------------------------------------------------
// Legacy
// ---------------------------------------------------------------------------

#[test]
#[cfg(unix)]
fn legacy_rewrites_items_in_place() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Legacy, &Settings::default());

    assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
    assert!(content.contains("xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\""));
    assert!(!content.contains("Player.cs"));
    assert!(content.contains("<Compile Include=\"**/*.cs\"/>"));
    assert!(content.contains("<Compile Remove=\"Editor/**/*.cs\"/>"));
    assert!(content.contains("<None Include=\"Game.asmdef\"/>"));
    assert!(content.contains("<None Include=\"readme.txt\"/>"));
    assert!(!content.contains("<Link>"));

    let output = format!(
        "<OutputPath>{}/Temp/Bin/$(Configuration)/Game</OutputPath>",
        dir.path().display()
    );
    assert!(content.contains(&output), "{content}");
    // The host's properties survive untouched.
    assert!(content.contains("<ProductVersion>10.0.20506</ProductVersion>"));
}

#[test]
fn legacy_prepends_analysis_properties() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Legacy, &Settings::default());
    let first_group = content.find("<PropertyGroup>").unwrap();
    let base = content.find("<BaseIntermediateOutputPath>").unwrap();
    let lang = content.find("<LangVersion>").unwrap();
    assert!(first_group < base && base < lang);
    assert!(content.contains("<AnalysisMode>AllEnabledByDefault</AnalysisMode>"));
}

// ---------------------------------------------------------------------------
// SDK
// ---------------------------------------------------------------------------

#[test]
fn sdk_project_has_no_namespace_or_declaration() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    assert!(content.starts_with("<Project>\n"), "{content}");
    assert!(!content.contains("xmlns"));
    assert!(!content.contains("<?xml"));
}

#[test]
fn sdk_copies_properties_with_framework_swapped() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    assert!(content.contains("<TargetFramework>netstandard2.1</TargetFramework>"));
    assert!(!content.contains("TargetFrameworkVersion"));
    assert!(!content.contains("ProductVersion"));
    assert!(!content.contains("SchemaVersion"));
    assert!(!content.contains(r"Temp\bin\Debug"));
    assert!(content.contains("<LangVersion>9.0</LangVersion>"));
    assert!(content.contains("<IsUnityProject>true</IsUnityProject>"));
}

#[test]
#[cfg(unix)]
fn sdk_excludes_patterns_and_sub_projects() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    assert!(content.contains(
        "<DefaultItemExcludes>$(DefaultItemExcludes);**/*.meta;**/*.asset;**/*.prefab;Editor/**</DefaultItemExcludes>"
    ));
    assert!(content.contains("<None Include=\"Game.asmdef\"/>"));
}

#[test]
fn sdk_appends_configured_properties() {
    let dir = fixture();
    let mut settings = Settings::default();
    settings.sdk_additional_properties = vec![
        PropertySetting::new("  Nullable ", " enable "),
        PropertySetting::new("   ", "ignored"),
    ];
    let (_, content) = generate(dir.path(), ProjectStyle::Sdk, &settings);
    assert!(content.contains("<Nullable>enable</Nullable>"));
    assert!(!content.contains("ignored"));
    assert!(!content.contains("EnableNETAnalyzers"));
}

#[test]
fn sdk_imports_wrap_the_items() {
    let dir = fixture();
    let (_, content) = generate(dir.path(), ProjectStyle::Sdk, &Settings::default());
    let props = content.find("<Import Project=\"Sdk.props\" Sdk=\"Microsoft.NET.Sdk\"/>").unwrap();
    let reference = content.find("<Reference Include=\"UnityEngine\">").unwrap();
    let targets = content.find("<Import Project=\"Sdk.targets\" Sdk=\"Microsoft.NET.Sdk\"/>").unwrap();
    assert!(props < reference && reference < targets);
    assert!(content.ends_with("<Import Project=\"Sdk.targets\" Sdk=\"Microsoft.NET.Sdk\"/>\n</Project>\n"));
}
