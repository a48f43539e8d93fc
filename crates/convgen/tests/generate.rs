//! End-to-end generation over Go module trees on disk.

use convgen::run::{Mode, PackageFailure, RunError, run};
use convgen::{EmitError, RunConfig};
use convgen_model::DiagnosticKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const OUTPUT: &str = "zz_generated.conversion.go";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

const WIDGET: &str = "type Widget struct {\n\tName  string\n\tCount int\n}\n";

/// `example.com/api` with `internal` and `v1` packages holding a Widget.
fn widget_module() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "go.mod", "module example.com/api\n\ngo 1.22\n");
    write(tmp.path(), "internal/types.go", &format!("package internal\n\n{WIDGET}"));
    write(tmp.path(), "v1/types.go", &format!("package v1\n\n{WIDGET}"));
    tmp
}

fn config(root: &Path, dirs: &[&str]) -> RunConfig {
    RunConfig {
        dirs: dirs.iter().map(|d| root.join(d)).collect(),
        internal_links: BTreeMap::from([(
            "example.com/api/v1".to_string(),
            "example.com/api/internal".to_string(),
        )]),
        ..RunConfig::default()
    }
}

fn output_path(root: &Path, package_dir: &str) -> PathBuf {
    root.canonicalize().unwrap().join(package_dir).join(OUTPUT)
}

#[test]
fn widget_pair_generates_both_directions() {
    let tmp = widget_module();
    let summary = run(&config(tmp.path(), &["v1", "internal"]), Mode::DryRun).unwrap();

    assert!(summary.is_success());
    assert!(summary.diagnostics.is_empty(), "{:?}", summary.diagnostics);
    assert!(summary.written.is_empty());
    assert_eq!(summary.artifacts.len(), 1);
    let artifact = &summary.artifacts[0];
    assert_eq!(artifact.package, "example.com/api/v1");
    assert_eq!(artifact.path, output_path(tmp.path(), "v1"));
    assert!(!artifact.path.exists());
    assert_eq!(artifact.content.matches("s.AddGeneratedConversionFunc(").count(), 2);

    insta::assert_snapshot!(artifact.content, @r#"
// Code generated by convgen. DO NOT EDIT.

package v1

import (
	"example.com/api/internal"
	runtime "sysadm/apimachinery/runtime/v1beta1"
)

var ConversionRegistry runtime.FuncRegistry = RegisterConversions

// RegisterConversions adds conversion functions to the given scheme.
// Public to allow building arbitrary schemes.
func RegisterConversions(s *runtime.Scheme) error {
	if err := s.AddGeneratedConversionFunc((*Widget)(nil), (*internal.Widget)(nil), func(a, b interface{}) error {
		return Convert_v1_Widget_To_internal_Widget(a.(*Widget), b.(*internal.Widget))
	}); err != nil {
		return err
	}
	if err := s.AddGeneratedConversionFunc((*internal.Widget)(nil), (*Widget)(nil), func(a, b interface{}) error {
		return Convert_internal_Widget_To_v1_Widget(a.(*internal.Widget), b.(*Widget))
	}); err != nil {
		return err
	}
	return nil
}

// Convert_v1_Widget_To_internal_Widget is an autogenerated conversion function.
func Convert_v1_Widget_To_internal_Widget(in *Widget, out *internal.Widget) error {
	out.Name = in.Name
	out.Count = in.Count
	return nil
}

// Convert_internal_Widget_To_v1_Widget is an autogenerated conversion function.
func Convert_internal_Widget_To_v1_Widget(in *internal.Widget, out *Widget) error {
	out.Name = in.Name
	out.Count = in.Count
	return nil
}
"#);
}

#[test]
fn hand_written_conversion_is_registered_not_generated() {
    let tmp = widget_module();
    write(
        tmp.path(),
        "v1/conversion.go",
        r#"package v1

import "example.com/api/internal"

func Convert_v1_Widget_To_internal_Widget(in *Widget, out *internal.Widget) error {
	out.Name = in.Name
	return nil
}
"#,
    );
    let summary = run(&config(tmp.path(), &["v1", "internal"]), Mode::DryRun).unwrap();
    let content = &summary.artifacts[0].content;

    assert!(content.contains(
        "\tif err := s.AddConversionFunc((*Widget)(nil), (*internal.Widget)(nil), func(a, b interface{}) error {\n"
    ));
    assert!(content.contains(
        "\tif err := s.AddGeneratedConversionFunc((*internal.Widget)(nil), (*Widget)(nil), func(a, b interface{}) error {\n"
    ));
    assert!(!content.contains("func Convert_v1_Widget_To_internal_Widget("));
    assert!(content.contains("func Convert_internal_Widget_To_v1_Widget("));
}

#[test]
fn second_run_is_byte_identical() {
    let tmp = widget_module();
    write(tmp.path(), "boilerplate.go.txt", "/*\nCopyright 2024 The Widget Authors.\n*/\n");
    let mut config = config(tmp.path(), &["v1", "internal"]);
    config.header_file = Some(tmp.path().join("boilerplate.go.txt"));

    let first = run(&config, Mode::Write).unwrap();
    assert_eq!(first.written, [output_path(tmp.path(), "v1")]);
    let on_disk = std::fs::read_to_string(output_path(tmp.path(), "v1")).unwrap();
    assert!(on_disk.starts_with("/*\nCopyright 2024 The Widget Authors.\n*/\n\n// Code generated by convgen. DO NOT EDIT.\n"));

    // The generated file is in the package now; it must not be read back as
    // hand-written conversions.
    let second = run(&config, Mode::Write).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.artifacts[0].content, first.artifacts[0].content);
    assert_eq!(
        std::fs::read_to_string(output_path(tmp.path(), "v1")).unwrap(),
        on_disk
    );
}

#[test]
fn nested_fields_use_planned_conversions() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "go.mod", "module example.com/api\n");
    write(
        tmp.path(),
        "internal/types.go",
        r#"package internal

type Phase string

type Spec struct {
	Size int
}

type Widget struct {
	Spec   Spec
	Parent *Spec
	Items  []Spec
	ByName map[string]Spec
	Phase  Phase
	Labels map[string]string
	Legacy int
}
"#,
    );
    write(
        tmp.path(),
        "v1/types.go",
        r#"package v1

type Phase string

type Spec struct {
	Size int
}

type Widget struct {
	Spec   Spec
	Parent *Spec
	Items  []Spec
	ByName map[string]Spec
	Phase  Phase
	Labels map[string]string
	Extra  string
	Legacy string
}
"#,
    );
    let summary = run(&config(tmp.path(), &["v1", "internal"]), Mode::DryRun).unwrap();
    let content = &summary.artifacts[0].content;

    for expected in [
        "\tif err := Convert_v1_Spec_To_internal_Spec(&in.Spec, &out.Spec); err != nil {\n",
        "\t\t*out = new(internal.Spec)\n",
        "\t\tif err := Convert_v1_Spec_To_internal_Spec(*in, *out); err != nil {\n",
        "\t\t*out = make([]internal.Spec, len(*in))\n",
        "\t\t\tif err := Convert_v1_Spec_To_internal_Spec(&(*in)[i], &(*out)[i]); err != nil {\n",
        "\t\t*out = make(map[string]internal.Spec, len(*in))\n",
        "\tout.Phase = internal.Phase(in.Phase)\n",
        "\tout.Labels = in.Labels\n",
        "\t// WARNING: in.Extra does not exist in peer type\n",
        "\t// WARNING: in.Legacy requires manual conversion\n",
        "\tout.Phase = Phase(in.Phase)\n",
        "\t*out = make([]Spec, len(*in))\n",
    ] {
        assert!(content.contains(expected), "missing {expected:?} in\n{content}");
    }
    // Phase is a named string, not a struct: no conversion pair for it.
    assert!(!content.contains("Convert_v1_Phase_To_internal_Phase"));

    let unmatched: Vec<&str> = summary
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnmatchedField)
        .map(|d| d.subject.as_str())
        .collect();
    assert_eq!(
        unmatched,
        [
            "example.com/api/v1.Widget.Extra",
            "example.com/api/v1.Widget.Legacy",
            "example.com/api/internal.Widget.Legacy",
        ]
    );
}

#[test]
fn version_packages_link_to_their_parent() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "go.mod", "module example.com/widgets\n");
    write(tmp.path(), "types.go", &format!("package widgets\n\n{WIDGET}"));
    write(tmp.path(), "v1beta1/types.go", &format!("package v1beta1\n\n{WIDGET}"));
    let config = RunConfig {
        dirs: vec![tmp.path().join("v1beta1")],
        ..RunConfig::default()
    };

    let summary = run(&config, Mode::DryRun).unwrap();
    let content = &summary.artifacts[0].content;
    assert!(content.contains("\t\"example.com/widgets\"\n"));
    assert!(content.contains("func Convert_v1beta1_Widget_To_widgets_Widget(in *Widget, out *widgets.Widget) error {\n"));
    assert!(content.contains("func Convert_widgets_Widget_To_v1beta1_Widget(in *widgets.Widget, out *Widget) error {\n"));
}

#[test]
fn package_without_struct_pairs_produces_no_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "go.mod", "module example.com/api\n");
    write(tmp.path(), "types.go", &format!("package api\n\n{WIDGET}"));
    write(
        tmp.path(),
        "v1/types.go",
        "package v1\n\ntype Phase string\n\nconst Running Phase = \"Running\"\n",
    );
    let config = RunConfig {
        dirs: vec![tmp.path().join("v1")],
        ..RunConfig::default()
    };

    let summary = run(&config, Mode::Write).unwrap();
    assert!(summary.is_success());
    assert!(summary.artifacts.is_empty());
    assert!(summary.written.is_empty());
    assert!(!output_path(tmp.path(), "v1").exists());
}

#[test]
fn write_failures_are_isolated() {
    let tmp = widget_module();
    write(tmp.path(), "v2/types.go", &format!("package v2\n\n{WIDGET}"));
    // v2 links to the internal package too; v1's output path is blocked by a
    // directory.
    let mut config = config(tmp.path(), &["v1", "v2", "internal"]);
    config
        .internal_links
        .insert("example.com/api/v2".into(), "example.com/api/internal".into());
    std::fs::create_dir_all(tmp.path().join("v1").join(OUTPUT)).unwrap();

    let summary = run(&config, Mode::Write).unwrap();
    assert!(!summary.is_success());
    assert!(matches!(
        summary.failures.as_slice(),
        [PackageFailure { package, error: EmitError::Write { .. } }] if package == "example.com/api/v1"
    ));
    assert_eq!(summary.written, [output_path(tmp.path(), "v2")]);
    assert!(output_path(tmp.path(), "v2").is_file());
}

#[test]
fn missing_counterpart_is_reported() {
    let tmp = widget_module();
    write(
        tmp.path(),
        "v1/gadget.go",
        "package v1\n\ntype Gadget struct {\n\tID string\n}\n",
    );
    let summary = run(&config(tmp.path(), &["v1", "internal"]), Mode::DryRun).unwrap();

    let missing: Vec<&str> = summary
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MissingCounterpart)
        .map(|d| d.subject.as_str())
        .collect();
    assert_eq!(missing, ["example.com/api/v1.Gadget"]);
    assert!(!summary.artifacts[0].content.contains("Gadget"));
}

#[test]
fn strict_mode_fails_on_diagnostics() {
    let tmp = widget_module();
    write(
        tmp.path(),
        "v1/gadget.go",
        "package v1\n\ntype Gadget struct {\n\tID string\n}\n",
    );
    let mut config = config(tmp.path(), &["v1", "internal"]);
    config.strict = true;

    let err = run(&config, Mode::Write).unwrap_err();
    assert!(matches!(err, RunError::Strict(1)));
    assert!(!output_path(tmp.path(), "v1").exists());
}

#[test]
fn load_errors_abort_the_run() {
    let tmp = widget_module();
    write(tmp.path(), "v1/broken.go", "package v1\n\nfunc Broken( {\n");
    let err = run(&config(tmp.path(), &["v1", "internal"]), Mode::Write).unwrap_err();
    assert!(matches!(err, RunError::Load(convgen_loader::LoadError::Syntax { .. })));
    assert!(!output_path(tmp.path(), "v1").exists());
}
