//! Go conversion functions and their scheme registration.
//!
//! Output layout:
//! ```text
//! <header>
//! // Code generated by convgen. DO NOT EDIT.
//! package v1
//! import (...)
//! var ConversionRegistry runtime.FuncRegistry = RegisterConversions
//! func RegisterConversions(s *runtime.Scheme) error { ... }
//! func Convert_v1_Widget_To_api_Widget(in *Widget, out *api.Widget) error { ... }
//! ```

use super::{EmitError, EmitOptions, Generator};
use crate::config::GenerationKind;
use crate::plan::{Conversion, FieldPlan, FieldStep, PackagePlan, Registration};
use convgen_loader::GENERATED_MARKER;
use convgen_model::name::assumed_package_name;
use convgen_model::{Shape, TypeId, Universe};
use std::collections::BTreeMap;

const RUNTIME_ALIAS: &str = "runtime";

pub struct ConversionGenerator;

impl Generator for ConversionGenerator {
    fn name(&self) -> &'static str {
        "conversion"
    }

    fn kind(&self) -> GenerationKind {
        GenerationKind::Conversion
    }

    fn generate(
        &self,
        universe: &Universe,
        plan: &PackagePlan,
        options: &EmitOptions,
    ) -> Result<String, EmitError> {
        let mut imports = Imports::default();
        imports.insert(&options.runtime_package, RUNTIME_ALIAS);
        let mut file = GoFile {
            universe,
            package: &plan.path,
            imports,
        };
        file.qualifier(&plan.internal_path);

        let mut registrations = String::new();
        for conversion in plan.conversions() {
            file.registration(&mut registrations, conversion)?;
        }
        let mut functions = String::new();
        for conversion in plan
            .conversions()
            .filter(|c| c.registration == Registration::Generated)
        {
            functions.push('\n');
            file.function(&mut functions, conversion)?;
        }

        let mut out = String::new();
        let header = options.header.trim_end();
        if !header.is_empty() {
            out.push_str(header);
            out.push_str("\n\n");
        }
        out.push_str(GENERATED_MARKER);
        out.push_str("\n\n");
        out.push_str(&format!("package {}\n\n", plan.name));
        out.push_str(&file.imports.render());
        out.push('\n');
        out.push_str(&format!(
            "var ConversionRegistry {RUNTIME_ALIAS}.FuncRegistry = RegisterConversions\n\n"
        ));
        out.push_str("// RegisterConversions adds conversion functions to the given scheme.\n");
        out.push_str("// Public to allow building arbitrary schemes.\n");
        out.push_str(&format!(
            "func RegisterConversions(s *{RUNTIME_ALIAS}.Scheme) error {{\n"
        ));
        out.push_str(&registrations);
        out.push_str("\treturn nil\n}\n");
        out.push_str(&functions);

        tracing::debug!(
            package = %plan.path,
            conversions = plan.pairs.len() * 2,
            bytes = out.len(),
            "rendered conversions"
        );
        Ok(out)
    }
}

/// Import path → local alias, ordered by path.
#[derive(Default)]
struct Imports {
    by_path: BTreeMap<String, String>,
}

impl Imports {
    fn insert(&mut self, path: &str, alias: &str) {
        self.by_path.insert(path.to_string(), alias.to_string());
    }

    fn alias(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    fn is_taken(&self, alias: &str) -> bool {
        self.by_path.values().any(|a| a == alias)
    }

    fn render(&self) -> String {
        let mut out = String::from("import (\n");
        for (path, alias) in &self.by_path {
            if alias == assumed_package_name(path) {
                out.push_str(&format!("\t\"{path}\"\n"));
            } else {
                out.push_str(&format!("\t{alias} \"{path}\"\n"));
            }
        }
        out.push_str(")\n");
        out
    }
}

struct GoFile<'a> {
    universe: &'a Universe,
    /// Import path of the package the file belongs to.
    package: &'a str,
    imports: Imports,
}

impl GoFile<'_> {
    /// Local name for `path`, importing it on first use.
    fn qualifier(&mut self, path: &str) -> String {
        if let Some(alias) = self.imports.alias(path) {
            return alias.to_string();
        }
        let base = self
            .universe
            .find_package(path)
            .map(|p| p.local_name())
            .unwrap_or_else(|| assumed_package_name(path));
        let mut alias = base.to_string();
        let mut n = 1;
        while self.imports.is_taken(&alias) {
            alias = format!("{base}{n}");
            n += 1;
        }
        self.imports.insert(path, &alias);
        alias
    }

    /// Go spelling of `id` as seen from this file.
    fn spell(&mut self, id: TypeId) -> Result<String, EmitError> {
        let universe = self.universe;
        let ty = universe.get(id);
        match ty.shape() {
            Some(Shape::Pointer { elem }) => Ok(format!("*{}", self.spell(*elem)?)),
            Some(Shape::Slice { elem }) => Ok(format!("[]{}", self.spell(*elem)?)),
            Some(Shape::Array {
                elem,
                len: Some(len),
            }) => Ok(format!("[{len}]{}", self.spell(*elem)?)),
            Some(Shape::Map { key, elem }) => {
                let key = self.spell(*key)?;
                Ok(format!("map[{key}]{}", self.spell(*elem)?))
            }
            _ if ty.name.package == self.package => Ok(ty.name.name.clone()),
            _ if !ty.name.package.is_empty() => {
                let qualifier = self.qualifier(&ty.name.package);
                Ok(format!("{qualifier}.{}", ty.name.name))
            }
            // primitives; other anonymous shapes are spelled with import
            // paths and are not valid Go
            _ if !ty.name.is_anonymous() => Ok(ty.name.name.clone()),
            _ => Err(EmitError::Unrenderable {
                package: self.package.to_string(),
                name: ty.name.to_string(),
            }),
        }
    }

    fn registration(&mut self, out: &mut String, conversion: &Conversion) -> Result<(), EmitError> {
        let source = self.spell(conversion.source)?;
        let target = self.spell(conversion.target)?;
        let register = match conversion.registration {
            Registration::HandWritten => "AddConversionFunc",
            Registration::Generated => "AddGeneratedConversionFunc",
        };
        out.push_str(&format!(
            "\tif err := s.{register}((*{source})(nil), (*{target})(nil), func(a, b interface{{}}) error {{\n"
        ));
        out.push_str(&format!(
            "\t\treturn {}(a.(*{source}), b.(*{target}))\n",
            conversion.function
        ));
        out.push_str("\t}); err != nil {\n\t\treturn err\n\t}\n");
        Ok(())
    }

    fn function(&mut self, out: &mut String, conversion: &Conversion) -> Result<(), EmitError> {
        let source = self.spell(conversion.source)?;
        let target = self.spell(conversion.target)?;
        let function = &conversion.function;
        out.push_str(&format!(
            "// {function} is an autogenerated conversion function.\n"
        ));
        out.push_str(&format!(
            "func {function}(in *{source}, out *{target}) error {{\n"
        ));
        for field in &conversion.fields {
            self.field(out, field)?;
        }
        out.push_str("\treturn nil\n}\n");
        Ok(())
    }

    fn field(&mut self, out: &mut String, field: &FieldPlan) -> Result<(), EmitError> {
        let name = &field.name;
        match &field.step {
            FieldStep::Assign => out.push_str(&format!("\tout.{name} = in.{name}\n")),
            FieldStep::Cast { target } => {
                let target = self.spell(*target)?;
                out.push_str(&format!("\tout.{name} = {target}(in.{name})\n"));
            }
            FieldStep::Convert { function } => {
                out.push_str(&format!(
                    "\tif err := {function}(&in.{name}, &out.{name}); err != nil {{\n"
                ));
                out.push_str("\t\treturn err\n\t}\n");
            }
            FieldStep::ConvertPointer { function, elem } => {
                let elem = self.spell(*elem)?;
                out.push_str(&format!("\tif in.{name} != nil {{\n"));
                out.push_str(&format!("\t\tin, out := &in.{name}, &out.{name}\n"));
                out.push_str(&format!("\t\t*out = new({elem})\n"));
                out.push_str(&format!("\t\tif err := {function}(*in, *out); err != nil {{\n"));
                out.push_str("\t\t\treturn err\n\t\t}\n");
                out.push_str(&format!("\t}} else {{\n\t\tout.{name} = nil\n\t}}\n"));
            }
            FieldStep::ConvertSlice { function, elem } => {
                let elem = self.spell(*elem)?;
                out.push_str(&format!("\tif in.{name} != nil {{\n"));
                out.push_str(&format!("\t\tin, out := &in.{name}, &out.{name}\n"));
                out.push_str(&format!("\t\t*out = make([]{elem}, len(*in))\n"));
                out.push_str("\t\tfor i := range *in {\n");
                out.push_str(&format!(
                    "\t\t\tif err := {function}(&(*in)[i], &(*out)[i]); err != nil {{\n"
                ));
                out.push_str("\t\t\t\treturn err\n\t\t\t}\n\t\t}\n");
                out.push_str(&format!("\t}} else {{\n\t\tout.{name} = nil\n\t}}\n"));
            }
            FieldStep::ConvertMap {
                function,
                key,
                elem,
            } => {
                let key = self.spell(*key)?;
                let elem = self.spell(*elem)?;
                out.push_str(&format!("\tif in.{name} != nil {{\n"));
                out.push_str(&format!("\t\tin, out := &in.{name}, &out.{name}\n"));
                out.push_str(&format!("\t\t*out = make(map[{key}]{elem}, len(*in))\n"));
                out.push_str("\t\tfor key, val := range *in {\n");
                out.push_str(&format!("\t\t\tnewVal := new({elem})\n"));
                out.push_str(&format!(
                    "\t\t\tif err := {function}(&val, newVal); err != nil {{\n"
                ));
                out.push_str("\t\t\t\treturn err\n\t\t\t}\n");
                out.push_str("\t\t\t(*out)[key] = *newVal\n\t\t}\n");
                out.push_str(&format!("\t}} else {{\n\t\tout.{name} = nil\n\t}}\n"));
            }
            FieldStep::Manual { reason } => {
                out.push_str(&format!("\t// WARNING: in.{name} {}\n", reason.as_str()));
            }
        }
        Ok(())
    }
}
