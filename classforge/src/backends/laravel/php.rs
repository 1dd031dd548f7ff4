//! Minimal PHP code-building AST
//!
//! Laravel artifacts are assembled as [`PhpFile`] values and rendered by a
//! single renderer, so indentation, quoting and array layout are handled in
//! one place.

use std::fmt::Write;

const INDENT: &str = "    ";

/// A PHP expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpExpr {
    /// Single-quoted string literal
    Str(String),
    /// Verbatim expression (`User::class`, `true`, `10`)
    Raw(String),
    /// `[a, b]`
    List(Vec<PhpExpr>),
    /// `['k' => v]`
    Map(Vec<(String, PhpExpr)>),
}

impl PhpExpr {
    pub fn str(value: impl Into<String>) -> Self {
        PhpExpr::Str(value.into())
    }

    pub fn raw(value: impl Into<String>) -> Self {
        PhpExpr::Raw(value.into())
    }

    /// List of string literals
    pub fn str_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PhpExpr::List(values.into_iter().map(|v| PhpExpr::Str(v.into())).collect())
    }

    /// Render inline on a single line
    pub fn inline(&self) -> String {
        match self {
            PhpExpr::Str(s) => quote(s),
            PhpExpr::Raw(r) => r.clone(),
            PhpExpr::List(items) => {
                let items: Vec<String> = items.iter().map(PhpExpr::inline).collect();
                format!("[{}]", items.join(", "))
            }
            PhpExpr::Map(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{} => {}", quote(k), v.inline()))
                    .collect();
                format!("[{}]", entries.join(", "))
            }
        }
    }

    /// Render with one entry per line for non-empty arrays
    pub fn render(&self, depth: usize) -> String {
        let pad = INDENT.repeat(depth + 1);
        let close = INDENT.repeat(depth);
        match self {
            PhpExpr::List(items) if !items.is_empty() => {
                let mut out = String::from("[\n");
                for item in items {
                    let _ = writeln!(out, "{}{},", pad, item.render(depth + 1));
                }
                out.push_str(&close);
                out.push(']');
                out
            }
            PhpExpr::Map(entries) if !entries.is_empty() => {
                let mut out = String::from("[\n");
                for (key, value) in entries {
                    let _ = writeln!(out, "{}{} => {},", pad, quote(key), value.render(depth + 1));
                }
                out.push_str(&close);
                out.push(']');
                out
            }
            other => other.inline(),
        }
    }
}

/// Single-quote a PHP string
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// A class constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub value: PhpExpr,
}

/// A class property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub visibility: Visibility,
    pub ty: Option<String>,
    pub name: String,
    pub value: Option<PhpExpr>,
}

impl Property {
    pub fn protected(name: &str, value: PhpExpr) -> Self {
        Self {
            visibility: Visibility::Protected,
            ty: None,
            name: name.to_string(),
            value: Some(value),
        }
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: Option<String>,
    pub name: String,
    pub default: Option<String>,
    /// Constructor property promotion visibility
    pub promote: Option<Visibility>,
}

impl Param {
    pub fn new(ty: &str, name: &str) -> Self {
        Self {
            ty: Some(ty.to_string()),
            name: name.to_string(),
            default: None,
            promote: None,
        }
    }

    pub fn promoted(visibility: Visibility, ty: &str, name: &str) -> Self {
        Self {
            promote: Some(visibility),
            ..Self::new(ty, name)
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(visibility) = self.promote {
            out.push_str(visibility.as_str());
            out.push(' ');
        }
        if let Some(ty) = &self.ty {
            out.push_str(ty);
            out.push(' ');
        }
        out.push('$');
        out.push_str(&self.name);
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// A method; `body == None` renders a signature only (interfaces)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub doc: Vec<String>,
    pub visibility: Visibility,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Option<Vec<String>>,
}

impl Method {
    pub fn public(name: &str) -> Self {
        Self {
            doc: Vec::new(),
            visibility: Visibility::Public,
            name: name.to_string(),
            params: Vec::new(),
            return_type: None,
            body: Some(Vec::new()),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: &str) -> Self {
        self.return_type = Some(ty.to_string());
        self
    }

    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Append body lines; nested indentation is part of the line
    pub fn body<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body
            .get_or_insert_with(Vec::new)
            .extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn signature_only(mut self) -> Self {
        self.body = None;
        self
    }
}

/// Kind of class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    /// `return new class ... { };`
    Anonymous,
}

/// A class, interface or anonymous class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: String,
    pub doc: Vec<String>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub traits: Vec<String>,
    pub constants: Vec<Constant>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
}

impl ClassDecl {
    pub fn new(kind: ClassKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            doc: Vec::new(),
            extends: None,
            implements: Vec::new(),
            traits: Vec::new(),
            constants: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.extends = Some(parent.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.implements.push(interface.to_string());
        self
    }
}

/// One PHP source file holding a single declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpFile {
    pub namespace: Option<String>,
    pub uses: Vec<String>,
    pub class: ClassDecl,
}

impl PhpFile {
    pub fn new(namespace: Option<String>, class: ClassDecl) -> Self {
        Self {
            namespace,
            uses: Vec::new(),
            class,
        }
    }

    pub fn uses(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.uses.contains(&path) {
            self.uses.push(path);
        }
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?php\n\n");
        if let Some(namespace) = &self.namespace {
            let _ = writeln!(out, "namespace {};\n", namespace);
        }
        if !self.uses.is_empty() {
            let mut uses = self.uses.clone();
            uses.sort();
            for path in uses {
                let _ = writeln!(out, "use {};", path);
            }
            out.push('\n');
        }
        render_class(&mut out, &self.class);
        out
    }
}

/// A file that only returns an array (Laravel config files)
pub fn render_return(value: &PhpExpr) -> String {
    format!("<?php\n\nreturn {};\n", value.render(0))
}

fn render_doc(out: &mut String, doc: &[String], pad: &str) {
    if doc.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}/**", pad);
    for line in doc {
        if line.is_empty() {
            let _ = writeln!(out, "{} *", pad);
        } else {
            let _ = writeln!(out, "{} * {}", pad, line);
        }
    }
    let _ = writeln!(out, "{} */", pad);
}

fn render_class(out: &mut String, class: &ClassDecl) {
    render_doc(out, &class.doc, "");

    let mut header = match class.kind {
        ClassKind::Class => format!("class {}", class.name),
        ClassKind::Interface => format!("interface {}", class.name),
        ClassKind::Anonymous => "return new class".to_string(),
    };
    if let Some(parent) = &class.extends {
        let _ = write!(header, " extends {}", parent);
    }
    if !class.implements.is_empty() {
        let _ = write!(header, " implements {}", class.implements.join(", "));
    }
    let _ = writeln!(out, "{}\n{{", header);

    let mut sections: Vec<String> = Vec::new();

    if !class.traits.is_empty() {
        sections.push(format!("{}use {};\n", INDENT, class.traits.join(", ")));
    }

    if !class.constants.is_empty() {
        let mut section = String::new();
        for constant in &class.constants {
            let _ = writeln!(
                section,
                "{}public const {} = {};",
                INDENT,
                constant.name,
                constant.value.render(1)
            );
        }
        sections.push(section);
    }

    for property in &class.properties {
        let mut section = String::new();
        let _ = write!(section, "{}{} ", INDENT, property.visibility.as_str());
        if let Some(ty) = &property.ty {
            let _ = write!(section, "{} ", ty);
        }
        let _ = write!(section, "${}", property.name);
        if let Some(value) = &property.value {
            let _ = write!(section, " = {}", value.render(1));
        }
        section.push_str(";\n");
        sections.push(section);
    }

    for method in &class.methods {
        let mut section = String::new();
        render_doc(&mut section, &method.doc, INDENT);
        let params: Vec<String> = method.params.iter().map(Param::render).collect();
        let _ = write!(
            section,
            "{}{} function {}({})",
            INDENT,
            method.visibility.as_str(),
            method.name,
            params.join(", ")
        );
        if let Some(ty) = &method.return_type {
            let _ = write!(section, ": {}", ty);
        }
        match &method.body {
            None => section.push_str(";\n"),
            Some(body) => {
                let _ = writeln!(section, "\n{}{{", INDENT);
                for line in body {
                    if line.is_empty() {
                        section.push('\n');
                    } else {
                        let _ = writeln!(section, "{}{}{}", INDENT, INDENT, line);
                    }
                }
                let _ = writeln!(section, "{}}}", INDENT);
            }
        }
        sections.push(section);
    }

    out.push_str(&sections.join("\n"));
    match class.kind {
        ClassKind::Anonymous => out.push_str("};\n"),
        _ => out.push_str("}\n"),
    }
}
