//! Kernel-level declarations and the `#define` macro record.

use super::{Declaration, Expr, Stmt};
use crate::foundation::{Span, Type};
use indexmap::IndexMap;
use serde::Serialize;

/// `name: value;` attributes of a `< ... >` tag, in source order.
pub type Metadata = IndexMap<String, Expr>;

/// A parsed kernel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kernel {
    pub name: String,
    /// The tag preceding `kernel` (`languageVersion`)
    pub header: Metadata,
    /// The kernel tag (`namespace`, `vendor`, `version`, `description`, ...)
    pub metadata: Metadata,
    pub items: Vec<KernelItem>,
    pub span: Span,
}

/// Declarations allowed directly inside the kernel body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum KernelItem {
    Parameter(Parameter),
    Input(InputDeclaration),
    Output(OutputDeclaration),
    Constant(Declaration),
    Dependent(DependentDeclaration),
    Function(FunctionDefinition),
}

/// `parameter float amount < minValue: 0.0; ... >;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
    pub min_value: Option<Expr>,
    pub max_value: Option<Expr>,
    pub step_interval: Option<Expr>,
    pub default_value: Option<Expr>,
    pub preview_value: Option<Expr>,
    /// Every other tag attribute (`description`, `parameterType`, ...)
    pub attributes: Metadata,
    pub span: Span,
}

/// `input image4 src;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputDeclaration {
    pub name: String,
    /// Always `Type::Image(n)`
    pub ty: Type,
    pub span: Span,
}

impl InputDeclaration {
    pub fn channels(&self) -> u8 {
        match self.ty {
            Type::Image(n) => n,
            _ => 0,
        }
    }
}

/// `output pixel4 dst;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDeclaration {
    pub name: String,
    /// The pixel value type (`float` .. `float4`)
    pub ty: Type,
    pub span: Span,
}

impl OutputDeclaration {
    pub fn channels(&self) -> u8 {
        self.ty.width()
    }
}

/// `dependent float a, b;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependentDeclaration {
    pub ty: Type,
    pub names: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: Type,
    pub arguments: Vec<Argument>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

impl FunctionDefinition {
    /// Functions that mention `region` or `imageRef` cannot be expressed in
    /// the output and are skipped by the translator.
    pub fn is_supported(&self) -> bool {
        self.return_type.is_supported() && self.arguments.iter().all(|a| a.ty.is_supported())
    }
}

/// A `#define` macro.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Macro {
    pub name: String,
    /// `None` for constant-like macros (`#define TWO 2`); `Some` even when
    /// empty for function-like ones (`#define NOW() ...`).
    pub params: Option<Vec<String>>,
    pub body: Expr,
    pub span: Span,
}

impl Macro {
    pub fn arity(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }

    /// Constant-like or declared with an empty parameter list.
    pub fn takes_no_arguments(&self) -> bool {
        self.arity() == 0
    }
}

impl Kernel {
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Parameter(p) => Some(p),
            _ => None,
        })
    }

    pub fn inputs(&self) -> impl Iterator<Item = &InputDeclaration> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Input(i) => Some(i),
            _ => None,
        })
    }

    pub fn outputs(&self) -> impl Iterator<Item = &OutputDeclaration> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Output(o) => Some(o),
            _ => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Constant(c) => Some(c),
            _ => None,
        })
    }

    pub fn dependents(&self) -> impl Iterator<Item = &DependentDeclaration> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Dependent(d) => Some(d),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.items.iter().filter_map(|item| match item {
            KernelItem::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions().find(|f| f.name == name)
    }
}
