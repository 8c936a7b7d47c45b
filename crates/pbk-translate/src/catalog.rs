//! Built-in function catalog and overload resolution.

use crate::error::{Result, TranslateError};
use indexmap::IndexMap;
use pbk_ast::{Scalar, Span, Type};

/// Stand-in for "any image" in image-method signatures.
const ANY_IMAGE: Type = Type::Image(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub returns: Type,
}

impl Signature {
    pub fn new(params: impl Into<Vec<Type>>, returns: Type) -> Self {
        Self {
            params: params.into(),
            returns,
        }
    }

    fn accepts(&self, args: &[Type]) -> bool {
        self.matching_prefix(args) == self.params.len()
    }

    /// Number of leading arguments this signature accepts.
    fn matching_prefix(&self, args: &[Type]) -> usize {
        self.params
            .iter()
            .zip(args)
            .take_while(|(param, arg)| accepts(**param, **arg))
            .count()
    }
}

fn accepts(param: Type, arg: Type) -> bool {
    param == arg
        || arg == Type::Any
        || (param == ANY_IMAGE && matches!(arg, Type::Image(_)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signatures {
    Single(Signature),
    Overloaded(Vec<Signature>),
}

impl Signatures {
    pub fn candidates(&self) -> &[Signature] {
        match self {
            Signatures::Single(sig) => std::slice::from_ref(sig),
            Signatures::Overloaded(sigs) => sigs,
        }
    }

    /// Pick the first candidate accepting `args` and return its result type.
    ///
    /// When an argument is [`Type::Any`] and the accepting candidates
    /// disagree on the result, the result is `Any` as well.
    pub fn resolve(&self, name: &str, args: &[Type], span: Span) -> Result<Type> {
        let by_arity: Vec<&Signature> = self
            .candidates()
            .iter()
            .filter(|sig| sig.params.len() == args.len())
            .collect();

        if by_arity.is_empty() {
            let mut arities: Vec<usize> = self.candidates().iter().map(|s| s.params.len()).collect();
            arities.sort_unstable();
            arities.dedup();
            let expected = arities
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(TranslateError::WrongArgumentCount {
                name: name.to_string(),
                expected,
                found: args.len(),
                span,
            });
        }

        let mut accepting = by_arity.iter().filter(|sig| sig.accepts(args));
        if let Some(first) = accepting.next() {
            let generic = args.contains(&Type::Any);
            if generic && accepting.any(|sig| sig.returns != first.returns) {
                return Ok(Type::Any);
            }
            return Ok(first.returns);
        }

        // Report against the candidate that got furthest; earlier wins ties.
        let mut best = (by_arity[0], by_arity[0].matching_prefix(args));
        for sig in &by_arity[1..] {
            let prefix = sig.matching_prefix(args);
            if prefix > best.1 {
                best = (sig, prefix);
            }
        }
        let (sig, prefix) = best;
        Err(TranslateError::WrongArgumentType {
            name: name.to_string(),
            position: prefix + 1,
            expected: sig.params[prefix],
            found: args[prefix],
            span,
        })
    }
}

/// How a resolved name is called in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalleeKind {
    /// Runtime library helper, called by bare name.
    Builtin,
    /// Method on the first (image) argument.
    ImageMethod,
    /// `outCoord()`, a method on the kernel instance.
    Instance,
    /// Function defined in the kernel, a method on the instance.
    Kernel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    pub kind: CalleeKind,
    pub signatures: Signatures,
}

/// Functions callable from kernel code, seeded with the built-in catalog.
#[derive(Debug, Clone)]
pub struct FunctionTable {
    entries: IndexMap<String, Callee>,
}

impl FunctionTable {
    pub fn with_builtins() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Callee> {
        self.entries.get(name)
    }

    pub fn register_kernel_function(&mut self, name: &str, signature: Signature) {
        self.entries.insert(
            name.to_string(),
            Callee {
                kind: CalleeKind::Kernel,
                signatures: Signatures::Single(signature),
            },
        );
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Names that become methods on their first argument.
pub const IMAGE_METHODS: &[&str] = &["sampleNearest", "sampleLinear", "pixelSize", "pixelAspectRatio"];

fn floats() -> [Type; 4] {
    [
        Type::Float,
        Type::Vector(Scalar::Float, 2),
        Type::Vector(Scalar::Float, 3),
        Type::Vector(Scalar::Float, 4),
    ]
}

fn ints() -> [Type; 4] {
    [
        Type::Int,
        Type::Vector(Scalar::Int, 2),
        Type::Vector(Scalar::Int, 3),
        Type::Vector(Scalar::Int, 4),
    ]
}

fn lanes() -> [u8; 3] {
    [2, 3, 4]
}

/// `f(T) -> T` over each type.
fn unary(types: &[Type]) -> Vec<Signature> {
    types.iter().map(|&t| Signature::new([t], t)).collect()
}

/// `f(T, T) -> T` over each type, then `f(T, scalar) -> T` over the vectors.
fn binary_with_scalar(types: [Type; 4]) -> Vec<Signature> {
    let scalar = types[0];
    let mut sigs: Vec<Signature> = types.iter().map(|&t| Signature::new([t, t], t)).collect();
    sigs.extend(types[1..].iter().map(|&t| Signature::new([t, scalar], t)));
    sigs
}

fn clamp_family(types: [Type; 4]) -> Vec<Signature> {
    let scalar = types[0];
    let mut sigs: Vec<Signature> = types
        .iter()
        .map(|&t| Signature::new([t, t, t], t))
        .collect();
    sigs.extend(
        types[1..]
            .iter()
            .map(|&t| Signature::new([t, scalar, scalar], t)),
    );
    sigs
}

fn relational(with_bool: bool) -> Vec<Signature> {
    let mut sigs = Vec::new();
    let mut elements = vec![Scalar::Float, Scalar::Int];
    if with_bool {
        elements.push(Scalar::Bool);
    }
    for scalar in elements {
        for n in lanes() {
            let t = Type::Vector(scalar, n);
            sigs.push(Signature::new([t, t], Type::Vector(Scalar::Bool, n)));
        }
    }
    sigs
}

fn builtin_entries() -> IndexMap<String, Callee> {
    let mut entries = IndexMap::new();
    let mut add = |name: &str, kind: CalleeKind, mut sigs: Vec<Signature>| {
        let signatures = if sigs.len() == 1 {
            Signatures::Single(sigs.remove(0))
        } else {
            Signatures::Overloaded(sigs)
        };
        entries.insert(name.to_string(), Callee { kind, signatures });
    };
    let builtin = CalleeKind::Builtin;
    let f = floats();
    let float = Type::Float;
    let float2 = Type::Vector(Scalar::Float, 2);
    let float3 = Type::Vector(Scalar::Float, 3);

    for name in [
        "sin", "cos", "tan", "asin", "acos", "atan", "radians", "degrees", "exp", "exp2", "log",
        "log2", "sqrt", "inverseSqrt", "floor", "ceil", "fract", "normalize",
    ] {
        add(name, builtin, unary(&f));
    }
    for name in ["abs", "sign"] {
        let mut sigs = unary(&f);
        sigs.extend(unary(&ints()));
        add(name, builtin, sigs);
    }
    for name in ["atan2", "pow"] {
        add(
            name,
            builtin,
            f.iter().map(|&t| Signature::new([t, t], t)).collect(),
        );
    }
    add("mod", builtin, binary_with_scalar(f));
    for name in ["min", "max"] {
        let mut sigs = binary_with_scalar(f);
        sigs.extend(binary_with_scalar(ints()));
        add(name, builtin, sigs);
    }
    let mut clamp = clamp_family(f);
    clamp.extend(clamp_family(ints()));
    add("clamp", builtin, clamp);

    let mut step: Vec<Signature> = f.iter().map(|&t| Signature::new([t, t], t)).collect();
    step.extend(f[1..].iter().map(|&t| Signature::new([float, t], t)));
    add("step", builtin, step);

    let mut mix: Vec<Signature> = f.iter().map(|&t| Signature::new([t, t, t], t)).collect();
    mix.extend(f[1..].iter().map(|&t| Signature::new([t, t, float], t)));
    add("mix", builtin, mix);

    let mut smooth: Vec<Signature> = f.iter().map(|&t| Signature::new([t, t, t], t)).collect();
    smooth.extend(f[1..].iter().map(|&t| Signature::new([float, float, t], t)));
    add("smoothStep", builtin, smooth);

    add(
        "length",
        builtin,
        f.iter().map(|&t| Signature::new([t], float)).collect(),
    );
    for name in ["distance", "dot"] {
        add(
            name,
            builtin,
            f.iter().map(|&t| Signature::new([t, t], float)).collect(),
        );
    }
    add("cross", builtin, vec![Signature::new([float3, float3], float3)]);
    add(
        "matrixCompMult",
        builtin,
        lanes()
            .iter()
            .map(|&n| Signature::new([Type::Matrix(n), Type::Matrix(n)], Type::Matrix(n)))
            .collect(),
    );

    for name in ["lessThan", "lessThanEqual", "greaterThan", "greaterThanEqual"] {
        add(name, builtin, relational(false));
    }
    for name in ["equal", "notEqual"] {
        add(name, builtin, relational(true));
    }
    for name in ["any", "all"] {
        add(
            name,
            builtin,
            lanes()
                .iter()
                .map(|&n| Signature::new([Type::Vector(Scalar::Bool, n)], Type::Bool))
                .collect(),
        );
    }
    add(
        "not",
        builtin,
        lanes()
            .iter()
            .map(|&n| unary(&[Type::Vector(Scalar::Bool, n)]).remove(0))
            .collect(),
    );

    // Sampler results depend on the image; `Image(0)` stands for any.
    for name in ["sampleNearest", "sampleLinear"] {
        add(
            name,
            CalleeKind::ImageMethod,
            vec![Signature::new([ANY_IMAGE, float2], Type::Vector(Scalar::Float, 4))],
        );
    }
    add(
        "pixelSize",
        CalleeKind::ImageMethod,
        vec![Signature::new([ANY_IMAGE], float2)],
    );
    add(
        "pixelAspectRatio",
        CalleeKind::ImageMethod,
        vec![Signature::new([ANY_IMAGE], float)],
    );
    add("outCoord", CalleeKind::Instance, vec![Signature::new(Vec::new(), float2)]);

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str, args: &[Type]) -> Result<Type> {
        let table = FunctionTable::with_builtins();
        table
            .get(name)
            .unwrap()
            .signatures
            .resolve(name, args, Span::default())
    }

    fn float(n: u8) -> Type {
        Type::vector(Scalar::Float, n)
    }

    #[test]
    fn test_exact_overload_selected() {
        assert_eq!(resolve("dot", &[float(3), float(3)]).unwrap(), Type::Float);
        assert_eq!(resolve("mix", &[float(3), float(3), float(1)]).unwrap(), float(3));
        assert_eq!(resolve("abs", &[Type::Int]).unwrap(), Type::Int);
    }

    #[test]
    fn test_mismatch_reports_position_of_best_candidate() {
        let err = resolve("dot", &[float(3), float(2)]).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::WrongArgumentType {
                position: 2,
                expected,
                found,
                ..
            } if expected == float(3) && found == float(2)
        ));
    }

    #[test]
    fn test_wrong_count() {
        let err = resolve("sin", &[Type::Float, Type::Float]).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::WrongArgumentCount { found: 2, ref expected, .. } if expected == "1"
        ));
    }

    #[test]
    fn test_any_matches_and_blurs_result() {
        // Every `sin` overload returns its argument type.
        assert_eq!(resolve("sin", &[Type::Any]).unwrap(), Type::Any);
        // Every `length` overload returns float.
        assert_eq!(resolve("length", &[Type::Any]).unwrap(), Type::Float);
    }

    #[test]
    fn test_image_methods_accept_any_image() {
        assert!(resolve("sampleLinear", &[Type::Image(3), float(2)]).is_ok());
        assert!(resolve("pixelSize", &[Type::Float]).is_err());
    }

    #[test]
    fn test_kernel_functions_override() {
        let mut table = FunctionTable::with_builtins();
        table.register_kernel_function("blend", Signature::new([Type::Float], Type::Float));
        assert_eq!(table.get("blend").unwrap().kind, CalleeKind::Kernel);
        assert_eq!(table.get("sin").unwrap().kind, CalleeKind::Builtin);
    }
}
