//! `TypeInfo` and its shared payloads.

use crate::hash::TypeHasher;
use indexmap::IndexMap;
use nodelint_ast::NodeId;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::rc::Rc;

/// The base tag of a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum BaseType {
    /// No information. Both top and bottom depending on direction; checks
    /// never fire on it.
    #[default]
    Unknown,
    Sum,
    Undefined,
    Null,
    Number,
    String,
    Boolean,
    Object,
    Array,
    Function,
    Class,
    Promise,
}

impl BaseType {
    /// Printable name, as it appears in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            BaseType::Unknown => "unknown",
            BaseType::Sum => "sum type",
            BaseType::Undefined => "undefined",
            BaseType::Null => "null",
            BaseType::Number => "number",
            BaseType::String => "string",
            BaseType::Boolean => "boolean",
            BaseType::Object => "object",
            BaseType::Array => "array",
            BaseType::Function => "function",
            BaseType::Class => "class",
            BaseType::Promise => "promise",
        }
    }
}

/// Where a lazily-typed function or class is defined. The module is named
/// by its canonical path string; the pair is stable for the whole run and
/// keys the payload's identity hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefSite {
    pub module: Rc<str>,
    pub node: NodeId,
}

impl DefSite {
    pub fn new(module: Rc<str>, node: NodeId) -> Self {
        DefSite { module, node }
    }

    fn hash_into(&self, hasher: &mut TypeHasher) {
        hasher.write_str(&self.module);
        hasher.write_u64(u64::from(self.node.0));
    }
}

/// A string type that carries its literal value. The value is data, not
/// part of the type: two literal strings compare equal as types.
#[derive(Clone, Debug)]
pub struct StringLiteralTypeData {
    pub value: String,
    hash: u64,
}

/// An object type: property name → type, plus whether the property set is
/// closed (`strict`).
#[derive(Clone, Debug)]
pub struct ObjectTypeData {
    pub properties: IndexMap<String, TypeInfo>,
    pub strict: bool,
    hash: u64,
}

/// The forced contents of a function type.
#[derive(Clone, Debug, Default)]
pub struct FunctionShape {
    pub argument_types: Vec<TypeInfo>,
    pub return_type: TypeInfo,
    pub variadic: bool,
}

/// A function type. Either fully shaped at construction (annotations) or
/// lazily shaped from its AST definition by the type resolver.
#[derive(Debug)]
pub struct FunctionTypeData {
    pub def: Option<DefSite>,
    shape: OnceCell<FunctionShape>,
    forcing: Cell<bool>,
    hash: u64,
}

/// The forced contents of a class type: methods, getter/setter-derived
/// properties and fields merged into one property map.
#[derive(Clone, Debug, Default)]
pub struct ClassShape {
    pub properties: IndexMap<String, TypeInfo>,
    pub strict: bool,
}

/// A class type, shaped lazily from its AST definition.
#[derive(Debug)]
pub struct ClassTypeData {
    pub def: Option<DefSite>,
    shape: OnceCell<ClassShape>,
    forcing: Cell<bool>,
    hash: u64,
}

#[derive(Clone, Debug)]
pub struct PromiseTypeData {
    pub nested: TypeInfo,
    hash: u64,
}

/// A canonicalized disjoint union; `elements` stays sorted.
#[derive(Clone, Debug)]
pub struct SumTypeData {
    pub elements: Vec<TypeInfo>,
    hash: u64,
}

/// The payload behind a `TypeInfo`, shared by reference counting. Class
/// payloads are additionally shared per declaration through the module's
/// cache, so they sit behind their own `Rc`.
#[derive(Debug)]
pub enum ExtraTypeInfo {
    StringLiteral(StringLiteralTypeData),
    Object(ObjectTypeData),
    Function(FunctionTypeData),
    Class(Rc<ClassTypeData>),
    Promise(PromiseTypeData),
    Sum(SumTypeData),
}

impl ExtraTypeInfo {
    fn content_hash(&self) -> u64 {
        match self {
            ExtraTypeInfo::StringLiteral(d) => d.hash,
            ExtraTypeInfo::Object(d) => d.hash,
            ExtraTypeInfo::Function(d) => d.hash,
            ExtraTypeInfo::Class(d) => d.hash,
            ExtraTypeInfo::Promise(d) => d.hash,
            ExtraTypeInfo::Sum(d) => d.hash,
        }
    }
}

impl PartialEq for ExtraTypeInfo {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: the keyed hash colliding across unequal payloads is
        // vanishingly unlikely, but fall through to structure anyway.
        if self.content_hash() == other.content_hash() {
            return true;
        }
        match (self, other) {
            (ExtraTypeInfo::StringLiteral(_), ExtraTypeInfo::StringLiteral(_)) => {
                // The literal value is a value, not a type.
                true
            }
            (ExtraTypeInfo::Object(a), ExtraTypeInfo::Object(b)) => {
                a.strict == b.strict && a.properties == b.properties
            }
            (ExtraTypeInfo::Function(a), ExtraTypeInfo::Function(b)) => {
                if a.def.is_some() && a.def == b.def {
                    return true;
                }
                match (a.shape(), b.shape()) {
                    (Some(sa), Some(sb)) => {
                        sa.argument_types == sb.argument_types
                            && sa.return_type == sb.return_type
                            && sa.variadic == sb.variadic
                    }
                    _ => false,
                }
            }
            (ExtraTypeInfo::Class(a), ExtraTypeInfo::Class(b)) => {
                if a.def.is_some() && a.def == b.def {
                    return true;
                }
                match (a.shape(), b.shape()) {
                    (Some(sa), Some(sb)) => sa.properties == sb.properties,
                    _ => false,
                }
            }
            (ExtraTypeInfo::Promise(a), ExtraTypeInfo::Promise(b)) => a.nested == b.nested,
            (ExtraTypeInfo::Sum(a), ExtraTypeInfo::Sum(b)) => a.elements == b.elements,
            _ => false,
        }
    }
}

impl Eq for ExtraTypeInfo {}

impl FunctionTypeData {
    /// The shape, if it has been published.
    pub fn shape(&self) -> Option<&FunctionShape> {
        self.shape.get()
    }

    /// Publish the shape on first call. Returns `None` when called
    /// re-entrantly (a function whose return type depends on itself); the
    /// caller treats that as no information.
    pub fn force(&self, init: impl FnOnce() -> FunctionShape) -> Option<&FunctionShape> {
        if let Some(shape) = self.shape.get() {
            return Some(shape);
        }
        if self.forcing.get() {
            return None;
        }
        self.forcing.set(true);
        let shape = init();
        self.forcing.set(false);
        Some(self.shape.get_or_init(|| shape))
    }
}

impl ClassTypeData {
    pub fn shape(&self) -> Option<&ClassShape> {
        self.shape.get()
    }

    pub fn force(&self, init: impl FnOnce() -> ClassShape) -> Option<&ClassShape> {
        if let Some(shape) = self.shape.get() {
            return Some(shape);
        }
        if self.forcing.get() {
            return None;
        }
        self.forcing.set(true);
        let shape = init();
        self.forcing.set(false);
        Some(self.shape.get_or_init(|| shape))
    }

    /// Class payloads are shared per declaration; the module keeps the
    /// canonical one so every `new C()` sees the same properties.
    pub fn from_def(def: DefSite) -> Rc<ClassTypeData> {
        let mut hasher = TypeHasher::new();
        hasher.write_str("class-def");
        def.hash_into(&mut hasher);
        Rc::new(ClassTypeData {
            hash: hasher.finish(),
            def: Some(def),
            shape: OnceCell::new(),
            forcing: Cell::new(false),
        })
    }
}

fn hash_properties(hasher: &mut TypeHasher, properties: &IndexMap<String, TypeInfo>) {
    // Sorted-key order: structurally equal maps built in different
    // insertion orders must hash identically.
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort_unstable();
    for key in keys {
        hasher.write_str(key);
        properties[key.as_str()].hash_into(hasher);
    }
}

/// A type value: base tag plus optional shared payload. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct TypeInfo {
    base: BaseType,
    extra: Option<Rc<ExtraTypeInfo>>,
}

impl TypeInfo {
    fn new(base: BaseType, extra: Option<Rc<ExtraTypeInfo>>) -> Self {
        TypeInfo { base, extra }
    }

    pub fn make_unknown() -> Self {
        TypeInfo::default()
    }

    pub fn make_undefined() -> Self {
        TypeInfo::new(BaseType::Undefined, None)
    }

    pub fn make_null() -> Self {
        TypeInfo::new(BaseType::Null, None)
    }

    pub fn make_number() -> Self {
        TypeInfo::new(BaseType::Number, None)
    }

    pub fn make_boolean() -> Self {
        TypeInfo::new(BaseType::Boolean, None)
    }

    pub fn make_string() -> Self {
        TypeInfo::new(BaseType::String, None)
    }

    pub fn make_string_literal(value: impl Into<String>) -> Self {
        let mut hasher = TypeHasher::new();
        hasher.write_str("string-literal");
        // The value itself stays out of the hash; it does not change the type.
        let data = StringLiteralTypeData {
            value: value.into(),
            hash: hasher.finish(),
        };
        TypeInfo::new(
            BaseType::String,
            Some(Rc::new(ExtraTypeInfo::StringLiteral(data))),
        )
    }

    pub fn make_object(properties: IndexMap<String, TypeInfo>, strict: bool) -> Self {
        let mut hasher = TypeHasher::new();
        hasher.write_str("object");
        hash_properties(&mut hasher, &properties);
        hasher.write_bool(strict);
        let data = ObjectTypeData {
            properties,
            strict,
            hash: hasher.finish(),
        };
        TypeInfo::new(BaseType::Object, Some(Rc::new(ExtraTypeInfo::Object(data))))
    }

    /// A function type with a fully known shape (from an annotation).
    pub fn make_function(
        argument_types: Vec<TypeInfo>,
        return_type: TypeInfo,
        variadic: bool,
    ) -> Self {
        let mut hasher = TypeHasher::new();
        hasher.write_str("function");
        for arg in &argument_types {
            arg.hash_into(&mut hasher);
        }
        return_type.hash_into(&mut hasher);
        hasher.write_bool(variadic);
        let data = FunctionTypeData {
            def: None,
            shape: {
                let cell = OnceCell::new();
                let _ = cell.set(FunctionShape {
                    argument_types,
                    return_type,
                    variadic,
                });
                cell
            },
            forcing: Cell::new(false),
            hash: hasher.finish(),
        };
        TypeInfo::new(
            BaseType::Function,
            Some(Rc::new(ExtraTypeInfo::Function(data))),
        )
    }

    /// A function type to be shaped lazily from its definition.
    pub fn make_function_def(def: DefSite) -> Self {
        let mut hasher = TypeHasher::new();
        hasher.write_str("function-def");
        def.hash_into(&mut hasher);
        let data = FunctionTypeData {
            hash: hasher.finish(),
            def: Some(def),
            shape: OnceCell::new(),
            forcing: Cell::new(false),
        };
        TypeInfo::new(
            BaseType::Function,
            Some(Rc::new(ExtraTypeInfo::Function(data))),
        )
    }

    /// A class type over a shared payload (one per declaration).
    pub fn make_class(data: Rc<ClassTypeData>) -> Self {
        TypeInfo::new(BaseType::Class, Some(Rc::new(ExtraTypeInfo::Class(data))))
    }

    pub fn make_promise(nested: TypeInfo) -> Self {
        let mut hasher = TypeHasher::new();
        hasher.write_str("promise");
        nested.hash_into(&mut hasher);
        let data = PromiseTypeData {
            nested,
            hash: hasher.finish(),
        };
        TypeInfo::new(
            BaseType::Promise,
            Some(Rc::new(ExtraTypeInfo::Promise(data))),
        )
    }

    /// A canonicalized sum: elements sorted by `(base, hash)`.
    pub fn make_sum(mut elements: Vec<TypeInfo>) -> Self {
        elements.sort();
        let mut hasher = TypeHasher::new();
        hasher.write_str("sum");
        for elem in &elements {
            elem.hash_into(&mut hasher);
        }
        let data = SumTypeData {
            elements,
            hash: hasher.finish(),
        };
        TypeInfo::new(BaseType::Sum, Some(Rc::new(ExtraTypeInfo::Sum(data))))
    }

    #[inline]
    pub fn base(&self) -> BaseType {
        self.base
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.base.name()
    }

    /// True iff the type carries any information at all.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.base != BaseType::Unknown
    }

    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }

    pub fn extra(&self) -> Option<&ExtraTypeInfo> {
        self.extra.as_deref()
    }

    pub fn as_object(&self) -> Option<&ObjectTypeData> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::Object(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionTypeData> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::Function(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassTypeData> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::Class(d)) => Some(d.as_ref()),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&PromiseTypeData> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::Promise(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_sum(&self) -> Option<&SumTypeData> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::Sum(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self.extra.as_deref() {
            Some(ExtraTypeInfo::StringLiteral(d)) => Some(&d.value),
            _ => None,
        }
    }

    pub fn content_hash(&self) -> u64 {
        self.extra.as_deref().map_or(0, ExtraTypeInfo::content_hash)
    }

    pub fn hash_into(&self, hasher: &mut TypeHasher) {
        hasher.write_u8(self.base as u8);
        if let Some(extra) = &self.extra {
            hasher.write_u64(extra.content_hash());
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        if self.base != other.base {
            return false;
        }
        match (&self.extra, &other.extra) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.base, self.content_hash()).cmp(&(other.base, other.content_hash()))
    }
}
