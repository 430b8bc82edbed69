//! Member descriptors

use std::fmt;
use std::sync::Arc;

use spyglass_sdk::{ParameterDef, TypeId, TypeRegistry, Value};

use super::{CacheEntry, EvalState};
use crate::adapter::Binding;
use crate::classify::ValueKind;
use crate::error::{ArgumentError, EvalFault, WriteFault};
use crate::parse::{coerce_value, is_text_enterable, parse_value};
use crate::reflect::{Member, MemberKind, ReflectedMember};

/// One reflected member bound to the inspected target
///
/// Everything but the evaluation state and the argument buffer is fixed at
/// build time. The state only changes through [`MemberDescriptor::evaluate`],
/// a successful [`MemberDescriptor::set_value`] or
/// [`MemberDescriptor::invalidate`].
pub struct MemberDescriptor {
    signature: String,
    kind: MemberKind,
    declaring_type: TypeId,
    declaring_index: usize,
    is_static: bool,
    can_write: bool,
    value_type: TypeId,
    member: Member,
    binding: Arc<Binding>,
    arguments: Vec<Option<Value>>,
    state: EvalState,
}

impl MemberDescriptor {
    /// Bind a reflected member
    ///
    /// `declaring_index` is the declaring type's position in the target's
    /// hierarchy, used as a sort key.
    pub fn new(
        signature: String,
        declaring_index: usize,
        reflected: ReflectedMember,
        binding: Arc<Binding>,
    ) -> Self {
        let member = reflected.member;
        Self {
            signature,
            kind: member.kind(),
            declaring_type: reflected.declaring,
            declaring_index,
            is_static: member.is_static(),
            can_write: member.can_write(),
            value_type: member.value_type(),
            arguments: vec![None; member.parameters().len()],
            member,
            binding,
            state: EvalState::NotEvaluated,
        }
    }

    /// `Type.Member`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// Property, field or method
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Declaring type
    pub fn declaring_type(&self) -> TypeId {
        self.declaring_type
    }

    /// Position of the declaring type in the target's hierarchy
    pub fn declaring_index(&self) -> usize {
        self.declaring_index
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared type of the member's value
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// Underlying member definition
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// Parameters (method arguments or indexer keys)
    pub fn parameters(&self) -> &[ParameterDef] {
        self.member.parameters()
    }

    /// Whether arguments must be supplied before evaluating
    pub fn requires_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }

    /// Whether every parameter can be entered as text
    ///
    /// Members with other parameter types are still evaluable, with
    /// arguments supplied through [`MemberDescriptor::set_arguments`].
    pub fn accepts_text_arguments(&self) -> bool {
        let registry = self.binding.registry();
        self.parameters()
            .iter()
            .all(|p| registry.is_primitive_or_string(p.ty))
    }

    /// Current argument buffer
    pub fn arguments(&self) -> &[Option<Value>] {
        &self.arguments
    }

    /// Set one argument
    pub fn set_argument(&mut self, index: usize, value: Value) -> Result<(), ArgumentError> {
        let value = self.check_argument(index, value)?;
        self.arguments[index] = Some(value);
        Ok(())
    }

    /// Parse and set one argument
    pub fn set_argument_text(&mut self, index: usize, text: &str) -> Result<(), ArgumentError> {
        let param = self.parameter(index)?;
        let value = parse_value(text, param.ty, self.binding.registry())?;
        self.set_argument(index, value)
    }

    /// Replace the whole argument buffer
    ///
    /// Nothing is changed unless every value fits.
    pub fn set_arguments(&mut self, values: Vec<Value>) -> Result<(), ArgumentError> {
        if values.len() != self.arguments.len() {
            return Err(ArgumentError::Count {
                expected: self.arguments.len(),
                got: values.len(),
            });
        }
        let checked = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| self.check_argument(i, v).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        self.arguments = checked;
        Ok(())
    }

    /// Empty the argument buffer
    pub fn clear_arguments(&mut self) {
        self.arguments.iter_mut().for_each(|a| *a = None);
    }

    fn parameter(&self, index: usize) -> Result<&ParameterDef, ArgumentError> {
        self.parameters()
            .get(index)
            .ok_or(ArgumentError::NoSuchParameter {
                index,
                count: self.arguments.len(),
            })
    }

    fn check_argument(&self, index: usize, value: Value) -> Result<Value, ArgumentError> {
        let param = self.parameter(index)?;
        let got = value.type_name();
        coerce_value(self.binding.registry(), param.ty, value).ok_or_else(|| {
            ArgumentError::TypeMismatch {
                parameter: param.name.clone(),
                expected: self.binding.registry().name_of(param.ty).to_string(),
                got: got.to_string(),
            }
        })
    }

    /// All arguments, if every one has been supplied
    fn complete_arguments(&self) -> Option<Vec<Value>> {
        self.arguments.iter().cloned().collect()
    }

    /// Read the member and record the outcome
    pub fn evaluate(&mut self) -> ValueKind {
        let result = match self.complete_arguments() {
            Some(args) => self.binding.get(&self.member, &args),
            None => Err(EvalFault::MissingArguments {
                expected: self.arguments.len(),
                supplied: self.arguments.iter().filter(|a| a.is_some()).count(),
            }),
        };
        if let Err(fault) = &result {
            tracing::trace!(member = %self.signature, "evaluation faulted: {}", fault);
        } else {
            tracing::trace!(member = %self.signature, "evaluated");
        }
        self.state = EvalState::settle(result);
        self.value_kind()
    }

    /// Write the member, then re-read it
    ///
    /// Indexers use the argument buffer as the index. On failure the cached
    /// state is left untouched.
    pub fn set_value(&mut self, value: Value) -> Result<(), WriteFault> {
        if !self.can_write {
            return Err(WriteFault::NotWritable(self.signature.clone()));
        }
        let index = self
            .complete_arguments()
            .ok_or_else(|| WriteFault::ArgumentsRequired {
                expected: self.arguments.len(),
                supplied: self.arguments.iter().filter(|a| a.is_some()).count(),
            })?;

        let got = value.type_name();
        let value = coerce_value(self.binding.registry(), self.value_type, value).ok_or_else(|| {
            WriteFault::TypeMismatch {
                member: self.signature.clone(),
                expected: self.binding.registry().name_of(self.value_type).to_string(),
                got: got.to_string(),
            }
        })?;

        self.binding.set(&self.member, &index, value)?;
        self.evaluate();
        Ok(())
    }

    /// Return to `NotEvaluated`
    pub fn invalidate(&mut self) {
        self.state = EvalState::NotEvaluated;
    }

    /// Current state
    pub fn state(&self) -> &EvalState {
        &self.state
    }

    /// Classification of the current state
    pub fn value_kind(&self) -> ValueKind {
        CacheEntry::value_kind(self)
    }

    /// Whether the member is cheap enough to evaluate on first display
    pub fn auto_evaluates(&self) -> bool {
        self.kind != MemberKind::Method && self.arguments.is_empty()
    }

    /// Whether the text entered for this member's value can be parsed
    pub fn accepts_text_value(&self) -> bool {
        self.can_write && is_text_enterable(self.binding.registry(), self.value_type)
    }
}

impl CacheEntry for MemberDescriptor {
    fn label(&self) -> &str {
        &self.signature
    }

    fn registry(&self) -> &TypeRegistry {
        self.binding.registry()
    }

    fn declared_type(&self) -> Option<TypeId> {
        Some(self.value_type)
    }

    fn state(&self) -> &EvalState {
        &self.state
    }

    fn evaluate(&mut self) -> ValueKind {
        MemberDescriptor::evaluate(self)
    }

    fn can_write(&self) -> bool {
        self.can_write
    }

    fn set_value(&mut self, value: Value) -> Result<(), WriteFault> {
        MemberDescriptor::set_value(self, value)
    }

    fn invalidate(&mut self) {
        MemberDescriptor::invalidate(self)
    }

    fn auto_evaluates(&self) -> bool {
        MemberDescriptor::auto_evaluates(self)
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("signature", &self.signature)
            .field("kind", &self.kind)
            .field("declaring_index", &self.declaring_index)
            .field("is_static", &self.is_static)
            .field("can_write", &self.can_write)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::adapter_for;
    use crate::target::TargetHandle;
    use spyglass_sdk::{
        Fault, FieldDef, MethodDef, NativeObject, ObjectRef, PropertyDef, TypeDef,
    };

    struct Fixture {
        registry: Arc<TypeRegistry>,
        ty: TypeId,
        object: Arc<NativeObject>,
        binding: Arc<Binding>,
    }

    fn fixture() -> Fixture {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(
            TypeDef::class("Counter")
                .with_field(FieldDef::new("count", TypeId::INT).with_default(5))
                .with_field(FieldDef::new("id", TypeId::INT).as_readonly().with_default(1))
                .with_property(
                    PropertyDef::new("Clamped", TypeId::INT)
                        .getter(|r, _| r.field("count"))
                        // Coerces on write
                        .setter(|r, _, v| {
                            r.set_field("count", Value::Int(v.as_int().unwrap_or(0).min(100)))
                        }),
                )
                .with_property(PropertyDef::new("Broken", TypeId::INT).getter(|r, _| {
                    match r.field("count")? {
                        Value::Int(n) if n < 0 => Ok(Value::Int(-n)),
                        _ => Err(Fault::null_reference("no backing object")),
                    }
                }))
                .with_method(
                    MethodDef::new("Add", TypeId::INT, |r, args| {
                        let base = r.field("count")?.as_int().unwrap_or(0);
                        Ok(Value::Int(base + args[0].as_int().unwrap_or(0)))
                    })
                    .with_param(ParameterDef::new("amount", TypeId::INT)),
                ),
        );
        let registry = Arc::new(registry);
        let object = Arc::new(NativeObject::instantiate(&registry, ty));
        let target = TargetHandle::instance(
            &registry,
            &Value::Object(ObjectRef::Native(Arc::clone(&object))),
        )
        .unwrap();
        let binding = Arc::new(Binding::new(adapter_for(&registry, &target), &target, ty));
        Fixture {
            registry,
            ty,
            object,
            binding,
        }
    }

    fn descriptor(f: &Fixture, member: Member) -> MemberDescriptor {
        let signature = format!("Counter.{}", member.name());
        MemberDescriptor::new(
            signature,
            0,
            ReflectedMember {
                declaring: f.ty,
                member,
            },
            Arc::clone(&f.binding),
        )
    }

    fn field(f: &Fixture, index: usize) -> MemberDescriptor {
        descriptor(f, Member::Field(f.registry.get(f.ty).unwrap().fields[index].clone()))
    }

    fn property(f: &Fixture, index: usize) -> MemberDescriptor {
        descriptor(f, Member::Property(f.registry.get(f.ty).unwrap().properties[index].clone()))
    }

    fn method(f: &Fixture) -> MemberDescriptor {
        descriptor(f, Member::Method(f.registry.get(f.ty).unwrap().methods[0].clone()))
    }

    #[test]
    fn test_not_evaluated_until_asked() {
        let f = fixture();
        let d = field(&f, 0);
        assert!(d.state().is_not_evaluated());
        assert_eq!(d.value_kind(), ValueKind::NotEvaluated);
        assert!(d.auto_evaluates());
    }

    #[test]
    fn test_write_then_read_back() {
        let f = fixture();
        let mut d = field(&f, 0);
        assert_eq!(d.evaluate(), ValueKind::Number);
        d.set_value(Value::Int(10)).unwrap();
        assert_eq!(d.state().value(), Some(&Value::Int(10)));
        assert_eq!(f.object.get("count"), Some(Value::Int(10)));
    }

    #[test]
    fn test_readonly_write_keeps_state() {
        let f = fixture();
        let mut d = field(&f, 1);
        d.evaluate();
        let err = d.set_value(Value::Int(9)).unwrap_err();
        assert_eq!(err, WriteFault::NotWritable("Counter.id".to_string()));
        assert_eq!(d.state().value(), Some(&Value::Int(1)));
    }

    #[test]
    fn test_type_mismatch_keeps_state() {
        let f = fixture();
        let mut d = field(&f, 0);
        d.evaluate();
        assert!(matches!(
            d.set_value(Value::str("ten")),
            Err(WriteFault::TypeMismatch { .. })
        ));
        assert_eq!(d.state().value(), Some(&Value::Int(5)));
    }

    #[test]
    fn test_setter_coercion_is_read_back() {
        let f = fixture();
        let mut d = property(&f, 0);
        d.set_value(Value::Int(500)).unwrap();
        assert_eq!(d.state().value(), Some(&Value::Int(100)));
    }

    #[test]
    fn test_fault_recovers_when_condition_resolves() {
        let f = fixture();
        let mut d = property(&f, 1);
        assert_eq!(d.evaluate(), ValueKind::Faulted);
        let fault = d.state().fault().unwrap();
        assert!(fault.to_string().contains("NullReferenceException"));
        assert!(d.state().value().is_none());

        f.object.set("count", Value::Int(-3));
        assert_eq!(d.evaluate(), ValueKind::Number);
        assert_eq!(d.state().value(), Some(&Value::Int(3)));
        assert_eq!(d.evaluate(), ValueKind::Number);
    }

    #[test]
    fn test_method_requires_arguments() {
        let f = fixture();
        let mut d = method(&f);
        assert!(d.requires_arguments());
        assert!(d.accepts_text_arguments());
        assert!(!d.auto_evaluates());

        assert_eq!(d.evaluate(), ValueKind::Faulted);
        assert_eq!(d.state().fault().map(|e| e.type_name()), Some("ArgumentException"));

        d.set_argument_text(0, "7").unwrap();
        assert_eq!(d.evaluate(), ValueKind::Number);
        assert_eq!(d.state().value(), Some(&Value::Int(12)));
    }

    #[test]
    fn test_argument_validation() {
        let f = fixture();
        let mut d = method(&f);
        assert!(matches!(
            d.set_argument(3, Value::Int(1)),
            Err(ArgumentError::NoSuchParameter { index: 3, count: 1 })
        ));
        assert!(matches!(
            d.set_argument(0, Value::Bool(true)),
            Err(ArgumentError::TypeMismatch { .. })
        ));
        assert!(matches!(
            d.set_arguments(vec![]),
            Err(ArgumentError::Count { expected: 1, got: 0 })
        ));
        assert!(matches!(
            d.set_argument_text(0, "many"),
            Err(ArgumentError::Parse(_))
        ));
        d.set_arguments(vec![Value::UInt(2)]).unwrap();
        assert_eq!(d.arguments(), &[Some(Value::Int(2))]);
        d.clear_arguments();
        assert!(d.arguments().iter().all(Option::is_none));
    }

    #[test]
    fn test_invalidate() {
        let f = fixture();
        let mut d = field(&f, 0);
        d.evaluate();
        d.invalidate();
        assert!(d.state().is_not_evaluated());
    }
}
