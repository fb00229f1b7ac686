//! Converter contract and the base converter template that every
//! struct-shaped [`Reflect`] value falls back to.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::envelope::SerializedMember;
use crate::error::{Error, Result};
use crate::reflect::Reflect;
use crate::type_id::{TypeGraph, TypeKind};

/// Recursion bound.
pub const MAX_DEPTH: usize = 10_000;

/// Per-call registry of already-materialized instances, keyed by a caller-
/// chosen identity string, so a converter can register an instance before
/// its children are populated and let descendants resolve back-references.
/// This is explicitly not cycle detection.
#[derive(Default)]
pub struct InstanceContext {
    instances: HashMap<String, Box<dyn Reflect>>,
}

impl InstanceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, value: Box<dyn Reflect>) {
        self.instances.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Reflect> {
        self.instances.get(key).map(|b| b.as_ref())
    }
}

/// Reborrows `Option<&mut InstanceContext>` for a nested call without
/// moving the outer option, so the same context threads through a whole
/// field/element loop.
pub fn reborrow_ctx<'a>(ctx: &'a mut Option<&mut InstanceContext>) -> Option<&'a mut InstanceContext> {
    ctx.as_mut().map(|c| &mut **c)
}

/// Re-entry point converters use to recurse into children. Implemented by the top-level facade
/// ([`crate::facade::Serializer`]); converters only see this narrow
/// interface, not the full facade surface.
pub trait Engine {
    fn registry(&self) -> &crate::registry::ConverterRegistry;

    fn serialize_dyn(
        &self,
        value: &dyn Reflect,
        declared_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember>;

    fn deserialize_dyn(
        &self,
        envelope: &SerializedMember,
        fallback_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>>;

    fn populate_dyn(
        &self,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        fallback_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool>;

    /// `create_instance`, dispatched through whatever factory
    /// was registered for `type_name`.
    fn create_instance(&self, type_name: &str) -> Result<Box<dyn Reflect>>;

    fn kind_of(&self, type_name: &str) -> TypeKind;
}

/// A polymorphic handler implementing serialize/deserialize/populate for
/// one target type, or — for [`StructConverter`] — for a whole structural
/// category.
pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    /// The type this converter is declared to handle. The catch-all [`StructConverter`] returns `""` and
    /// overrides [`Converter::priority`] directly instead of relying on
    /// the distance formula.
    fn target_type_name(&self) -> &str;

    /// `priority(T)`: exact match scores `MAX_DEPTH + 1`,
    /// a derived/implementing type scores `MAX_DEPTH - distance`, an
    /// unrelated type scores 0.
    fn priority(&self, type_name: &str, graph: &TypeGraph) -> u32 {
        let target = self.target_type_name();
        if target.is_empty() {
            return 0;
        }
        if type_name == target {
            return MAX_DEPTH as u32 + 1;
        }
        let distance = graph.inheritance_distance(target, type_name);
        if distance >= 0 {
            (MAX_DEPTH as i64 - distance).max(0) as u32
        } else {
            0
        }
    }

    /// Cascade mode: true if this converter's JSON payload is
    /// itself an envelope to be interpreted rather than a raw scalar.
    fn cascade(&self) -> bool {
        false
    }

    /// Whether `populate` may replace the whole value from
    /// `valueJsonElement`.
    fn can_set_value(&self) -> bool {
        true
    }

    fn serialize_value(
        &self,
        engine: &dyn Engine,
        value: &dyn Reflect,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember>;

    fn deserialize_value(
        &self,
        engine: &dyn Engine,
        envelope: &SerializedMember,
        target_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>>;

    fn populate_value(
        &self,
        engine: &dyn Engine,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool>;
}

/// The base converter template for any [`Reflect`] value of
/// [`crate::reflect::ReflectKind::Struct`] shape: generic field/property
/// enumeration, getter-exception tolerance, and member-by-member
/// populate. One instance handles every struct type in the registry —
/// there is no per-type code generation.
#[derive(Debug, Default)]
pub struct StructConverter;

impl Converter for StructConverter {
    fn name(&self) -> &'static str {
        "struct"
    }

    fn target_type_name(&self) -> &str {
        ""
    }

    /// Lowest nonzero priority: any converter declared for a specific
    /// type outranks this fallback.
    fn priority(&self, _type_name: &str, _graph: &TypeGraph) -> u32 {
        1
    }

    fn cascade(&self) -> bool {
        true
    }

    fn can_set_value(&self) -> bool {
        false
    }

    fn serialize_value(
        &self,
        engine: &dyn Engine,
        value: &dyn Reflect,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<SerializedMember> {
        let type_name = value.type_name();
        if depth > MAX_DEPTH {
            return Err(Error::DepthExceeded(type_name, MAX_DEPTH));
        }

        let mut fields = Vec::new();
        for field_name in value.field_names() {
            match value.get_field(field_name) {
                Some(Ok(field_value)) => {
                    let declared = field_value.type_name();
                    let env = engine.serialize_dyn(field_value.as_ref(), &declared, depth + 1, diags)?;
                    fields.push(env.named(field_name));
                }
                Some(Err(message)) => diags.push(Diagnostic::GetterRaised {
                    type_name: type_name.clone(),
                    member_name: field_name.to_string(),
                    message,
                }),
                None => {}
            }
        }

        let mut props = Vec::new();
        for prop_name in value.property_names() {
            match value.get_property(prop_name) {
                Some(Ok(prop_value)) => {
                    let declared = prop_value.type_name();
                    let env = engine.serialize_dyn(prop_value.as_ref(), &declared, depth + 1, diags)?;
                    props.push(env.named(prop_name));
                }
                Some(Err(message)) => diags.push(Diagnostic::GetterRaised {
                    type_name: type_name.clone(),
                    member_name: prop_name.to_string(),
                    message,
                }),
                None => {}
            }
        }

        Ok(SerializedMember::complex(type_name, fields, props))
    }

    fn deserialize_value(
        &self,
        engine: &dyn Engine,
        envelope: &SerializedMember,
        target_type: &str,
        depth: usize,
        diags: &mut Diagnostics,
        mut ctx: Option<&mut InstanceContext>,
    ) -> Result<Box<dyn Reflect>> {
        if depth > MAX_DEPTH {
            return Err(Error::DepthExceeded(target_type.to_string(), MAX_DEPTH));
        }

        let mut instance = engine.create_instance(target_type)?;

        if let Some(ctx) = reborrow_ctx(&mut ctx) {
            ctx.register(target_type.to_string(), instance.clone_boxed());
        }

        for field_env in envelope.fields() {
            let Some(name) = field_env.name.as_deref() else { continue };
            match instance.get_field(name) {
                Some(_) => {
                    let declared = field_env
                        .type_name
                        .clone()
                        .unwrap_or_else(|| instance.type_name());
                    let value = engine.deserialize_dyn(
                        field_env,
                        &declared,
                        depth + 1,
                        diags,
                        reborrow_ctx(&mut ctx),
                    )?;
                    if let Some(Err(message)) = instance.set_field(name, value) {
                        return Err(Error::TypeMismatch {
                            expected: declared,
                            actual: message,
                        });
                    }
                }
                None => diags.push(Diagnostic::UnsupportedMember {
                    type_name: target_type.to_string(),
                    member_name: name.to_string(),
                    available: instance.field_names().iter().map(|s| s.to_string()).collect(),
                }),
            }
        }

        for prop_env in envelope.props() {
            let Some(name) = prop_env.name.as_deref() else { continue };
            match instance.get_property(name) {
                Some(_) if instance.is_property_writable(name) => {
                    let declared = prop_env
                        .type_name
                        .clone()
                        .unwrap_or_else(|| instance.type_name());
                    let value = engine.deserialize_dyn(
                        prop_env,
                        &declared,
                        depth + 1,
                        diags,
                        reborrow_ctx(&mut ctx),
                    )?;
                    if let Some(Err(message)) = instance.set_property(name, value) {
                        return Err(Error::TypeMismatch {
                            expected: declared,
                            actual: message,
                        });
                    }
                }
                Some(_) => diags.push(Diagnostic::ReadOnlyMember {
                    type_name: target_type.to_string(),
                    member_name: name.to_string(),
                }),
                None => diags.push(Diagnostic::UnsupportedMember {
                    type_name: target_type.to_string(),
                    member_name: name.to_string(),
                    available: instance.property_names().iter().map(|s| s.to_string()).collect(),
                }),
            }
        }

        Ok(instance)
    }

    fn populate_value(
        &self,
        engine: &dyn Engine,
        target: &mut dyn Reflect,
        envelope: &SerializedMember,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> Result<bool> {
        if depth > MAX_DEPTH {
            return Err(Error::DepthExceeded(target.type_name(), MAX_DEPTH));
        }
        let type_name = target.type_name();
        let mut overall = true;

        for field_env in envelope.fields() {
            let Some(name) = field_env.name.as_deref() else { continue };
            match target.get_field(name) {
                Some(Ok(mut current)) => {
                    let declared = field_env
                        .type_name
                        .clone()
                        .unwrap_or_else(|| current.type_name());
                    let success =
                        engine.populate_dyn(current.as_mut(), field_env, &declared, depth + 1, diags)?;
                    if success {
                        if let Some(Err(_)) = target.set_field(name, current) {
                            overall = false;
                        }
                    } else {
                        overall = false;
                    }
                }
                Some(Err(message)) => {
                    diags.push(Diagnostic::GetterRaised {
                        type_name: type_name.clone(),
                        member_name: name.to_string(),
                        message,
                    });
                    overall = false;
                }
                None => {
                    diags.push(Diagnostic::UnsupportedMember {
                        type_name: type_name.clone(),
                        member_name: name.to_string(),
                        available: target.field_names().iter().map(|s| s.to_string()).collect(),
                    });
                    overall = false;
                }
            }
        }

        for prop_env in envelope.props() {
            let Some(name) = prop_env.name.as_deref() else { continue };
            match target.get_property(name) {
                Some(_) if !target.is_property_writable(name) => {
                    diags.push(Diagnostic::ReadOnlyMember {
                        type_name: type_name.clone(),
                        member_name: name.to_string(),
                    });
                }
                Some(Ok(mut current)) => {
                    let declared = prop_env
                        .type_name
                        .clone()
                        .unwrap_or_else(|| current.type_name());
                    let success =
                        engine.populate_dyn(current.as_mut(), prop_env, &declared, depth + 1, diags)?;
                    if success {
                        if let Some(Err(_)) = target.set_property(name, current) {
                            overall = false;
                        }
                    } else {
                        overall = false;
                    }
                }
                Some(Err(message)) => {
                    diags.push(Diagnostic::GetterRaised {
                        type_name: type_name.clone(),
                        member_name: name.to_string(),
                        message,
                    });
                    overall = false;
                }
                None => {
                    diags.push(Diagnostic::UnsupportedMember {
                        type_name: type_name.clone(),
                        member_name: name.to_string(),
                        available: target.property_names().iter().map(|s| s.to_string()).collect(),
                    });
                    overall = false;
                }
            }
        }

        Ok(overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Serializer;
    use crate::reflect::Reflectable;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Widget {
        label: String,
        count: i32,
    }

    crate::reflect_struct! {
        struct Widget {
            label: String,
            count: i32,
        }
    }

    #[test]
    fn priority_scores_exact_match_above_the_ceiling() {
        let converter = crate::leaves::LeafConverter::<i32>::new(
            "i32",
            crate::leaves::primitive::i32_to_json,
            crate::leaves::primitive::i32_from_json,
        );
        let graph = TypeGraph::new();
        assert_eq!(converter.priority("i32", &graph), MAX_DEPTH as u32 + 1);
        assert_eq!(converter.priority("f64", &graph), 0);
    }

    #[test]
    fn struct_converter_has_lowest_nonzero_priority() {
        let graph = TypeGraph::new();
        assert_eq!(StructConverter.priority("AnythingAtAll", &graph), 1);
    }

    #[test]
    fn struct_converter_serialize_decomposes_into_named_fields() {
        let s = Serializer::new();
        s.register::<Widget>();
        let (env, diags) = s.serialize(&Widget { label: "gear".to_string(), count: 3 }).unwrap();
        assert_eq!(env.field("label").unwrap().value_json_element, Some(serde_json::json!("gear")));
        assert_eq!(env.field("count").unwrap().value_json_element, Some(serde_json::json!(3)));
        assert!(diags.is_empty());
    }

    #[test]
    fn struct_converter_deserialize_flags_an_unsupported_member() {
        let s = Serializer::new();
        s.register::<Widget>();
        let (mut env, _) = s.serialize(&Widget::default()).unwrap();
        env.fields.as_mut().unwrap().push(SerializedMember::scalar("i32", serde_json::json!(1)).named("ghost"));
        let (_, diags) = s.deserialize::<Widget>(&env).unwrap();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn instance_context_register_and_get_round_trip() {
        let mut ctx = InstanceContext::new();
        ctx.register("key", Box::new(Widget::default()) as Box<dyn Reflect>);
        assert_eq!(ctx.get("key").unwrap().type_name(), "Widget");
        assert!(ctx.get("missing").is_none());
    }
}
