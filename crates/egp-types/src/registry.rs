// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The type registry: resolution, hierarchy queries and registry-checked
//! decoding.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::ept::{split_args, subtree_end, Ept};
use crate::error::TypeError;
use crate::typedef::{TypeDef, TypeKind};
use crate::uid::{TypeUid, WildcardOrigin};

/// Longest permitted type name.
pub const MAX_TYPE_NAME_LEN: usize = 128;

/// Read-only store of every [`TypeDef`], keyed by UID and by name.
///
/// Registration enforces that parents exist before children, which keeps the
/// parent/child relation a DAG. Once built the registry is only read, so a
/// single instance can be shared between threads behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    defs: FxHashMap<TypeUid, TypeDef>,
    by_name: FxHashMap<String, TypeUid>,
    order: Vec<TypeUid>,
}

/// One entry of the type compiler's JSON output.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TypeRecord {
    name: String,
    uid: TypeUid,
    kind: TypeKind,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template_type_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fixed_instance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wildcard_origin: Option<WildcardOrigin>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registers a definition and links it under its parents.
    ///
    /// # Errors
    /// [`TypeError::NameTooLong`], [`TypeError::DuplicateName`],
    /// [`TypeError::DuplicateUid`], [`TypeError::UidFieldMismatch`] or
    /// [`TypeError::UnknownParent`].
    pub fn register(&mut self, mut def: TypeDef) -> Result<TypeUid, TypeError> {
        let chars = def.name.chars().count();
        if chars == 0 || chars > MAX_TYPE_NAME_LEN {
            return Err(TypeError::NameTooLong(chars));
        }
        if self.by_name.contains_key(&def.name) {
            return Err(TypeError::DuplicateName(def.name));
        }
        if self.defs.contains_key(&def.uid) {
            return Err(TypeError::DuplicateUid(def.uid));
        }
        if def.template_type_count != def.uid.template_type_count() {
            return Err(mismatch(&def.name, "template_type_count"));
        }
        if def.wildcard_origin != def.uid.wildcard_origin() {
            return Err(mismatch(&def.name, "wildcard_origin"));
        }
        if def.fixed_instance != def.uid.fixed_instance() {
            return Err(mismatch(&def.name, "fixed_instance"));
        }
        if let Some(missing) = def.parents.iter().find(|p| !self.defs.contains_key(p)) {
            return Err(TypeError::UnknownParent {
                name: def.name,
                parent: missing.to_string(),
            });
        }
        def.children.clear();
        let uid = def.uid;
        for parent in &def.parents {
            if let Some(p) = self.defs.get_mut(parent) {
                p.children.insert(uid);
            }
        }
        self.by_name.insert(def.name.clone(), uid);
        self.defs.insert(uid, def);
        self.order.push(uid);
        Ok(uid)
    }

    /// Looks up a definition by UID.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeUid`] when not registered.
    pub fn resolve(&self, uid: TypeUid) -> Result<&TypeDef, TypeError> {
        self.defs.get(&uid).ok_or(TypeError::UnknownTypeUid(uid))
    }

    /// Looks up a definition by name.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeName`] when not registered.
    pub fn lookup(&self, name: &str) -> Result<&TypeDef, TypeError> {
        self.by_name
            .get(name)
            .and_then(|uid| self.defs.get(uid))
            .ok_or_else(|| TypeError::UnknownTypeName(name.to_owned()))
    }

    /// UID registered under `name`.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeName`] when not registered.
    pub fn uid_of(&self, name: &str) -> Result<TypeUid, TypeError> {
        self.lookup(name).map(|def| def.uid)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.order.iter().filter_map(|uid| self.defs.get(uid))
    }

    /// `true` when `ancestor` is a strict supertype of `uid`.
    pub fn is_ancestor(&self, ancestor: TypeUid, uid: TypeUid) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<TypeUid> = self
            .defs
            .get(&uid)
            .map(|d| d.parents.iter().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if next == ancestor {
                return true;
            }
            if seen.insert(next) {
                if let Some(def) = self.defs.get(&next) {
                    stack.extend(def.parents.iter().copied());
                }
            }
        }
        false
    }

    /// `true` when a value of type `src` may feed an end point of type `dst`.
    ///
    /// Compatible means equal, `dst` is a more abstract supertype of `src`
    /// (element-wise through template arguments), or `dst` is an output
    /// wildcard that will resolve from the source. A fixed-instance `dst`
    /// (`object1`..) matches whatever its family matches; binding all
    /// occurrences of the same index to one concrete type is an interface-level
    /// rule enforced by the graph.
    pub fn is_compatible(&self, src: &Ept, dst: &Ept) -> bool {
        src == dst || self.compatible_flat(src.flat(), dst.flat())
    }

    fn compatible_flat(&self, src: &[TypeUid], dst: &[TypeUid]) -> bool {
        let (s, d) = (src[0], dst[0]);
        if d.is_wildcard() {
            return true;
        }
        if !self.covers(d, s) {
            return false;
        }
        if dst.len() == 1 {
            return true;
        }
        let (src_args, dst_args) = (split_args(src), split_args(dst));
        src_args.len() == dst_args.len()
            && src_args
                .iter()
                .zip(&dst_args)
                .all(|(s, d)| self.compatible_flat(s, d))
    }

    fn covers(&self, dst: TypeUid, src: TypeUid) -> bool {
        if dst == src || self.is_ancestor(dst, src) {
            return true;
        }
        if dst.fixed_instance().is_some() {
            if let Some(def) = self.defs.get(&dst) {
                return def.parents.iter().any(|p| self.covers(*p, src));
            }
        }
        false
    }

    /// Decodes one EPT from a UID sequence, requiring every UID be registered
    /// and the sequence be consumed exactly.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeUid`] or [`TypeError::MalformedEpt`].
    pub fn decode(&self, uids: &[TypeUid]) -> Result<Ept, TypeError> {
        let (ept, used) = self.decode_prefix(uids)?;
        if used != uids.len() {
            return Err(TypeError::MalformedEpt(format!(
                "{} trailing uids after a complete type",
                uids.len() - used
            )));
        }
        Ok(ept)
    }

    /// Decodes the first EPT of a stream, returning it and the number of UIDs
    /// consumed.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeUid`] or [`TypeError::MalformedEpt`].
    pub fn decode_prefix(&self, uids: &[TypeUid]) -> Result<(Ept, usize), TypeError> {
        let end = subtree_end(uids, 0).ok_or_else(|| {
            TypeError::MalformedEpt(format!(
                "sequence of {} uids ends inside a template",
                uids.len()
            ))
        })?;
        for uid in &uids[..end] {
            let def = self.resolve(*uid)?;
            if def.template_type_count != uid.template_type_count() {
                return Err(mismatch(&def.name, "template_type_count"));
            }
        }
        Ok((Ept::from_flat(&uids[..end])?, end))
    }

    /// Decodes a whole interface stream into its EPTs.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeUid`] or [`TypeError::MalformedEpt`].
    pub fn decode_sequence(&self, uids: &[TypeUid]) -> Result<Vec<Ept>, TypeError> {
        let mut out = Vec::new();
        let mut rest = uids;
        while !rest.is_empty() {
            let (ept, used) = self.decode_prefix(rest)?;
            out.push(ept);
            rest = &rest[used..];
        }
        Ok(out)
    }

    /// Checks every UID of an EPT is registered.
    ///
    /// # Errors
    /// [`TypeError::UnknownTypeUid`].
    pub fn check(&self, ept: &Ept) -> Result<(), TypeError> {
        ept.flat()
            .iter()
            .try_for_each(|uid| self.resolve(*uid).map(|_| ()))
    }

    /// Replaces every output wildcard in `output` with the EPT it resolves to
    /// given the interface's `inputs`.
    ///
    /// A wildcard with origin `(p, d)` resolves to `inputs[p]` descended `d`
    /// times through its first template argument.
    ///
    /// # Errors
    /// [`TypeError::WildcardUnresolved`] when the position or depth does not
    /// exist.
    pub fn resolve_wildcards(&self, output: &Ept, inputs: &[Ept]) -> Result<Ept, TypeError> {
        if !output.has_wildcard() {
            return Ok(output.clone());
        }
        let flat = output.flat();
        let mut resolved = Vec::with_capacity(flat.len());
        let mut i = 0;
        while i < flat.len() {
            let uid = flat[i];
            match uid.wildcard_origin() {
                Some(origin) => {
                    let end = subtree_end(flat, i).unwrap_or(flat.len());
                    resolved.extend_from_slice(resolve_origin(origin, inputs)?);
                    i = end;
                }
                None => {
                    resolved.push(uid);
                    i += 1;
                }
            }
        }
        Ept::from_flat(&resolved)
    }

    /// Builds a registry from the type compiler's JSON output: an array of
    /// records listing parents by name, parents first.
    ///
    /// # Errors
    /// [`TypeError::Json`] for unreadable input, otherwise any
    /// [`TypeRegistry::register`] error.
    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        let records: Vec<TypeRecord> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for record in records {
            let mut def = TypeDef::new(record.uid, record.name, record.kind);
            if let Some(tt) = record.template_type_count {
                def.template_type_count = tt;
            }
            if record.fixed_instance.is_some() {
                def.fixed_instance = record.fixed_instance;
            }
            if record.wildcard_origin.is_some() {
                def.wildcard_origin = record.wildcard_origin;
            }
            for parent in &record.parents {
                let uid = registry
                    .by_name
                    .get(parent)
                    .copied()
                    .ok_or_else(|| TypeError::UnknownParent {
                        name: def.name.clone(),
                        parent: parent.clone(),
                    })?;
                def.parents.insert(uid);
            }
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Serialises the registry in the format read by
    /// [`TypeRegistry::from_json`].
    ///
    /// # Errors
    /// [`TypeError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, TypeError> {
        let records: Vec<TypeRecord> = self
            .iter()
            .map(|def| TypeRecord {
                name: def.name.clone(),
                uid: def.uid,
                kind: def.kind,
                parents: def
                    .parents
                    .iter()
                    .filter_map(|p| self.defs.get(p).map(|d| d.name.clone()))
                    .collect(),
                template_type_count: None,
                fixed_instance: None,
                wildcard_origin: None,
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

fn resolve_origin(origin: WildcardOrigin, inputs: &[Ept]) -> Result<&[TypeUid], TypeError> {
    let unresolved = || TypeError::WildcardUnresolved {
        position: origin.position,
        depth: origin.depth,
    };
    let mut flat = inputs
        .get(usize::from(origin.position))
        .map(Ept::flat)
        .ok_or_else(unresolved)?;
    for _ in 0..origin.depth {
        flat = split_args(flat).into_iter().next().ok_or_else(unresolved)?;
    }
    Ok(flat)
}

fn mismatch(name: &str, field: &'static str) -> TypeError {
    TypeError::UidFieldMismatch {
        name: name.to_owned(),
        field,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TYPES: &str = r#"[
        {"name": "object", "uid": 1, "kind": "abstract"},
        {"name": "Number", "uid": 2, "kind": "abstract", "parents": ["object"]},
        {"name": "int", "uid": 3, "kind": "concrete", "parents": ["Number"]},
        {"name": "float", "uid": 4, "kind": "concrete", "parents": ["Number"]},
        {"name": "str", "uid": 5, "kind": "concrete", "parents": ["object"]},
        {"name": "list", "uid": 268435462, "kind": "concrete", "parents": ["object"]},
        {"name": "object1", "uid": 16777223, "kind": "abstract", "parents": ["object"]}
    ]"#;

    fn registry() -> TypeRegistry {
        TypeRegistry::from_json(TYPES).unwrap()
    }

    fn scalar(reg: &TypeRegistry, name: &str) -> Ept {
        Ept::scalar(reg.uid_of(name).unwrap()).unwrap()
    }

    #[test]
    fn children_are_linked_on_registration() {
        let reg = registry();
        let number = reg.lookup("Number").unwrap();
        assert!(number.children.contains(&reg.uid_of("int").unwrap()));
        assert!(number.children.contains(&reg.uid_of("float").unwrap()));
        assert_eq!(reg.lookup("list").unwrap().template_type_count, 1);
        assert_eq!(reg.lookup("object1").unwrap().fixed_instance, Some(1));
    }

    #[test]
    fn ancestry_is_transitive_and_strict() {
        let reg = registry();
        let (object, int) = (reg.uid_of("object").unwrap(), reg.uid_of("int").unwrap());
        assert!(reg.is_ancestor(object, int));
        assert!(!reg.is_ancestor(int, object));
        assert!(!reg.is_ancestor(int, int));
    }

    #[test]
    fn abstract_destinations_accept_descendants() {
        let reg = registry();
        let (int, float, number, str_) = (
            scalar(&reg, "int"),
            scalar(&reg, "float"),
            scalar(&reg, "Number"),
            scalar(&reg, "str"),
        );
        assert!(reg.is_compatible(&int, &number));
        assert!(reg.is_compatible(&float, &number));
        assert!(!reg.is_compatible(&str_, &number));
        assert!(!reg.is_compatible(&number, &int));
        assert!(!reg.is_compatible(&int, &float));
    }

    #[test]
    fn containers_compare_element_wise() {
        let reg = registry();
        let list = reg.uid_of("list").unwrap();
        let list_int = Ept::new(list, [scalar(&reg, "int")]).unwrap();
        let list_num = Ept::new(list, [scalar(&reg, "Number")]).unwrap();
        let list_str = Ept::new(list, [scalar(&reg, "str")]).unwrap();
        assert!(reg.is_compatible(&list_int, &list_num));
        assert!(!reg.is_compatible(&list_str, &list_num));
        assert!(reg.is_compatible(&list_str, &scalar(&reg, "object")));
    }

    #[test]
    fn fixed_instance_matches_its_family() {
        let reg = registry();
        let object1 = scalar(&reg, "object1");
        assert!(reg.is_compatible(&scalar(&reg, "int"), &object1));
        assert!(reg.is_compatible(&scalar(&reg, "str"), &object1));
    }

    #[test]
    fn decode_requires_registered_uids() {
        let reg = registry();
        let unknown = TypeUid::new(0, None, 999).unwrap();
        assert!(matches!(
            reg.decode(&[unknown]),
            Err(TypeError::UnknownTypeUid(u)) if u == unknown
        ));
    }

    #[test]
    fn decode_sequence_splits_an_interface_stream() {
        let reg = registry();
        let list_int = Ept::new(reg.uid_of("list").unwrap(), [scalar(&reg, "int")]).unwrap();
        let epts = vec![scalar(&reg, "str"), list_int, scalar(&reg, "float")];
        let stream = crate::ept::encode_sequence(&epts);
        assert_eq!(reg.decode_sequence(&stream).unwrap(), epts);
    }

    #[test]
    fn wildcards_resolve_from_inputs() {
        let mut reg = registry();
        let origin = WildcardOrigin {
            position: 1,
            depth: 1,
        };
        let wild = reg
            .register(TypeDef::new(
                TypeUid::wildcard(0, origin).unwrap(),
                "Element1",
                TypeKind::Abstract,
            ))
            .unwrap();
        let list_float = Ept::new(reg.uid_of("list").unwrap(), [scalar(&reg, "float")]).unwrap();
        let inputs = vec![scalar(&reg, "int"), list_float];
        let out = Ept::scalar(wild).unwrap();
        assert_eq!(
            reg.resolve_wildcards(&out, &inputs).unwrap(),
            scalar(&reg, "float")
        );
        assert!(matches!(
            reg.resolve_wildcards(&out, &inputs[..1]),
            Err(TypeError::WildcardUnresolved { position: 1, depth: 1 })
        ));
    }

    #[test]
    fn registration_rejects_duplicates_and_orphans() {
        let mut reg = registry();
        let dup = TypeDef::new(TypeUid::new(0, None, 50).unwrap(), "int", TypeKind::Concrete);
        assert!(matches!(reg.register(dup), Err(TypeError::DuplicateName(_))));
        let orphan = TypeDef::new(TypeUid::new(0, None, 51).unwrap(), "orphan", TypeKind::Concrete)
            .with_parent(TypeUid::new(0, None, 52).unwrap());
        assert!(matches!(
            reg.register(orphan),
            Err(TypeError::UnknownParent { .. })
        ));
        let long = TypeDef::new(
            TypeUid::new(0, None, 53).unwrap(),
            "x".repeat(129),
            TypeKind::Concrete,
        );
        assert!(matches!(reg.register(long), Err(TypeError::NameTooLong(129))));
    }

    #[test]
    fn json_round_trips() {
        let reg = registry();
        let again = TypeRegistry::from_json(&reg.to_json().unwrap()).unwrap();
        assert_eq!(again.len(), reg.len());
        for def in reg.iter() {
            assert_eq!(again.resolve(def.uid).unwrap(), def);
        }
    }
}
