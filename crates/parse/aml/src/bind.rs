//! Post-parse symbol binding.
//!
//! While a table is being decoded, forward references cannot be resolved:
//! a `Field` may name a region declared later in the table, and a method can
//! be invoked before its definition has been seen. The scanner therefore
//! records such references by name, and once the whole table is in the
//! namespace [`bind_namespace`] resolves them in a single pass.
//!
//! Binding is all-or-nothing per entity: every lookup an entity needs is
//! performed before any of its reference fields are written. The pass stops
//! at the first failure and the table must be treated as unusable.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::entity::{EntityId, EntityKind, EntityType};
use crate::namespace::Namespace;

/// The reference slot a symbol is bound into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    /// The operation region of a `Field`.
    FieldRegion,
    /// The index register of an `IndexField`.
    IndexRegister,
    /// The data register of an `IndexField`.
    DataRegister,
    /// The operation region of a `BankField`.
    BankRegion,
    /// The bank selector register of a `BankField`.
    BankRegister,
    /// The `Connection()` resource of a field unit.
    Connection,
    /// The target of a name reference.
    ReferenceTarget,
    /// The definition of an invoked method.
    MethodDefinition,
}

impl fmt::Display for SymbolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FieldRegion => "field region",
            Self::IndexRegister => "index register",
            Self::DataRegister => "data register",
            Self::BankRegion => "bank field region",
            Self::BankRegister => "bank register field",
            Self::Connection => "connection",
            Self::ReferenceTarget => "symbol",
            Self::MethodDefinition => "method",
        })
    }
}

/// Why a symbol could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindErrorKind {
    /// No entity with that name is reachable from the referencing scope.
    Unresolved,
    /// The name resolved, but to an entity of the wrong kind.
    KindMismatch {
        /// Kind the reference slot requires.
        expected: EntityType,
        /// Kind of the entity the name resolved to.
        found: EntityType,
    },
}

/// A symbol reference that could not be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    /// The slot being bound.
    pub role: SymbolRole,
    /// The name as written in the table.
    pub symbol: String,
    /// The entity holding the reference.
    pub entity: EntityId,
    /// What went wrong.
    pub kind: BindErrorKind,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BindErrorKind::Unresolved => {
                write!(f, "could not resolve referenced {}: {}", self.role, self.symbol)
            }
            BindErrorKind::KindMismatch { expected, found } => write!(
                f,
                "referenced {} {} is a {found}, expected a {expected}",
                self.role, self.symbol
            ),
        }
    }
}

/// Resolved references for one entity, computed before any are stored.
enum Binding {
    None,
    Field { region: EntityId },
    IndexField { index_reg: EntityId, data_reg: EntityId },
    BankField { region: EntityId, bank_reg: EntityId },
    Connection(EntityId),
    Target(EntityId),
    Method(EntityId),
}

/// Lookup context for a single entity.
struct Resolver<'a> {
    ns: &'a Namespace,
    scope: EntityId,
    entity: EntityId,
}

impl Resolver<'_> {
    fn lookup(
        &self,
        role: SymbolRole,
        symbol: &str,
        expected: Option<EntityType>,
    ) -> Result<EntityId, BindError> {
        let error = |kind| BindError {
            role,
            symbol: String::from(symbol),
            entity: self.entity,
            kind,
        };

        let found = self
            .ns
            .find(self.scope, symbol)
            .ok_or_else(|| error(BindErrorKind::Unresolved))?;
        match expected {
            Some(expected) if self.ns[found].entity_type() != expected => {
                Err(error(BindErrorKind::KindMismatch {
                    expected,
                    found: self.ns[found].entity_type(),
                }))
            }
            _ => Ok(found),
        }
    }

    fn resolve(&self, kind: &EntityKind) -> Result<Binding, BindError> {
        use SymbolRole as R;

        let binding = match kind {
            EntityKind::Field(f) => Binding::Field {
                region: self.lookup(R::FieldRegion, &f.region_name, Some(EntityType::Region))?,
            },
            EntityKind::IndexField(f) => Binding::IndexField {
                index_reg: self.lookup(
                    R::IndexRegister,
                    &f.index_reg_name,
                    Some(EntityType::FieldUnit),
                )?,
                data_reg: self.lookup(
                    R::DataRegister,
                    &f.data_reg_name,
                    Some(EntityType::FieldUnit),
                )?,
            },
            EntityKind::BankField(f) => Binding::BankField {
                region: self.lookup(R::BankRegion, &f.region_name, Some(EntityType::Region))?,
                bank_reg: self.lookup(
                    R::BankRegister,
                    &f.bank_reg_name,
                    Some(EntityType::FieldUnit),
                )?,
            },
            EntityKind::FieldUnit(unit) => match &unit.connection_name {
                Some(name) => Binding::Connection(self.lookup(R::Connection, name, None)?),
                None => Binding::None,
            },
            EntityKind::Reference(r) => {
                Binding::Target(self.lookup(R::ReferenceTarget, &r.target_name, None)?)
            }
            EntityKind::Invocation(inv) => Binding::Method(self.lookup(
                R::MethodDefinition,
                &inv.method_name,
                Some(EntityType::Method),
            )?),
            _ => Binding::None,
        };
        Ok(binding)
    }
}

fn apply(kind: &mut EntityKind, binding: Binding) {
    match (kind, binding) {
        (EntityKind::Field(f), Binding::Field { region }) => f.region = Some(region),
        (EntityKind::IndexField(f), Binding::IndexField { index_reg, data_reg }) => {
            f.index_reg = Some(index_reg);
            f.data_reg = Some(data_reg);
        }
        (EntityKind::BankField(f), Binding::BankField { region, bank_reg }) => {
            f.region = Some(region);
            f.bank_reg = Some(bank_reg);
        }
        (EntityKind::FieldUnit(unit), Binding::Connection(target)) => {
            unit.connection = Some(target);
        }
        (EntityKind::Reference(r), Binding::Target(target)) => r.target = Some(target),
        (EntityKind::Invocation(inv), Binding::Method(method)) => inv.method = Some(method),
        _ => {}
    }
}

/// Resolves the deferred symbol references of a single entity.
///
/// Lookups follow the namespace search rules starting at the entity's
/// [lexical scope](Namespace::lexical_scope): its parent, the scope of the
/// entity holding it as an operand, or the root for an orphan. Entities
/// without deferred references, and field units without a connection, bind
/// trivially.
///
/// # Errors
///
/// Returns a [`BindError`] if any referenced name cannot be found or
/// resolves to an entity of the wrong kind. A line describing the failure is
/// also written to `diag`, and none of the entity's references are set.
pub fn resolve_symbol_refs<W>(
    diag: &mut W,
    ns: &mut Namespace,
    id: EntityId,
) -> Result<(), BindError>
where
    W: fmt::Write + ?Sized,
{
    let scope = ns.lexical_scope(id);
    bind_in_scope(diag, ns, id, scope)
}

fn bind_in_scope<W>(
    diag: &mut W,
    ns: &mut Namespace,
    id: EntityId,
    scope: EntityId,
) -> Result<(), BindError>
where
    W: fmt::Write + ?Sized,
{
    let Some(entity) = ns.get(id) else {
        log::warn!("aml: bind requested for unknown entity {id}");
        return Ok(());
    };

    let ty = entity.entity_type();
    let resolver = Resolver { ns: &*ns, scope, entity: id };

    match resolver.resolve(entity.kind()) {
        Ok(binding) => {
            apply(ns[id].kind_mut(), binding);
            Ok(())
        }
        Err(err) => {
            // Terms are anonymous and detached; report them at their scope.
            let path = if entity.parent().is_some() {
                ns.path_of(id)
            } else {
                ns.path_of(scope)
            };
            if writeln!(diag, "[{ty} {path}] {err}").is_err() {
                log::debug!("aml: diagnostic sink rejected bind error");
            }
            log::warn!("aml: [{ty} {path}] {err}");
            Err(err)
        }
    }
}

/// Binds every deferred reference in the namespace.
///
/// Walks the tree from the root in pre-order. Each entity is followed by
/// the term entities it holds as operands, which bind in the scope of the
/// entity that holds them. Every one that carries deferred references goes
/// through [`resolve_symbol_refs`]. Returns the number of entities bound.
///
/// # Errors
///
/// Stops at and returns the first [`BindError`].
pub fn bind_namespace<W>(diag: &mut W, ns: &mut Namespace) -> Result<usize, BindError>
where
    W: fmt::Write + ?Sized,
{
    let pending = pending_bindings(ns);
    for &(id, scope) in &pending {
        bind_in_scope(diag, ns, id, scope)?;
    }

    log::debug!("aml: bound {} symbol references", pending.len());
    Ok(pending.len())
}

/// Entities needing binding, each with the scope it binds in.
fn pending_bindings(ns: &Namespace) -> Vec<(EntityId, EntityId)> {
    let mut seen = alloc::vec![false; ns.entity_count()];
    let mut pending = Vec::new();
    let mut stack = Vec::new();

    for id in ns.walk(ns.root()) {
        let scope = ns.parent(id).unwrap_or(id);
        stack.push(id);
        while let Some(current) = stack.pop() {
            if core::mem::replace(&mut seen[current.as_usize()], true) {
                continue;
            }
            let kind = ns[current].kind();
            if kind.needs_binding() {
                pending.push((current, scope));
            }
            // Attached operands are reached by the walk itself.
            let terms = kind
                .terms()
                .filter(|&t| ns.get(t).is_some_and(|e| e.parent().is_none()));
            let mark = stack.len();
            stack.extend(terms);
            stack[mark..].reverse();
        }
    }
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, TableHandle};
    use crate::opcode::AmlOpcode;
    use crate::path::NameSeg;
    use crate::value::AmlArg;

    const TABLE: TableHandle = TableHandle::new(1);

    fn seg(s: &str) -> NameSeg {
        s.parse().unwrap()
    }

    fn with_args(mut entity: Entity, args: Vec<AmlArg>) -> Entity {
        for (i, arg) in args.into_iter().enumerate() {
            assert!(entity.set_arg(i as u8, arg));
        }
        entity
    }

    fn region(name: &str) -> Entity {
        let args = vec![name.into(), AmlArg::Integer(1), AmlArg::Integer(0x80), AmlArg::Integer(4)];
        with_args(Entity::region(TABLE), args)
    }

    fn field(region_name: &str) -> Entity {
        with_args(Entity::field(TABLE), vec![region_name.into(), AmlArg::Integer(1)])
    }

    fn connected_unit(name: &str, connection: &str) -> Entity {
        let mut unit = Entity::field_unit(TABLE, seg(name));
        let u = unit.field_unit_mut().unwrap();
        u.connection_name = Some(connection.into());
        unit
    }

    /// `\_SB_.PCI0` with an empty device underneath.
    fn base() -> (Namespace, EntityId, EntityId) {
        let mut ns = Namespace::new();
        let root = ns.root();
        let sb = ns.add(root, Entity::scope(TABLE, seg("_SB_"))).unwrap();
        let pci = ns.add(sb, Entity::device(TABLE, seg("PCI0"))).unwrap();
        (ns, sb, pci)
    }

    #[test]
    fn field_with_missing_region_fails() {
        let (mut ns, _, pci) = base();
        let fld = ns.add(pci, field("REG0")).unwrap();
        let mut diag = String::new();

        let err = resolve_symbol_refs(&mut diag, &mut ns, fld).unwrap_err();
        assert_eq!(err.role, SymbolRole::FieldRegion);
        assert_eq!(err.symbol, "REG0");
        assert_eq!(err.entity, fld);
        assert_eq!(err.kind, BindErrorKind::Unresolved);

        let EntityKind::Field(f) = ns[fld].kind() else { panic!("not a field") };
        assert_eq!(f.region(), None);
        assert_eq!(
            diag,
            "[Field \\_SB_.PCI0] could not resolve referenced field region: REG0\n"
        );
    }

    #[test]
    fn field_region_found_by_search_rule() {
        let (mut ns, sb, pci) = base();
        let reg = ns.add(sb, region("REG0")).unwrap();
        let fld = ns.add(pci, field("REG0")).unwrap();
        let mut diag = String::new();

        resolve_symbol_refs(&mut diag, &mut ns, fld).unwrap();
        let EntityKind::Field(f) = ns[fld].kind() else { panic!("not a field") };
        assert_eq!(f.region(), Some(reg));
        assert!(diag.is_empty());
    }

    #[test]
    fn field_region_must_be_a_region() {
        let (mut ns, sb, pci) = base();
        ns.add(sb, Entity::device(TABLE, seg("REG0"))).unwrap();
        let fld = ns.add(pci, field("REG0")).unwrap();

        let err = resolve_symbol_refs(&mut String::new(), &mut ns, fld).unwrap_err();
        assert_eq!(
            err.kind,
            BindErrorKind::KindMismatch {
                expected: EntityType::Region,
                found: EntityType::Device,
            }
        );
    }

    #[test]
    fn field_unit_without_connection_binds() {
        let (mut ns, _, pci) = base();
        let unit = ns.add(pci, Entity::field_unit(TABLE, seg("FLD0"))).unwrap();
        let mut diag = String::new();

        resolve_symbol_refs(&mut diag, &mut ns, unit).unwrap();
        let EntityKind::FieldUnit(u) = ns[unit].kind() else { panic!("not a field unit") };
        assert_eq!(u.connection(), None);
        assert!(diag.is_empty());
    }

    #[test]
    fn field_unit_connection_accepts_any_kind() {
        let (mut ns, sb, pci) = base();
        let gpio = ns.add(sb, Entity::device(TABLE, seg("GPI0"))).unwrap();
        let unit = ns.add(pci, connected_unit("FLD0", "\\_SB_.GPI0")).unwrap();

        resolve_symbol_refs(&mut String::new(), &mut ns, unit).unwrap();
        let EntityKind::FieldUnit(u) = ns[unit].kind() else { panic!("not a field unit") };
        assert_eq!(u.connection(), Some(gpio));
    }

    #[test]
    fn field_unit_missing_connection_fails() {
        let (mut ns, _, pci) = base();
        let unit = ns.add(pci, connected_unit("FLD0", "GPI0")).unwrap();
        let mut diag = String::new();

        let err = resolve_symbol_refs(&mut diag, &mut ns, unit).unwrap_err();
        assert_eq!(err.role, SymbolRole::Connection);
        assert_eq!(
            diag,
            "[FieldUnit \\_SB_.PCI0.FLD0] could not resolve referenced connection: GPI0\n"
        );
    }

    #[test]
    fn invocation_of_device_is_a_kind_mismatch() {
        let (mut ns, _, pci) = base();
        let mth = ns.add(pci, Entity::method(TABLE, seg("_INI"))).unwrap();
        ns.add(pci, Entity::device(TABLE, seg("FOO0"))).unwrap();
        let call = ns.add(mth, Entity::invocation(TABLE, "FOO0")).unwrap();
        let mut diag = String::new();

        let err = resolve_symbol_refs(&mut diag, &mut ns, call).unwrap_err();
        assert_eq!(err.role, SymbolRole::MethodDefinition);
        assert_eq!(
            err.kind,
            BindErrorKind::KindMismatch {
                expected: EntityType::Method,
                found: EntityType::Device,
            }
        );
        let EntityKind::Invocation(inv) = ns[call].kind() else { panic!("not an invocation") };
        assert_eq!(inv.method(), None);
        assert_eq!(
            diag,
            "[Invocation \\_SB_.PCI0._INI] referenced method FOO0 is a Device, expected a Method\n"
        );
    }

    #[test]
    fn invocation_binds_method() {
        let (mut ns, _, pci) = base();
        let ini = ns.add(pci, Entity::method(TABLE, seg("_INI"))).unwrap();
        let sta = ns.add(pci, Entity::method(TABLE, seg("_STA"))).unwrap();
        let call = ns.add(ini, Entity::invocation(TABLE, "^_STA")).unwrap();

        resolve_symbol_refs(&mut String::new(), &mut ns, call).unwrap();
        let EntityKind::Invocation(inv) = ns[call].kind() else { panic!("not an invocation") };
        assert_eq!(inv.method(), Some(sta));
    }

    #[test]
    fn index_field_binds_both_registers() {
        let (mut ns, _, pci) = base();
        let idx = ns.add(pci, Entity::field_unit(TABLE, seg("IDX0"))).unwrap();
        let dat = ns.add(pci, Entity::field_unit(TABLE, seg("DAT0"))).unwrap();
        let args = vec!["IDX0".into(), "DAT0".into(), AmlArg::Integer(0)];
        let fld = ns.add(pci, with_args(Entity::index_field(TABLE), args)).unwrap();

        resolve_symbol_refs(&mut String::new(), &mut ns, fld).unwrap();
        let EntityKind::IndexField(f) = ns[fld].kind() else { panic!("not an index field") };
        assert_eq!(f.index_reg(), Some(idx));
        assert_eq!(f.data_reg(), Some(dat));
    }

    #[test]
    fn partial_failure_binds_nothing() {
        let (mut ns, _, pci) = base();
        ns.add(pci, Entity::field_unit(TABLE, seg("IDX0"))).unwrap();
        let args = vec!["IDX0".into(), "DAT0".into(), AmlArg::Integer(0)];
        let fld = ns.add(pci, with_args(Entity::index_field(TABLE), args)).unwrap();

        let err = resolve_symbol_refs(&mut String::new(), &mut ns, fld).unwrap_err();
        assert_eq!(err.role, SymbolRole::DataRegister);
        let EntityKind::IndexField(f) = ns[fld].kind() else { panic!("not an index field") };
        assert_eq!(f.index_reg(), None);
        assert_eq!(f.data_reg(), None);
    }

    #[test]
    fn bank_field_binds_region_and_register() {
        let (mut ns, sb, pci) = base();
        let reg = ns.add(sb, region("REG0")).unwrap();
        let bnk = ns.add(pci, Entity::field_unit(TABLE, seg("BNK0"))).unwrap();
        let args = vec!["REG0".into(), "BNK0".into(), AmlArg::Integer(1), AmlArg::Integer(0)];
        let fld = ns.add(pci, with_args(Entity::bank_field(TABLE), args)).unwrap();

        resolve_symbol_refs(&mut String::new(), &mut ns, fld).unwrap();
        let EntityKind::BankField(f) = ns[fld].kind() else { panic!("not a bank field") };
        assert_eq!(f.region(), Some(reg));
        assert_eq!(f.bank_reg(), Some(bnk));
    }

    #[test]
    fn detached_reference_resolves_from_root() {
        let (mut ns, sb, _) = base();
        let orphan = ns.insert(Entity::reference(TABLE, "_SB_"));

        resolve_symbol_refs(&mut String::new(), &mut ns, orphan).unwrap();
        let EntityKind::Reference(r) = ns[orphan].kind() else { panic!("not a reference") };
        assert_eq!(r.target(), Some(sb));
    }

    /// `Method (_INI) { Store (<call>, Local0) }` next to `_STA` under PCI0.
    fn store_in_ini(ns: &mut Namespace, pci: EntityId, call: Entity) -> (EntityId, EntityId) {
        let ini = ns.add(pci, Entity::method(TABLE, seg("_INI"))).unwrap();
        let call = ns.insert(call);
        let store = Entity::generic(AmlOpcode::STORE, TABLE);
        let store = with_args(store, vec![AmlArg::Entity(call), AmlArg::Integer(0)]);
        ns.add(ini, store).unwrap();
        (ini, call)
    }

    #[test]
    fn nested_invocation_binds_in_owner_scope() {
        let (mut ns, _, pci) = base();
        let sta = ns.add(pci, Entity::method(TABLE, seg("_STA"))).unwrap();
        let (ini, call) = store_in_ini(&mut ns, pci, Entity::invocation(TABLE, "_STA"));
        assert_eq!(ns.parent(call), None);
        assert_eq!(ns.lexical_scope(call), ini);

        resolve_symbol_refs(&mut String::new(), &mut ns, call).unwrap();
        let EntityKind::Invocation(inv) = ns[call].kind() else { panic!("not an invocation") };
        assert_eq!(inv.method(), Some(sta));
    }

    #[test]
    fn bind_namespace_descends_into_operand_terms() {
        let (mut ns, _, pci) = base();
        let sta = ns.add(pci, Entity::method(TABLE, seg("_STA"))).unwrap();
        // Store (_STA (_STA), Local0)
        let inner = ns.insert(Entity::reference(TABLE, "_STA"));
        let outer = with_args(Entity::invocation(TABLE, "_STA"), vec![AmlArg::Entity(inner)]);
        let (_, outer_id) = store_in_ini(&mut ns, pci, outer);

        assert_eq!(bind_namespace(&mut String::new(), &mut ns), Ok(2));
        let EntityKind::Invocation(inv) = ns[outer_id].kind() else { panic!("not an invocation") };
        assert_eq!(inv.method(), Some(sta));
        let EntityKind::Reference(r) = ns[inner].kind() else { panic!("not a reference") };
        assert_eq!(r.target(), Some(sta));
    }

    #[test]
    fn nested_term_failure_reports_owner_scope() {
        let (mut ns, _, pci) = base();
        let (_, call) = store_in_ini(&mut ns, pci, Entity::invocation(TABLE, "_OFF"));
        let mut diag = String::new();

        let err = bind_namespace(&mut diag, &mut ns).unwrap_err();
        assert_eq!(err.entity, call);
        assert_eq!(err.role, SymbolRole::MethodDefinition);
        assert_eq!(
            diag,
            "[Invocation \\_SB_.PCI0._INI] could not resolve referenced method: _OFF\n"
        );
    }

    #[test]
    fn entities_without_references_bind_trivially() {
        let (mut ns, sb, pci) = base();
        let mut diag = String::new();
        for id in [ns.root(), sb, pci] {
            resolve_symbol_refs(&mut diag, &mut ns, id).unwrap();
        }
        assert!(diag.is_empty());
    }

    #[test]
    fn bind_namespace_counts_and_stops_at_first_failure() {
        let (mut ns, sb, pci) = base();
        ns.add(sb, region("REG0")).unwrap();
        ns.add(pci, field("REG0")).unwrap();
        ns.add(pci, Entity::reference(TABLE, "\\_SB_.PCI0")).unwrap();
        ns.add(pci, Entity::field_unit(TABLE, seg("FLD0"))).unwrap();
        assert_eq!(bind_namespace(&mut String::new(), &mut ns), Ok(2));

        let bad = ns.add(sb, Entity::reference(TABLE, "NOPE")).unwrap();
        let late = ns.add(pci, Entity::reference(TABLE, "_SB_")).unwrap();
        let err = bind_namespace(&mut String::new(), &mut ns).unwrap_err();
        assert_eq!(err.entity, bad);
        assert_eq!(err.symbol, "NOPE");
        // The PCI0 subtree is visited before the failing reference.
        let EntityKind::Reference(r) = ns[late].kind() else { panic!("not a reference") };
        assert!(r.target().is_some());
    }

    #[test]
    fn error_display() {
        let err = BindError {
            role: SymbolRole::ReferenceTarget,
            symbol: "FOO".into(),
            entity: EntityId::from_index(3),
            kind: BindErrorKind::Unresolved,
        };
        assert_eq!(format!("{err}"), "could not resolve referenced symbol: FOO");
    }
}
