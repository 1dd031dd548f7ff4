//! Eloquent model generation

use std::collections::BTreeSet;

use heck::ToShoutySnakeCase;

use super::php::{ClassDecl, ClassKind, Constant, Method, PhpExpr, PhpFile, Property};
use super::{literal, namespace};
use crate::backends::{BackendError, EmitContext};
use crate::ir::ResolvedModel;
use crate::lifecycle::{STATUS_FIELD, State, StateContract, UPDATED_AT_FIELD};
use crate::relationship::{RelationKind, RelationshipRef};

const RELATIONS_NS: &str = "Illuminate\\Database\\Eloquent\\Relations";

/// Generate the Eloquent model for a resolved model
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> Result<String, BackendError> {
    let mut class = ClassDecl::new(ClassKind::Class, &model.name).extends("Model");
    class.traits.push("HasFactory".to_string());
    let mut uses = vec![
        "Illuminate\\Database\\Eloquent\\Model".to_string(),
        "Illuminate\\Database\\Eloquent\\Factories\\HasFactory".to_string(),
    ];

    if let Some(contract) = &model.state {
        class.constants = state_constants(contract);
    }

    class.properties.push(Property::protected(
        "connection",
        PhpExpr::str(&ctx.config.connection),
    ));
    class
        .properties
        .push(Property::protected("table", PhpExpr::str(&model.table_name)));
    class
        .properties
        .push(Property::protected("fillable", PhpExpr::str_list(fillable(model))));

    let casts: Vec<(String, PhpExpr)> = model
        .fields
        .iter()
        .map(|f| (f.name.clone(), ctx.catalog.cast_directive(f.canonical_type)))
        .filter(|(_, cast)| *cast != "string")
        .map(|(name, cast)| (name, PhpExpr::str(cast)))
        .collect();
    if !casts.is_empty() {
        class
            .properties
            .push(Property::protected("casts", PhpExpr::Map(casts)));
    }

    let eager = model.eager_accessors();
    if !eager.is_empty() {
        class
            .properties
            .push(Property::protected("with", PhpExpr::str_list(eager)));
    }

    let defaults = attribute_defaults(model)?;
    if !defaults.is_empty() {
        class
            .properties
            .push(Property::protected("attributes", PhpExpr::Map(defaults)));
    }

    let mut accessors = BTreeSet::new();
    for view in &model.relationships {
        if !accessors.insert(view.accessor()) {
            return Err(BackendError::CodeGenError(format!(
                "{} declares accessor '{}' twice",
                model.name,
                view.accessor()
            )));
        }
        let (method, relation_class) = relation_method(view)?;
        uses.push(format!("{}\\{}", RELATIONS_NS, relation_class));
        class.methods.push(method);
    }

    if let Some(contract) = &model.state {
        uses.push("DomainException".to_string());
        class.methods.extend(lifecycle_methods(contract));
    }

    let file = uses
        .into_iter()
        .fold(PhpFile::new(Some(namespace(ctx, "Models")), class), PhpFile::uses);
    Ok(file.render())
}

/// Constant name for a state, e.g. `STATUS_ACTIVE`
pub(super) fn state_constant(state: &State) -> String {
    format!("STATUS_{}", state.as_str().to_shouty_snake_case())
}

fn state_constants(contract: &StateContract) -> Vec<Constant> {
    let mut constants: Vec<Constant> = contract
        .states
        .iter()
        .map(|state| Constant {
            name: state_constant(state),
            value: PhpExpr::str(state.as_str()),
        })
        .collect();
    constants.push(Constant {
        name: "STATUSES".to_string(),
        value: PhpExpr::List(
            contract
                .states
                .iter()
                .map(|s| PhpExpr::raw(format!("self::{}", state_constant(s))))
                .collect(),
        ),
    });
    constants
}

/// Mass-assignable columns: declared fields and owned foreign keys
///
/// The lifecycle status only changes through transitions.
fn fillable(model: &ResolvedModel) -> Vec<String> {
    let mut columns: Vec<String> = model
        .fields
        .iter()
        .filter(|f| !f.is_status())
        .map(|f| f.name.clone())
        .collect();
    columns.extend(
        model
            .owned_foreign_keys()
            .filter_map(|v| v.foreign_key())
            .map(str::to_string),
    );
    columns
}

fn attribute_defaults(model: &ResolvedModel) -> Result<Vec<(String, PhpExpr)>, BackendError> {
    let mut defaults = Vec::new();
    for field in &model.fields {
        if field.is_status() {
            if let Some(contract) = &model.state {
                defaults.push((
                    STATUS_FIELD.to_string(),
                    PhpExpr::raw(format!("self::{}", state_constant(&contract.initial_state()))),
                ));
            }
            continue;
        }
        if let Some(value) = field.default_value() {
            defaults.push((
                field.name.clone(),
                PhpExpr::raw(literal(field.canonical_type, value)?),
            ));
        }
    }
    Ok(defaults)
}

fn relation_method(view: &RelationshipRef) -> Result<(Method, &'static str), BackendError> {
    let related = view.related_class();
    let missing_key = || {
        BackendError::CodeGenError(format!(
            "relationship accessor '{}' has no key column",
            view.accessor()
        ))
    };

    let (call, relation_class) = match view.kind() {
        RelationKind::HasOne => (
            format!(
                "return $this->hasOne({}::class, '{}');",
                related,
                view.foreign_key().ok_or_else(missing_key)?
            ),
            "HasOne",
        ),
        RelationKind::HasMany => (
            format!(
                "return $this->hasMany({}::class, '{}');",
                related,
                view.foreign_key().ok_or_else(missing_key)?
            ),
            "HasMany",
        ),
        RelationKind::BelongsTo => (
            format!(
                "return $this->belongsTo({}::class, '{}');",
                related,
                view.foreign_key().ok_or_else(missing_key)?
            ),
            "BelongsTo",
        ),
        RelationKind::BelongsToMany => {
            let table = view.join_table().ok_or_else(missing_key)?;
            let (own, other) = view.pivot_columns().ok_or_else(missing_key)?;
            (
                format!(
                    "return $this->belongsToMany({}::class, '{}', '{}', '{}');",
                    related, table, own, other
                ),
                "BelongsToMany",
            )
        }
    };

    let method = Method::public(view.accessor())
        .returns(relation_class)
        .body([call]);
    Ok((method, relation_class))
}

fn lifecycle_methods(contract: &StateContract) -> Vec<Method> {
    let mut methods = Vec::new();

    for transition in &contract.transitions {
        methods.push(Method::public(transition.guard).returns("bool").body([format!(
            "return $this->{} === self::{};",
            STATUS_FIELD,
            state_constant(&transition.from)
        )]));
    }

    for transition in &contract.transitions {
        let from = state_constant(&transition.from);
        let to = state_constant(&transition.to);
        methods.push(
            Method::public(transition.name)
                .doc(format!("Transition {} -> {}", transition.from, transition.to))
                .doc("")
                .doc(format!("@throws DomainException when the model is not {}", transition.from))
                .returns("void")
                .body([
                    format!("if (! $this->{}()) {{", transition.guard),
                    "    throw new DomainException(sprintf(".to_string(),
                    format!(
                        "        'Cannot {} %s from state %s; expected %s',",
                        transition.name
                    ),
                    "        static::class,".to_string(),
                    format!("        $this->{},", STATUS_FIELD),
                    format!("        self::{}", from),
                    "    ));".to_string(),
                    "}".to_string(),
                    String::new(),
                    format!("$this->{} = self::{};", STATUS_FIELD, to),
                    format!("$this->{} = $this->freshTimestamp();", UPDATED_AT_FIELD),
                ]),
        );
    }

    methods
}
