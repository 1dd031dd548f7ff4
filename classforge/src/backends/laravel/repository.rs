//! Repository interface and Eloquent repository generation

use heck::ToLowerCamelCase;

use super::php::{ClassDecl, ClassKind, Method, Param, PhpFile};
use super::{namespace, qualified};
use crate::backends::EmitContext;
use crate::ir::ResolvedModel;

pub(super) fn interface_name(model: &ResolvedModel) -> String {
    format!("{}RepositoryInterface", model.name)
}

pub(super) fn eloquent_name(model: &ResolvedModel) -> String {
    format!("Eloquent{}Repository", model.name)
}

/// The five data-access operations; `body == None` on the interface
fn operations(model: &ResolvedModel) -> Vec<Method> {
    let name = &model.name;
    let var = model.name.to_lower_camel_case();
    vec![
        Method::public("all")
            .param(Param::new("array", "filters").with_default("[]"))
            .returns("Collection"),
        Method::public("find")
            .param(Param::new("int", "id"))
            .returns(&format!("?{}", name)),
        Method::public("create")
            .param(Param::new("array", "attributes"))
            .returns(name),
        Method::public("update")
            .param(Param::new(name, &var))
            .param(Param::new("array", "attributes"))
            .returns(name),
        Method::public("delete")
            .param(Param::new(name, &var))
            .returns("bool"),
    ]
}

/// Generate the repository interface
pub fn generate_interface(model: &ResolvedModel, ctx: &EmitContext<'_>) -> String {
    let mut class = ClassDecl::new(ClassKind::Interface, &interface_name(model));
    class.methods = operations(model)
        .into_iter()
        .map(Method::signature_only)
        .collect();

    PhpFile::new(Some(namespace(ctx, "Repositories\\Contracts")), class)
        .uses(qualified(ctx, "Models", &model.name))
        .uses("Illuminate\\Database\\Eloquent\\Collection")
        .render()
}

/// Generate the Eloquent implementation of the repository interface
pub fn generate_eloquent(model: &ResolvedModel, ctx: &EmitContext<'_>) -> String {
    let name = &model.name;
    let var = model.name.to_lower_camel_case();
    let filter = format!("{}Filter", name);

    let bodies: [Vec<String>; 5] = [
        vec![format!(
            "return (new {}($filters))->apply({}::query())->get();",
            filter, name
        )],
        vec![format!("return {}::find($id);", name)],
        vec![format!("return {}::create($attributes);", name)],
        vec![
            format!("${}->fill($attributes)->save();", var),
            String::new(),
            format!("return ${}->refresh();", var),
        ],
        vec![format!("return (bool) ${}->delete();", var)],
    ];

    let mut class = ClassDecl::new(ClassKind::Class, &eloquent_name(model))
        .implements(&interface_name(model));
    class.methods = operations(model)
        .into_iter()
        .zip(bodies)
        .map(|(method, body)| method.body(body))
        .collect();

    PhpFile::new(Some(namespace(ctx, "Repositories")), class)
        .uses(qualified(ctx, "Filters", &filter))
        .uses(qualified(ctx, "Models", name))
        .uses(qualified(ctx, "Repositories\\Contracts", &interface_name(model)))
        .uses("Illuminate\\Database\\Eloquent\\Collection")
        .render()
}
