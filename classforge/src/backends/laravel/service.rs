//! Service layer generation

use heck::ToLowerCamelCase;

use super::php::{ClassDecl, ClassKind, Method, Param, PhpFile, Visibility};
use super::repository::interface_name;
use super::{namespace, qualified};
use crate::backends::EmitContext;
use crate::ir::ResolvedModel;

pub(super) fn service_name(model: &ResolvedModel) -> String {
    format!("{}Service", model.name)
}

/// Generate the service class
///
/// The service owns lookups that must fail loudly and the persistence of
/// lifecycle transitions.
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> String {
    let name = &model.name;
    let var = model.name.to_lower_camel_case();

    let mut class = ClassDecl::new(ClassKind::Class, &service_name(model));
    class.methods.push(
        Method::public("__construct").param(Param::promoted(
            Visibility::Private,
            &interface_name(model),
            "repository",
        )),
    );
    class.methods.push(
        Method::public("list")
            .param(Param::new("array", "filters").with_default("[]"))
            .returns("Collection")
            .body(["return $this->repository->all($filters);"]),
    );
    class.methods.push(
        Method::public("get")
            .param(Param::new("int", "id"))
            .returns(name)
            .doc("@throws ModelNotFoundException")
            .body([
                format!("${} = $this->repository->find($id);", var),
                format!("if (${} === null) {{", var),
                format!(
                    "    throw (new ModelNotFoundException())->setModel({}::class, [$id]);",
                    name
                ),
                "}".to_string(),
                String::new(),
                format!("return ${};", var),
            ]),
    );
    class.methods.push(
        Method::public("create")
            .param(Param::new("array", "data"))
            .returns(name)
            .body(["return $this->repository->create($data);"]),
    );
    class.methods.push(
        Method::public("update")
            .param(Param::new("int", "id"))
            .param(Param::new("array", "data"))
            .returns(name)
            .body(["return $this->repository->update($this->get($id), $data);"]),
    );
    class.methods.push(
        Method::public("delete")
            .param(Param::new("int", "id"))
            .returns("void")
            .body(["$this->repository->delete($this->get($id));"]),
    );

    if let Some(contract) = &model.state {
        for transition in &contract.transitions {
            class.methods.push(
                Method::public(transition.name)
                    .param(Param::new("int", "id"))
                    .returns(name)
                    .doc("@throws DomainException")
                    .body([
                        format!("${} = $this->get($id);", var),
                        format!("${}->{}();", var, transition.name),
                        format!("${}->save();", var),
                        String::new(),
                        format!("return ${};", var),
                    ]),
            );
        }
    }

    PhpFile::new(Some(namespace(ctx, "Services")), class)
        .uses(qualified(ctx, "Models", name))
        .uses(qualified(ctx, "Repositories\\Contracts", &interface_name(model)))
        .uses("Illuminate\\Database\\Eloquent\\Collection")
        .uses("Illuminate\\Database\\Eloquent\\ModelNotFoundException")
        .render()
}
