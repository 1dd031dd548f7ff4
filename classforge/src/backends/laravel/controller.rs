//! Resource controller generation

use super::php::{ClassDecl, ClassKind, Method, Param, PhpFile, Visibility};
use super::request::request_name;
use super::service::service_name;
use super::{namespace, qualified};
use crate::backends::EmitContext;
use crate::ir::ResolvedModel;

/// Generate a JSON resource controller delegating to the service
///
/// Lifecycle transitions called from the wrong state answer 409.
pub fn generate(model: &ResolvedModel, ctx: &EmitContext<'_>) -> String {
    let request = request_name(model);
    let id = || Param::new("int", "id");

    let mut class =
        ClassDecl::new(ClassKind::Class, &format!("{}Controller", model.name)).extends("Controller");
    class.methods.push(Method::public("__construct").param(Param::promoted(
        Visibility::Private,
        &service_name(model),
        "service",
    )));
    class.methods.push(
        Method::public("index")
            .param(Param::new("Request", "request"))
            .returns("JsonResponse")
            .body(["return response()->json($this->service->list($request->query()));"]),
    );
    class.methods.push(
        Method::public("store")
            .param(Param::new(&request, "request"))
            .returns("JsonResponse")
            .body(["return response()->json($this->service->create($request->validated()), 201);"]),
    );
    class.methods.push(
        Method::public("show")
            .param(id())
            .returns("JsonResponse")
            .body(["return response()->json($this->service->get($id));"]),
    );
    class.methods.push(
        Method::public("update")
            .param(Param::new(&request, "request"))
            .param(id())
            .returns("JsonResponse")
            .body(["return response()->json($this->service->update($id, $request->validated()));"]),
    );
    class.methods.push(
        Method::public("destroy")
            .param(id())
            .returns("JsonResponse")
            .body([
                "$this->service->delete($id);",
                "",
                "return response()->json(null, 204);",
            ]),
    );

    let stateful = model.state.is_some();
    if let Some(contract) = &model.state {
        for transition in &contract.transitions {
            class.methods.push(
                Method::public(transition.name)
                    .param(id())
                    .returns("JsonResponse")
                    .body([
                        "try {".to_string(),
                        format!(
                            "    return response()->json($this->service->{}($id));",
                            transition.name
                        ),
                        "} catch (DomainException $e) {".to_string(),
                        "    return response()->json(['message' => $e->getMessage()], 409);"
                            .to_string(),
                        "}".to_string(),
                    ]),
            );
        }
    }

    let mut file = PhpFile::new(Some(namespace(ctx, "Http\\Controllers")), class)
        .uses(qualified(ctx, "Http\\Requests", &request))
        .uses(qualified(ctx, "Services", &service_name(model)))
        .uses("Illuminate\\Http\\JsonResponse")
        .uses("Illuminate\\Http\\Request");
    if stateful {
        file = file.uses("DomainException");
    }
    file.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flavor, GenerationConfig};
    use crate::diagnostics::Diagnostics;
    use crate::resolve::resolve;
    use crate::source::parse_document;
    use crate::types::TypeCatalog;

    fn render(source: &str, class: &str) -> String {
        let config = GenerationConfig::for_flavor(Flavor::Laravel);
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let set = resolve(&parse_document(source), &catalog, &mut Diagnostics::new());
        generate(set.model(class).unwrap(), &EmitContext::new(&config, &catalog))
    }

    #[test]
    fn test_resource_actions() {
        let php = render("class Order { total: decimal }", "Order");
        assert!(php.contains("class OrderController extends Controller"));
        assert!(php.contains("public function store(OrderRequest $request): JsonResponse"));
        assert!(php.contains("return response()->json($this->service->create($request->validated()), 201);"));
        assert!(php.contains("public function destroy(int $id): JsonResponse"));
        assert!(!php.contains("DomainException"));
    }

    #[test]
    fn test_transition_actions() {
        let php = render("class Account <<stateful>> { owner: string }", "Account");
        assert!(php.contains("public function suspend(int $id): JsonResponse"));
        assert!(php.contains("return response()->json(['message' => $e->getMessage()], 409);"));
        assert!(php.contains("use DomainException;"));
    }
}
