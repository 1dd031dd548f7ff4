//! Form request generation

use super::php::{ClassDecl, ClassKind, Method, PhpExpr, PhpFile, quote};
use super::namespace;
use crate::backends::{BackendError, EmitContext};
use crate::ir::ResolvedModel;
use crate::plan::{Rule, ValidationPlan};

pub(super) fn request_name(model: &ResolvedModel) -> String {
    format!("{}Request", model.name)
}

/// Generate the form request validating create and update payloads
///
/// Required fields are only enforced on create; updates accept partial
/// payloads.
pub fn generate(
    model: &ResolvedModel,
    plan: &ValidationPlan,
    ctx: &EmitContext<'_>,
) -> Result<String, BackendError> {
    let mut rules = Vec::with_capacity(plan.fields.len());
    let mut messages = Vec::new();
    let mut uses_rule_class = false;

    for field in &plan.fields {
        let mut list = Vec::with_capacity(field.rules.len());
        for rule in &field.rules {
            uses_rule_class |= matches!(rule, Rule::Unique { .. } | Rule::In { .. });
            list.push(rule_expr(rule)?);
        }
        rules.push((field.field.clone(), PhpExpr::List(list)));
        for (key, message) in &field.messages {
            messages.push((format!("{}.{}", field.field, key), PhpExpr::str(message)));
        }
    }

    let mut class = ClassDecl::new(ClassKind::Class, &request_name(model)).extends("FormRequest");
    class.methods.push(
        Method::public("authorize")
            .returns("bool")
            .body(["return true;"]),
    );

    let mut body = vec![
        "$presence = $this->isMethod('POST') ? 'required' : 'sometimes';".to_string(),
        String::new(),
    ];
    body.extend(
        format!("return {};", PhpExpr::Map(rules).render(0))
            .lines()
            .map(str::to_string),
    );
    class.methods.push(
        Method::public("rules")
            .doc("@return array<string, mixed>")
            .returns("array")
            .body(body),
    );

    class.methods.push(
        Method::public("messages")
            .doc("@return array<string, string>")
            .returns("array")
            .body(
                format!("return {};", PhpExpr::Map(messages).render(0))
                    .lines()
                    .map(str::to_string),
            ),
    );

    let mut file = PhpFile::new(Some(namespace(ctx, "Http\\Requests")), class)
        .uses("Illuminate\\Foundation\\Http\\FormRequest");
    if uses_rule_class {
        file = file.uses("Illuminate\\Validation\\Rule");
    }
    Ok(file.render())
}

fn rule_expr(rule: &Rule) -> Result<PhpExpr, BackendError> {
    Ok(match rule {
        Rule::Required => PhpExpr::raw("$presence"),
        Rule::Nullable | Rule::Email | Rule::Url | Rule::Uuid | Rule::Type { .. } => {
            PhpExpr::str(rule.key())
        }
        Rule::Regex { pattern } => {
            if pattern.is_empty() {
                return Err(BackendError::CodeGenError("empty regex pattern".to_string()));
            }
            PhpExpr::str(format!("regex:/{}/", pattern.replace('/', "\\/")))
        }
        Rule::Unique { table, column } => PhpExpr::raw(format!(
            "Rule::unique({}, {})->ignore($this->route('id'))",
            quote(table),
            quote(column)
        )),
        Rule::In { values } => PhpExpr::raw(format!(
            "Rule::in({})",
            PhpExpr::str_list(values.iter().cloned()).inline()
        )),
        Rule::Exists { table, column } => PhpExpr::str(format!("exists:{},{}", table, column)),
    })
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
        let model = set.model(class).unwrap();
        generate(model, &ValidationPlan::build(model), &EmitContext::new(&config, &catalog)).unwrap()
    }

    #[test]
    fn test_rules_and_messages() {
        let php = render(
            "class User { email: string; code: string [regex=\"^[A-Z]+$\"]; bio: text? }",
            "User",
        );
        assert!(php.contains("class UserRequest extends FormRequest"));
        assert!(php.contains("        $presence = $this->isMethod('POST') ? 'required' : 'sometimes';\n\n"));
        assert!(php.contains("                $presence,\n                'string',\n                Rule::unique('users', 'email')->ignore($this->route('id')),\n                'email',\n"));
        assert!(php.contains("'regex:/^[A-Z]+$/',"));
        assert!(php.contains("'nullable',"));
        assert!(php.contains("'email.required' => 'The email field is required.',"));
        assert!(php.contains("use Illuminate\\Validation\\Rule;"));
    }

    #[test]
    fn test_foreign_key_and_enum_rules() {
        let php = render(
            "class User { name: string }\nclass Post { state: enum(draft,published) }\nUser \"1\" -- \"*\" Post\n",
            "Post",
        );
        assert!(php.contains("Rule::in(['draft', 'published']),"));
        assert!(php.contains("'exists:users,id',"));
    }
}
