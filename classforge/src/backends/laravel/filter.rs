//! Query filter generation

use super::php::{ClassDecl, ClassKind, Method, Param, PhpExpr, PhpFile, Property, Visibility};
use super::namespace;
use crate::backends::EmitContext;
use crate::plan::FilterPlan;

/// Eloquent builder call for each operator, in rendering order
const OPERATOR_CALLS: &[(&str, &str)] = &[
    ("eq", "$query->where($field, $value)"),
    ("ne", "$query->where($field, '!=', $value)"),
    ("gt", "$query->where($field, '>', $value)"),
    ("gte", "$query->where($field, '>=', $value)"),
    ("lt", "$query->where($field, '<', $value)"),
    ("lte", "$query->where($field, '<=', $value)"),
    ("before", "$query->where($field, '<', $value)"),
    ("after", "$query->where($field, '>', $value)"),
    ("between", "$query->whereBetween($field, (array) $value)"),
    ("in", "$query->whereIn($field, (array) $value)"),
    ("contains", "$query->where($field, 'like', '%' . $value . '%')"),
    ("starts_with", "$query->where($field, 'like', $value . '%')"),
    ("ends_with", "$query->where($field, 'like', '%' . $value)"),
];

/// Generate the query filter class
///
/// Filters arrive as `field[operator]=value`; unknown fields and operators a
/// field does not support are ignored.
pub fn generate(plan: &FilterPlan, ctx: &EmitContext<'_>) -> String {
    let operators = PhpExpr::Map(
        plan.fields
            .iter()
            .map(|f| {
                (
                    f.field.clone(),
                    PhpExpr::str_list(f.operators.iter().copied()),
                )
            })
            .collect(),
    );

    let mut class = ClassDecl::new(ClassKind::Class, &format!("{}Filter", plan.class_name));
    class.properties.push(Property {
        visibility: Visibility::Protected,
        ty: Some("array".to_string()),
        name: "operators".to_string(),
        value: Some(operators),
    });
    class.methods.push(
        Method::public("__construct")
            .param(Param::promoted(Visibility::Private, "array", "filters").with_default("[]")),
    );
    class.methods.push(
        Method::public("apply")
            .param(Param::new("Builder", "query"))
            .returns("Builder")
            .body([
                "foreach ($this->filters as $field => $conditions) {",
                "    if (! array_key_exists($field, $this->operators)) {",
                "        continue;",
                "    }",
                "",
                "    foreach ((array) $conditions as $operator => $value) {",
                "        if (in_array($operator, $this->operators[$field], true)) {",
                "            $this->applyOperator($query, $field, $operator, $value);",
                "        }",
                "    }",
                "}",
                "",
                "return $query;",
            ]),
    );

    let used: Vec<&(&str, &str)> = OPERATOR_CALLS
        .iter()
        .filter(|(op, _)| plan.fields.iter().any(|f| f.operators.contains(op)))
        .collect();
    let mut body = vec!["match ($operator) {".to_string()];
    for (op, call) in used {
        body.push(format!("    '{}' => {},", op, call));
    }
    body.push("    default => null,".to_string());
    body.push("};".to_string());

    let mut apply_operator = Method::public("applyOperator")
        .param(Param::new("Builder", "query"))
        .param(Param::new("string", "field"))
        .param(Param::new("string", "operator"))
        .param(Param::new("mixed", "value"))
        .returns("void")
        .body(body);
    apply_operator.visibility = Visibility::Protected;
    class.methods.push(apply_operator);

    PhpFile::new(Some(namespace(ctx, "Filters")), class)
        .uses("Illuminate\\Database\\Eloquent\\Builder")
        .render()
}
