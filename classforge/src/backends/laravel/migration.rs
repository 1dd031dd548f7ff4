//! Blueprint migration generation

use super::literal;
use super::php::{ClassDecl, ClassKind, Method, PhpFile, quote};
use crate::backends::BackendError;
use crate::plan::{ColumnPlan, ForeignKeyPlan, JoinTablePlan, OnDelete, TablePlan};

fn migration_file(table: &str, up: Vec<String>) -> String {
    let mut body = vec![format!(
        "Schema::create({}, function (Blueprint $table) {{",
        quote(table)
    )];
    body.extend(up.into_iter().map(|line| format!("    {}", line)));
    body.push("});".to_string());

    let mut class = ClassDecl::new(ClassKind::Anonymous, "").extends("Migration");
    class
        .methods
        .push(Method::public("up").returns("void").body(body));
    class.methods.push(
        Method::public("down")
            .returns("void")
            .body([format!("Schema::dropIfExists({});", quote(table))]),
    );

    PhpFile::new(None, class)
        .uses("Illuminate\\Database\\Migrations\\Migration")
        .uses("Illuminate\\Database\\Schema\\Blueprint")
        .uses("Illuminate\\Support\\Facades\\Schema")
        .render()
}

fn column_line(column: &ColumnPlan) -> Result<String, BackendError> {
    let mut line = column.fragment.clone();
    if column.nullable {
        line.push_str("->nullable()");
    }
    if column.unique {
        line.push_str("->unique()");
    }
    if let Some(default) = &column.default {
        line.push_str(&format!("->default({})", literal(column.canonical_type, default)?));
    }
    line.push(';');
    Ok(line)
}

fn foreign_key_line(fk: &ForeignKeyPlan) -> String {
    let mut line = format!("$table->foreignId({})", quote(&fk.column));
    if fk.nullable {
        line.push_str("->nullable()");
    }
    line.push_str(&format!(
        "->constrained({}, {})",
        quote(&fk.references_table),
        quote(&fk.references_column)
    ));
    line.push_str(match fk.on_delete {
        OnDelete::Cascade => "->cascadeOnDelete();",
        OnDelete::SetNull => "->nullOnDelete();",
    });
    line
}

/// Generate the create-table migration of one model
pub fn generate_table(plan: &TablePlan) -> Result<String, BackendError> {
    let mut up = vec!["$table->id();".to_string()];
    for column in &plan.columns {
        up.push(column_line(column)?);
    }
    up.extend(plan.foreign_keys.iter().map(foreign_key_line));
    up.push("$table->timestamps();".to_string());
    Ok(migration_file(&plan.table, up))
}

/// Generate the pivot-table migration of a many-to-many relationship
pub fn generate_join_table(plan: &JoinTablePlan) -> String {
    let up = vec![
        format!(
            "$table->foreignId({})->constrained({})->cascadeOnDelete();",
            quote(&plan.left.column),
            quote(&plan.left.references_table)
        ),
        format!(
            "$table->foreignId({})->constrained({})->cascadeOnDelete();",
            quote(&plan.right.column),
            quote(&plan.right.references_table)
        ),
        format!(
            "$table->primary([{}, {}]);",
            quote(&plan.left.column),
            quote(&plan.right.column)
        ),
    ];
    migration_file(&plan.table, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flavor;
    use crate::diagnostics::Diagnostics;
    use crate::ir::ModelSet;
    use crate::resolve::resolve;
    use crate::source::parse_document;
    use crate::types::TypeCatalog;

    fn models(source: &str) -> (ModelSet, TypeCatalog) {
        let catalog = TypeCatalog::for_flavor(Flavor::Laravel);
        let set = resolve(&parse_document(source), &catalog, &mut Diagnostics::new());
        (set, catalog)
    }

    #[test]
    fn test_table_migration() {
        let (set, catalog) = models(
            "class User { email: string; age: int? [default=18] }\nclass Order { total: decimal }\nUser \"1\" -- \"*\" Order\n",
        );
        let users = generate_table(&TablePlan::build(set.model("User").unwrap(), &catalog)).unwrap();
        assert!(users.contains("return new class extends Migration"));
        assert!(users.contains("Schema::create('users', function (Blueprint $table) {"));
        assert!(users.contains("            $table->id();\n"));
        assert!(users.contains("$table->string('email')->unique();"));
        assert!(users.contains("$table->integer('age')->nullable()->default(18);"));
        assert!(users.contains("Schema::dropIfExists('users');"));

        let orders = generate_table(&TablePlan::build(set.model("Order").unwrap(), &catalog)).unwrap();
        assert!(orders.contains("$table->decimal('total', 10, 2);"));
        assert!(orders.contains(
            "$table->foreignId('user_id')->constrained('users', 'id')->cascadeOnDelete();"
        ));
    }

    #[test]
    fn test_stateful_migration() {
        let (set, catalog) = models("class Account <<stateful(CLOSED)>> { owner: string }");
        let php = generate_table(&TablePlan::build(set.model("Account").unwrap(), &catalog)).unwrap();
        assert!(php.contains(
            "$table->enum('status', ['ACTIVE', 'SUSPENDED', 'CLOSED'])->default('ACTIVE');"
        ));
    }

    #[test]
    fn test_self_reference_migration() {
        let (set, catalog) = models("class Category { name: string }\nCategory \"1\" -- \"*\" Category\n");
        let php = generate_table(&TablePlan::build(set.model("Category").unwrap(), &catalog)).unwrap();
        assert!(php.contains(
            "$table->foreignId('parent_category_id')->nullable()->constrained('categories', 'id')->nullOnDelete();"
        ));
    }

    #[test]
    fn test_pivot_migration() {
        let (set, _) = models("class Post { title: string }\nclass Tag { name: string }\nPost \"*\" -- \"*\" Tag\n");
        let plan = JoinTablePlan::from_relationship(set.join_relationships().next().unwrap()).unwrap();
        let php = generate_join_table(&plan);
        assert!(php.contains("Schema::create('post_tag', function (Blueprint $table) {"));
        assert!(php.contains("$table->foreignId('post_id')->constrained('posts')->cascadeOnDelete();"));
        assert!(php.contains("$table->foreignId('tag_id')->constrained('tags')->cascadeOnDelete();"));
        assert!(php.contains("$table->primary(['post_id', 'tag_id']);"));
    }
}
