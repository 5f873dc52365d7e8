use crate::analyze::DeclTable;
use crate::context::GenericContext;

/// Retained declarations as indices into `table`: types, then consts, vars
/// and functions, each in the order they were defined in the source.
pub fn order(ctx: &GenericContext, table: &DeclTable) -> Vec<usize> {
    let mut out: Vec<usize> = (0..table.len())
        .filter(|&idx| ctx.is_retained(table.get(idx).key))
        .collect();
    out.sort_by_key(|&idx| {
        let decl = table.get(idx);
        (decl.kind, decl.key)
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeclKind;
    use go125_parser::parse_file;

    #[test]
    fn kinds_first_then_source_position() {
        let src = "package p
func b() {}
var v1 int
type B int
const K = 1
func a() {}
type A int
var v0 int
";
        let pf = parse_file(src, "t.go").unwrap();
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let mut ctx = GenericContext::new();
        for decl in table.iter() {
            ctx.retain(decl.key, decl.kind);
        }
        let names: Vec<&str> = order(&ctx, &table)
            .into_iter()
            .map(|idx| pf.text(table.get(idx).names[0].sym))
            .collect();
        assert_eq!(names, ["B", "A", "K", "v1", "v0", "b", "a"]);
    }

    #[test]
    fn unretained_declarations_are_left_out() {
        let pf = parse_file("package p\ntype A int\ntype B int\n", "t.go").unwrap();
        let table = DeclTable::collect(&pf.arena, &pf.file);
        let mut ctx = GenericContext::new();
        ctx.retain(table.get(1).key, DeclKind::Type);
        assert_eq!(order(&ctx, &table), [1]);
    }
}
