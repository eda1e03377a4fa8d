use crate::*;

fn users() -> QualifiedTable {
    QualifiedTable::qualified("public".into(), "users".into())
}

#[test]
fn test_select_pretty() {
    let stmt = SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::column("id".into())),
            SelectColumn::aliased(Expr::column("first_name".into()), "name".into()),
        ])
        .from(FromClause::table(users()))
        .where_(Expr::column("id".into()).eq(Expr::int(1)))
        .order_by(OrderBy::asc(Expr::column("name".into())).nulls(NullsOrder::Last))
        .limit(10)
        .offset(20);

    insta::assert_snapshot!(render(&stmt), @r#"
    SELECT "id", "first_name" AS "name"
    FROM "public"."users"
    WHERE "id" = 1
    ORDER BY "name" ASC NULLS LAST
    LIMIT 10
    OFFSET 20
    "#);
}

#[test]
fn test_select_compact_star() {
    let stmt = SelectStmt::new().from(FromClause::table(users()));
    assert_eq!(render_compact(&stmt), r#"SELECT * FROM "public"."users""#);
}

#[test]
fn test_order_by_nulls_first_desc() {
    let stmt = SelectStmt::new()
        .from(FromClause::table(QualifiedTable::new("users".into())))
        .order_by(OrderBy::desc(Expr::column("score".into())).nulls(NullsOrder::First));
    assert_eq!(
        render_compact(&stmt),
        r#"SELECT * FROM "users" ORDER BY "score" DESC NULLS FIRST"#
    );
}

#[test]
fn test_count_star() {
    let stmt = SelectStmt::new()
        .column(SelectColumn::expr(Expr::CountStar))
        .from(FromClause::table(users()));
    assert_eq!(
        render_compact(&stmt),
        r#"SELECT COUNT(*) FROM "public"."users""#
    );
}

#[test]
fn test_insert_multi_row_with_default() {
    let stmt = InsertStmt::new(users())
        .columns([ColumnName::from("id"), ColumnName::from("name")])
        .row(vec![Expr::int(1), Expr::string("O'Brien")])
        .row(vec![Expr::int(2), Expr::Default])
        .returning([SelectColumn::Star]);

    insta::assert_snapshot!(render(&stmt), @r#"
    INSERT INTO "public"."users" ("id", "name")
    VALUES (1, 'O''Brien'), (2, DEFAULT)
    RETURNING *
    "#);
}

#[test]
fn test_upsert_do_update() {
    let stmt = InsertStmt::new(users())
        .columns([ColumnName::from("id"), ColumnName::from("name")])
        .row(vec![Expr::int(1), Expr::string("Ann")])
        .on_conflict(OnConflict {
            columns: vec!["id".into()],
            action: ConflictAction::DoUpdate(vec![UpdateAssignment::new(
                "name".into(),
                Expr::Excluded("name".into()),
            )]),
        });

    insta::assert_snapshot!(render(&stmt), @r#"
    INSERT INTO "public"."users" ("id", "name")
    VALUES (1, 'Ann')
    ON CONFLICT ("id") DO UPDATE SET "name" = EXCLUDED."name"
    "#);
}

#[test]
fn test_upsert_do_nothing() {
    let stmt = InsertStmt::new(users())
        .columns([ColumnName::from("id")])
        .row(vec![Expr::int(1)])
        .on_conflict(OnConflict {
            columns: vec!["id".into()],
            action: ConflictAction::DoNothing,
        });
    assert_eq!(
        render_compact(&stmt),
        r#"INSERT INTO "public"."users" ("id") VALUES (1) ON CONFLICT ("id") DO NOTHING"#
    );
}

#[test]
fn test_update_with_enum_array() {
    let stmt = UpdateStmt::new(users())
        .set(
            "moods".into(),
            Expr::Array {
                items: vec![Expr::string("happy"), Expr::string("sad")],
                element_type: Some(quote_qualified("public", "mood")),
            },
        )
        .where_(Expr::column("id".into()).eq(Expr::int(1)))
        .returning([SelectColumn::Star]);

    assert_eq!(
        render_compact(&stmt),
        r#"UPDATE "public"."users" SET "moods" = ARRAY['happy', 'sad']::"public"."mood"[] WHERE "id" = 1 RETURNING *"#
    );
}

#[test]
fn test_delete_without_where() {
    let stmt = DeleteStmt::new(users());
    assert_eq!(render_compact(&stmt), r#"DELETE FROM "public"."users""#);
}

#[test]
fn test_truncate_options() {
    let stmt = TruncateStmt::new(users()).restart_identity(true).cascade(true);
    assert_eq!(
        render_compact(&stmt),
        r#"TRUNCATE "public"."users" RESTART IDENTITY CASCADE"#
    );
}

#[test]
fn test_expr_variants() {
    let expr = Expr::column("a".into())
        .in_list(vec![Expr::int(1), Expr::int(2)])
        .and(Expr::column("b".into()).is(IsTest::NotNull))
        .and(Expr::column("c".into()).or(Expr::column("d".into())))
        .and(
            Expr::Row(vec![Expr::column("x".into()), Expr::column("y".into())])
                .eq(Expr::Row(vec![Expr::int(1), Expr::int(2)])),
        )
        .and(Expr::column("r".into()).binop(BinOp::Adjacent, Expr::string("[1,5)")));

    let stmt = SelectStmt::new().where_(expr);
    insta::assert_snapshot!(render_compact(&stmt), @r#"SELECT * WHERE "a" IN (1, 2) AND "b" IS NOT NULL AND ("c" OR "d") AND ("x", "y") = (1, 2) AND "r" -|- '[1,5)'"#);
}

#[test]
fn test_empty_untyped_array() {
    let stmt = UpdateStmt::new(users()).set(
        "tags".into(),
        Expr::Array {
            items: vec![],
            element_type: None,
        },
    );
    assert_eq!(
        render_compact(&stmt),
        r#"UPDATE "public"."users" SET "tags" = '{}'"#
    );
}

#[test]
fn test_non_finite_float() {
    let stmt = SelectStmt::new().column(SelectColumn::expr(Expr::Float(f64::NAN)));
    assert_eq!(render_compact(&stmt), "SELECT 'NaN'::float8");
}
