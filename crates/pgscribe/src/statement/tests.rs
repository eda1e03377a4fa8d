use super::*;
use pgscribe_schema::{Column, DataType, FilterOp};
use proptest::prelude::*;

fn users() -> TableDescriptor {
    TableDescriptor::new("public", "users")
        .column(Column::new("id", DataType::BigInt).primary_key())
        .column(Column::new("email", DataType::Text).unique().not_null())
        .column(Column::new("name", DataType::Text))
        .column(Column::new(
            "moods",
            DataType::array_of(DataType::enumeration("public", "mood")),
        ))
}

fn tags() -> TableDescriptor {
    TableDescriptor::new("public", "tags")
        .column(Column::new("name", DataType::Text).unique())
        .column(Column::new("uses", DataType::Integer))
}

fn guarded() -> StatementBuilder {
    StatementBuilder::new(&StatementsConfig {
        require_filter_for_mutations: Some(true),
    })
}

// ============================================================================
// SELECT / COUNT
// ============================================================================

#[test]
fn select_everything() {
    let t = users();
    let sql = build(&StatementSpec::select(&t)).unwrap();
    assert_eq!(sql, r#"SELECT * FROM "public"."users";"#);
}

#[test]
fn select_with_filters_sorts_and_range() {
    let t = users();
    let spec = StatementSpec::select_columns(&t, ["id", "name"])
        .filter(Filter::new("name", FilterOp::ILike, "%ann%"))
        .filter(Filter::new("id", FilterOp::In, "1, 2,3"))
        .sort(Sort::desc("id").nulls_last())
        .range(10, 19);
    let sql = build(&spec).unwrap();
    insta::assert_snapshot!(sql, @r#"SELECT "id", "name" FROM "public"."users" WHERE "name" ILIKE '%ann%' AND "id" IN ('1', '2', '3') ORDER BY "id" DESC NULLS LAST LIMIT 10 OFFSET 10;"#);
}

#[test]
fn range_end_before_start_selects_nothing() {
    let t = users();
    let spec = StatementSpec::select(&t).range(5, 2);
    assert_eq!(spec.limit, Some(0));
    assert_eq!(spec.offset, Some(5));
}

#[test]
fn count_with_is_filter() {
    let t = users();
    let spec = StatementSpec::count(&t).filter(Filter::new("email", FilterOp::Is, "not null"));
    let sql = build(&spec).unwrap();
    assert_eq!(
        sql,
        r#"SELECT COUNT(*) FROM "public"."users" WHERE "email" IS NOT NULL;"#
    );
}

#[test]
fn unqualified_when_schema_is_empty() {
    let t = TableDescriptor::new("", "users").column(Column::new("id", DataType::BigInt));
    let sql = build(&StatementSpec::select(&t)).unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users";"#);
}

#[test]
fn filter_values_are_escaped() {
    let t = users();
    let spec = StatementSpec::select(&t).filter(Filter::new(
        "name",
        FilterOp::Eq,
        "x'; drop table users; --",
    ));
    let sql = build(&spec).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "public"."users" WHERE "name" = 'x''; drop table users; --';"#
    );
}

#[test]
fn range_and_array_operators() {
    let t = users();
    for (op, symbol) in [
        (FilterOp::Contains, "@>"),
        (FilterOp::ContainedBy, "<@"),
        (FilterOp::Overlaps, "&&"),
        (FilterOp::RangeLt, "<<"),
        (FilterOp::RangeGt, ">>"),
        (FilterOp::RangeLte, "&<"),
        (FilterOp::RangeGte, "&>"),
        (FilterOp::RangeAdjacent, "-|-"),
    ] {
        let sql = build(&StatementSpec::select(&t).filter(Filter::new("span", op, "[1,5)"))).unwrap();
        assert_eq!(
            sql,
            format!(r#"SELECT * FROM "public"."users" WHERE "span" {symbol} '[1,5)';"#),
            "{op}"
        );
    }
}

#[test]
fn like_patterns_pass_through() {
    let t = users();
    let sql = build(&StatementSpec::select(&t).filter(Filter::new("name", FilterOp::Like, "a%b_c"))).unwrap();
    assert_eq!(sql, r#"SELECT * FROM "public"."users" WHERE "name" LIKE 'a%b_c';"#);

    let err = build(&StatementSpec::select(&t).filter(Filter::new("name", FilterOp::ILike, 3))).unwrap_err();
    assert!(matches!(err, StatementError::InvalidFilter { ref target, .. } if target == "name"));
}

#[test]
fn operator_names_from_callers() {
    fn select_with(op: &str) -> Result<String, StatementError> {
        let t = users();
        build(&StatementSpec::select(&t).filter(Filter::parse("moods", op, "{happy}")?))
    }

    assert_eq!(
        select_with("cs").unwrap(),
        r#"SELECT * FROM "public"."users" WHERE "moods" @> '{happy}';"#
    );
    assert_eq!(
        select_with("nxl").unwrap(),
        r#"SELECT * FROM "public"."users" WHERE "moods" &> '{happy}';"#
    );
    let err = select_with("between").unwrap_err();
    assert!(matches!(err, StatementError::UnknownOperator(_)));
    assert_eq!(err.to_string(), "unknown filter operator `between`");
}

// ============================================================================
// INSERT / UPSERT
// ============================================================================

#[test]
fn multi_row_insert_fills_missing_columns_with_default() {
    let t = users();
    let rows = [
        RowPayload::new().set("email", "a@x").set("name", "A"),
        RowPayload::new().set("email", "b@x"),
    ];
    let sql = build(&StatementSpec::insert(&t, rows)).unwrap();
    insta::assert_snapshot!(sql, @r#"INSERT INTO "public"."users" ("email", "name") VALUES ('a@x', 'A'), ('b@x', DEFAULT);"#);
}

#[test]
fn enum_arrays_are_cast_and_returned_as_text() {
    let t = users();
    let row = RowPayload::new()
        .set("email", "c@x")
        .set("moods", vec!["happy", "sad"])
        .flag_enum_arrays(&t);
    let sql = build(&StatementSpec::insert(&t, [row]).returning()).unwrap();
    insta::assert_snapshot!(sql, @r#"INSERT INTO "public"."users" ("email", "moods") VALUES ('c@x', ARRAY['happy', 'sad']::"public"."mood"[]) RETURNING *, "moods"::text[] AS "moods";"#);
}

#[test]
fn enum_array_flag_on_plain_column_is_rejected() {
    let t = users();
    let row = RowPayload::new().set("name", vec!["a"]).enum_array("name");
    let err = build(&StatementSpec::insert(&t, [row])).unwrap_err();
    assert!(matches!(err, StatementError::InvalidPayload { ref column, .. } if column == "name"));
}

#[test]
fn enum_array_value_must_be_a_list() {
    let t = users();
    let row = RowPayload::new().set("moods", "happy").enum_array("moods");
    let err = build(&StatementSpec::insert(&t, [row])).unwrap_err();
    assert!(matches!(err, StatementError::InvalidPayload { .. }));
}

#[test]
fn empty_insert_is_rejected() {
    let t = users();
    let err = build(&StatementSpec::insert(&t, [])).unwrap_err();
    assert!(matches!(err, StatementError::EmptyPayload { action: "insert" }));
}

#[test]
fn upsert_conflicts_on_primary_key() {
    let t = users();
    let row = RowPayload::new()
        .set("id", 1)
        .set("email", "a@x")
        .set("name", "A");
    let sql = build(&StatementSpec::upsert(&t, [row])).unwrap();
    insta::assert_snapshot!(sql, @r#"INSERT INTO "public"."users" ("id", "email", "name") VALUES (1, 'a@x', 'A') ON CONFLICT ("id") DO UPDATE SET "email" = EXCLUDED."email", "name" = EXCLUDED."name";"#);
}

#[test]
fn upsert_falls_back_to_unique_column() {
    let t = tags();
    let row = RowPayload::new().set("name", "rust").set("uses", 3);
    let sql = build(&StatementSpec::upsert(&t, [row])).unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "public"."tags" ("name", "uses") VALUES ('rust', 3) ON CONFLICT ("name") DO UPDATE SET "uses" = EXCLUDED."uses";"#
    );
}

#[test]
fn upsert_of_key_only_does_nothing_on_conflict() {
    let t = tags();
    let row = RowPayload::new().set("name", "rust");
    let sql = build(&StatementSpec::upsert(&t, [row])).unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "public"."tags" ("name") VALUES ('rust') ON CONFLICT ("name") DO NOTHING;"#
    );
}

#[test]
fn upsert_without_any_key_is_rejected() {
    let t = TableDescriptor::new("public", "logs").column(Column::new("line", DataType::Text));
    let row = RowPayload::new().set("line", "x");
    let err = build(&StatementSpec::upsert(&t, [row])).unwrap_err();
    assert!(matches!(err, StatementError::MissingConflictTarget { .. }));
}

// ============================================================================
// UPDATE / DELETE / TRUNCATE
// ============================================================================

#[test]
fn update_with_filter() {
    let t = users();
    let spec = StatementSpec::update(&t, RowPayload::new().set("name", "it's"))
        .filter(Filter::new("id", FilterOp::Eq, 7));
    let sql = build(&spec).unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "public"."users" SET "name" = 'it''s' WHERE "id" = 7;"#
    );
}

#[test]
fn update_json_value_is_cast() {
    let t = users();
    let row = RowPayload::new().set("name", Value::Json(r#"{"a":1}"#.into()));
    let spec = StatementSpec::update(&t, row).filter(Filter::new("id", FilterOp::Eq, 1));
    let sql = build(&spec).unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "public"."users" SET "name" = '{"a":1}'::jsonb WHERE "id" = 1;"#
    );
}

#[test]
fn empty_update_is_rejected() {
    let t = users();
    let err = build(&StatementSpec::update(&t, RowPayload::new())).unwrap_err();
    assert!(matches!(err, StatementError::EmptyPayload { action: "update" }));
}

#[test]
fn delete_by_row_value() {
    let t = users();
    let spec = StatementSpec::delete(&t)
        .filter(Filter::tuple(
            ["id", "email"],
            FilterOp::In,
            vec![
                Value::Array(vec![1.into(), "a@x".into()]),
                Value::Array(vec![2.into(), "b@x".into()]),
            ],
        ))
        .returning();
    let sql = build(&spec).unwrap();
    insta::assert_snapshot!(sql, @r#"DELETE FROM "public"."users" WHERE ("id", "email") IN ((1, 'a@x'), (2, 'b@x')) RETURNING *, "moods"::text[] AS "moods";"#);
}

#[test]
fn row_value_arity_must_match() {
    let t = users();
    let spec = StatementSpec::delete(&t).filter(Filter::tuple(["id", "email"], FilterOp::Eq, "1"));
    let err = build(&spec).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid filter on (id, email): row value has 1 values but 2 columns"
    );
}

#[test]
fn truncate_options() {
    let t = users();
    let spec = StatementSpec::truncate(&t).truncate_options(true, true);
    let sql = build(&spec).unwrap();
    assert_eq!(sql, r#"TRUNCATE "public"."users" RESTART IDENTITY CASCADE;"#);
}

#[test]
fn guard_rejects_unfiltered_mutations() {
    let t = users();
    let err = guarded().build(&StatementSpec::delete(&t)).unwrap_err();
    assert!(matches!(
        err,
        StatementError::MutationWithoutFilter {
            action: "delete",
            ..
        }
    ));

    let update = StatementSpec::update(&t, RowPayload::new().set("name", "x"));
    assert!(guarded().build(&update).is_err());

    // Reads and filtered writes still go through.
    assert!(guarded().build(&StatementSpec::select(&t)).is_ok());
    let filtered = StatementSpec::delete(&t).filter(Filter::new("id", FilterOp::Eq, 1));
    assert!(guarded().build(&filtered).is_ok());
}

#[test]
fn unguarded_delete_affects_every_row() {
    let t = users();
    let sql = build(&StatementSpec::delete(&t)).unwrap();
    assert_eq!(sql, r#"DELETE FROM "public"."users";"#);
}

#[test]
fn table_without_columns_is_rejected() {
    let t = TableDescriptor::new("public", "ghost");
    let err = build(&StatementSpec::select(&t)).unwrap_err();
    assert!(matches!(err, StatementError::InvalidTable { .. }));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn update_assigns_every_payload_column(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        value in any::<i64>(),
    ) {
        let t = users();
        let row: RowPayload = names.iter().map(|n| (n.as_str(), value)).collect();
        let spec = StatementSpec::update(&t, row).filter(Filter::new("id", FilterOp::Eq, 1));
        let Stmt::Update(stmt) = StatementBuilder::default().build_stmt(&spec).unwrap() else {
            panic!("expected an UPDATE");
        };
        prop_assert_eq!(stmt.assignments.len(), names.len());
    }

    #[test]
    fn text_filters_never_escape_their_literal(s in any::<String>()) {
        let t = users();
        let spec = StatementSpec::select(&t).filter(Filter::new("name", FilterOp::Eq, s.as_str()));
        let sql = build(&spec).unwrap();
        let expected = format!(
            r#"SELECT * FROM "public"."users" WHERE "name" = '{}';"#,
            s.replace('\'', "''")
        );
        prop_assert_eq!(sql, expected);
    }
}
