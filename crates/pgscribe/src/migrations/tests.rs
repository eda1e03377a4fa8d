use super::*;
use chrono::TimeZone;
use regex::Regex;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 5).unwrap()
}

/// Replace random dollar-quote tags with stable ones.
fn normalize(sql: &str) -> String {
    let tags = Regex::new(r"\$(pgs|guard)_[0-9a-f]{12}\$").unwrap();
    tags.replace_all(sql, "$$$1$$").into_owned()
}

#[test]
fn version_is_a_timestamp() {
    assert_eq!(version_for(now()), "20261019123005");
}

#[test]
fn bootstrap_is_additive() {
    let tracker = MigrationTracker::new(&MigrationsConfig {
        schema: Some("audit".into()),
        table: Some("history".into()),
        created_by: None,
    });
    insta::assert_snapshot!(tracker.bootstrap_sql(), @r#"
    create schema if not exists "audit";
    create table if not exists "audit"."history" (version text not null primary key);
    alter table "audit"."history" add column if not exists statements text[];
    alter table "audit"."history" add column if not exists name text;
    alter table "audit"."history" add column if not exists created_by text;
    alter table "audit"."history" add column if not exists idempotency_key text unique;
    "#);
}

#[test]
fn record_new_version() {
    let request = MigrationRequest::new("create table t (id int);")
        .name("Add t")
        .idempotency_key("k1");
    let sql = MigrationTracker::default().record_sql(&request, now());
    insta::assert_snapshot!(normalize(&sql), @r#"
    do $guard$
    begin
      if to_regclass('"supabase_migrations"."schema_migrations"') is not null then
        if not exists (SELECT 1 FROM "supabase_migrations"."schema_migrations" WHERE "idempotency_key" = 'k1') then
          INSERT INTO "supabase_migrations"."schema_migrations" ("version", "name", "statements", "created_by", "idempotency_key") VALUES ('20261019123005', $pgs$Add t$pgs$, ARRAY[$pgs$create table t (id int);$pgs$]::text[], NULL, 'k1') ON CONFLICT ("version") DO UPDATE SET "name" = coalesce("supabase_migrations"."schema_migrations"."name", EXCLUDED."name"), "statements" = array_cat(coalesce("supabase_migrations"."schema_migrations"."statements", '{}'), EXCLUDED."statements"), "idempotency_key" = coalesce("supabase_migrations"."schema_migrations"."idempotency_key", EXCLUDED."idempotency_key");
        end if;
      end if;
    end
    $guard$;
    "#);
}

#[test]
fn record_append_raises_for_missing_version() {
    let request = MigrationRequest::new("alter table t add column x int").append_to("20260101000000");
    let sql = MigrationTracker::default().record_sql(&request, now());
    insta::assert_snapshot!(normalize(&sql), @r#"
    do $guard$
    begin
      if to_regclass('"supabase_migrations"."schema_migrations"') is not null then
        UPDATE "supabase_migrations"."schema_migrations" SET "statements" = array_append(coalesce("statements", '{}'), $pgs$alter table t add column x int$pgs$) WHERE "version" = '20260101000000';
        if not found then
          raise exception 'migration version % does not exist', '20260101000000';
        end if;
      end if;
    end
    $guard$;
    "#);
}

#[test]
fn created_by_comes_from_config() {
    let tracker = MigrationTracker::new(&MigrationsConfig {
        created_by: Some("studio".into()),
        ..Default::default()
    });
    let sql = tracker.record_sql(&MigrationRequest::new("select 1"), now());
    assert!(sql.contains("'studio', NULL) ON CONFLICT"));
}

#[test]
fn same_second_versions_merge() {
    let tracker = MigrationTracker::default();
    let first = tracker.record_sql(&MigrationRequest::new("create table a (id int)"), now());
    let second = tracker.record_sql(&MigrationRequest::new("create table b (id int)"), now());
    for sql in [&first, &second] {
        assert!(sql.contains("VALUES ('20261019123005'"));
        assert!(sql.contains(r#"ON CONFLICT ("version") DO UPDATE SET"#));
        assert!(sql.contains(r#"array_cat(coalesce("supabase_migrations"."schema_migrations"."statements", '{}'), EXCLUDED."statements")"#));
    }
    // Without a key there is nothing to look up first.
    assert!(!first.contains("if not exists"));
}

#[test]
fn hostile_statement_text_is_embedded_verbatim() {
    let body = "create function f() returns text as $$ select 'it''s'; $$ language sql; -- done";
    let sql = MigrationTracker::default().record_sql(&MigrationRequest::new(body), now());
    // The body sits between two identical tags.
    let re = Regex::new(r"ARRAY\[\$(pgs_[0-9a-f]{12})\$").unwrap();
    let tag = &re.captures(&sql).unwrap()[1];
    let open = format!("${tag}$");
    assert!(sql.contains(&format!("{open}{body}{open}")));
}

#[test]
fn render_apply_is_one_transaction() {
    let request = MigrationRequest::new("create table t (id int)");
    let sql = MigrationTracker::default().render_apply(&request, now());
    assert!(sql.starts_with("begin;\ncreate schema if not exists \"supabase_migrations\";"));
    assert!(sql.contains("\ncreate table t (id int);\ndo $guard_"));
    assert!(sql.ends_with("$;\ncommit;"));
    assert_eq!(sql.matches("commit;").count(), 1);
}

#[test]
fn idempotency_keys_are_stable() {
    let a = idempotency_key_for("create table t (id int)");
    let b = idempotency_key_for("create table t (id int)");
    let c = idempotency_key_for("create table u (id int)");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
}

#[test]
fn export_named_migration() {
    let record = MigrationRecord {
        version: "20261019123005".into(),
        name: Some("Add widgets & gadgets".into()),
        statements: vec![
            "create table widgets (id int)".into(),
            "create table gadgets (id int);\n".into(),
        ],
        created_by: None,
        idempotency_key: None,
    };
    let file = record.to_migration_file();
    assert_eq!(file.file_name, "20261019123005_add_widgets_gadgets.sql");
    assert_eq!(
        file.contents,
        "create table widgets (id int);\n\ncreate table gadgets (id int);\n"
    );
}

#[test]
fn export_unnamed_migration() {
    let record = MigrationRecord {
        version: "20261019123005".into(),
        name: None,
        statements: vec![],
        created_by: None,
        idempotency_key: None,
    };
    assert_eq!(record.to_migration_file().file_name, "20261019123005.sql");
}
