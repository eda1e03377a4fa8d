use super::*;

fn event(
    entity_type: EntityType,
    schema: &str,
    table: Option<&str>,
    entity_name: &str,
) -> Option<InvalidationEvent> {
    Some(InvalidationEvent {
        entity_type,
        schema: schema.into(),
        table: table.map(Into::into),
        entity_name: entity_name.into(),
    })
}

#[test]
fn create_table() {
    assert_eq!(
        extract_entity("create table if not exists public.widgets (id int)"),
        event(EntityType::Table, "public", Some("widgets"), "widgets")
    );
}

#[test]
fn non_ddl_is_a_miss() {
    assert_eq!(extract_entity("select 1"), None);
    assert_eq!(extract_entity("insert into widgets values (1)"), None);
    assert_eq!(extract_entity(""), None);
}

#[test]
fn cron_schedule() {
    assert_eq!(
        extract_entity("select cron.schedule('nightly', '0 0 * * *', 'select 1')"),
        event(EntityType::Cron, "public", None, "nightly")
    );
}

#[test]
fn cron_variants() {
    assert_eq!(
        extract_entity("SELECT cron.schedule_in_database('vac', '*/5 * * * *', 'vacuum', 'postgres')"),
        event(EntityType::Cron, "public", None, "vac")
    );
    assert_eq!(
        extract_entity("select cron.unschedule('nightly')"),
        event(EntityType::Cron, "public", None, "nightly")
    );
    assert_eq!(
        extract_entity("select cron.schedule('it''s', '@daily', $$ delete from logs $$)"),
        event(EntityType::Cron, "public", None, "it's")
    );
}

#[test]
fn unnamed_cron_job_is_a_miss() {
    assert_eq!(extract_entity("select cron.schedule('0 0 * * *', 'select 1')"), None);
    assert_eq!(extract_entity("select cron.unschedule(42)"), None);
}

#[test]
fn cron_counts_only_its_own_arguments() {
    // Literals after the call are not arguments to it.
    assert_eq!(
        extract_entity("select cron.schedule('*/5 * * * *', 'select 1'); select 'tail'"),
        None
    );
    assert_eq!(
        extract_entity("select cron.schedule('0 0 * * *', format('select %s', 'x'))"),
        None
    );
    assert_eq!(
        extract_entity("select cron.schedule('job', '@hourly', $body$ select ')' $body$)"),
        event(EntityType::Cron, "public", None, "job")
    );
    assert_eq!(extract_entity("select cron.schedule(name, '@daily', 'select 1')"), None);
}

#[test]
fn scheduler_call_inside_a_function_body() {
    let sql = "create or replace function public.setup_jobs() returns void language sql as \
               $$ select cron.schedule('nightly', '0 0 * * *', 'select 1') $$";
    assert_eq!(
        extract_entity(sql),
        event(EntityType::Function, "public", None, "setup_jobs")
    );
    assert_eq!(
        extract_entity("create view public.jobs as select cron.unschedule('old')"),
        event(EntityType::View, "public", None, "jobs")
    );
}

#[test]
fn schema_defaults_to_public() {
    assert_eq!(
        extract_entity("drop table widgets"),
        event(EntityType::Table, "public", Some("widgets"), "widgets")
    );
}

#[test]
fn quoted_identifiers_are_unquoted() {
    assert_eq!(
        extract_entity(r#"ALTER TABLE "My Schema"."My ""Big"" Table" ADD COLUMN x int"#),
        event(
            EntityType::Table,
            "My Schema",
            Some(r#"My "Big" Table"#),
            r#"My "Big" Table"#
        )
    );
}

#[test]
fn bare_identifiers_fold_to_lower_case() {
    assert_eq!(
        extract_entity("CREATE TABLE Sales.Orders (id int)"),
        event(EntityType::Table, "sales", Some("orders"), "orders")
    );
}

#[test]
fn leading_comments_are_skipped() {
    let sql = "-- add widgets\n/* v2 */\n  create table widgets (id int)";
    assert_eq!(
        extract_entity(sql),
        event(EntityType::Table, "public", Some("widgets"), "widgets")
    );
}

#[test]
fn functions_and_procedures() {
    assert_eq!(
        extract_entity("create or replace function api.add(a int, b int) returns int as $$ select a + b $$ language sql"),
        event(EntityType::Function, "api", None, "add")
    );
    assert_eq!(
        extract_entity("drop procedure if exists cleanup()"),
        event(EntityType::Function, "public", None, "cleanup")
    );
}

#[test]
fn triggers_carry_their_table() {
    assert_eq!(
        extract_entity(
            "create trigger on_signup after insert on auth.users for each row execute function public.handle_signup()"
        ),
        event(EntityType::Trigger, "auth", Some("users"), "on_signup")
    );
    assert_eq!(
        extract_entity("drop trigger if exists on_signup on auth.users"),
        event(EntityType::Trigger, "auth", Some("users"), "on_signup")
    );
}

#[test]
fn policies_carry_their_table() {
    assert_eq!(
        extract_entity(
            r#"create policy "Users read own rows" on public.profiles for select using (auth.uid() = id)"#
        ),
        event(
            EntityType::Policy,
            "public",
            Some("profiles"),
            "Users read own rows"
        )
    );
}

#[test]
fn indexes() {
    assert_eq!(
        extract_entity("create unique index concurrently if not exists users_email_idx on only public.users (email)"),
        event(EntityType::Index, "public", Some("users"), "users_email_idx")
    );
    assert_eq!(
        extract_entity("create index on logs (created_at)"),
        event(EntityType::Index, "public", Some("logs"), "logs")
    );
    assert_eq!(
        extract_entity("drop index if exists api.users_email_idx"),
        event(EntityType::Index, "api", None, "users_email_idx")
    );
}

#[test]
fn views() {
    assert_eq!(
        extract_entity("create or replace view public.active_users as select * from users"),
        event(EntityType::View, "public", None, "active_users")
    );
    assert_eq!(
        extract_entity("refresh materialized view concurrently stats"),
        event(EntityType::View, "public", None, "stats")
    );
}

#[test]
fn schemas() {
    assert_eq!(
        extract_entity("create schema if not exists billing"),
        event(EntityType::Schema, "billing", None, "billing")
    );
}

#[test]
fn disabled_kinds_are_skipped() {
    let extractor = EntityExtractor::new(&EntitiesConfig {
        disabled: vec!["Cron".into(), "table".into()],
    });
    assert!(!extractor.is_enabled(EntityType::Cron));
    assert_eq!(
        extractor.extract("select cron.schedule('nightly', '0 0 * * *', 'select 1')"),
        None
    );
    assert_eq!(extractor.extract("create table widgets (id int)"), None);
    assert_eq!(
        extractor.extract("create schema billing"),
        event(EntityType::Schema, "billing", None, "billing")
    );
}

#[test]
fn garbage_never_panics() {
    for sql in [
        "create",
        "create table",
        "create trigger x",
        "cron.schedule(",
        "\"",
        "create table \"unterminated",
        "🦀 drop table 🦀",
    ] {
        let _ = extract_entity(sql);
    }
}
